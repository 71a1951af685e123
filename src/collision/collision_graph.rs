use log::{debug, trace};

use crate::world::World;

/// Counters for one tick of the collision pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Pairs reported by the broad phase
    pub candidates: usize,
    /// Candidates rejected by the contact filter
    pub filtered: usize,
    /// Pairs the narrow phase found in contact
    pub confirmed: usize,
    /// Confirmed pairs that had no edge yet
    pub created: usize,
    /// Edges that expired this tick
    pub evicted: usize,
}

/// Runs one tick of collision detection over a world.
///
/// Order within a tick: refresh bounds, broad phase, filter, narrow phase,
/// record contacts, age the contact graph, run the solver.
#[derive(Debug)]
pub struct CollisionGraph<'w> {
    world: &'w mut World,
}

impl<'w> CollisionGraph<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    pub fn advance(&mut self, dt: f32) -> StepReport {
        let World {
            entities,
            broad_phase,
            filter,
            narrow_phase,
            contacts,
            solver,
            ..
        } = &mut *self.world;

        for (handle, entity) in entities.iter_mut() {
            entity.refresh_bounds();
            broad_phase.update(handle, entity.world_aabb());
        }

        let candidates = broad_phase.step(dt);
        let mut report = StepReport {
            candidates: candidates.len(),
            ..StepReport::default()
        };

        for (a, b) in candidates {
            let (Some(entity_a), Some(entity_b)) = (entities.get(a), entities.get(b)) else {
                continue;
            };
            if !filter.filter(entity_a, entity_b) {
                report.filtered += 1;
                continue;
            }
            let Some(contact) = narrow_phase.intersect_entities(entity_a, entity_b) else {
                continue;
            };

            trace!(
                "{} / {} in contact, depth {}",
                entity_a.id(),
                entity_b.id(),
                contact.depth
            );
            report.confirmed += 1;
            if contacts.check(a, b, contact) {
                report.created += 1;
            }
        }

        report.evicted = contacts.advance().len();
        contacts.solve(&mut **solver, entities, dt);

        debug!(
            "collision step: {} candidates, {} filtered, {} confirmed, {} new, {} evicted",
            report.candidates, report.filtered, report.confirmed, report.created, report.evicted
        );
        report
    }
}
