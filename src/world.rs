use log::debug;

use crate::arena::Arena;
use crate::collision::{
    BroadPhase, BruteForce, Bvh, CollisionGraph, Contact, ContactFilter, ContactGraph,
    ContactGraphConfig, ContactSolver, DefaultContactFilter, NarrowPhase, NullSolver, StepReport,
};
use crate::dynamics::{Entity, EntityDesc, EntityHandle, EntityId, EntityKind};
use crate::error::{SimError, SimResult};
use crate::geometry::Ray;
use crate::math::{Transform, Vec3};

/// Which broad phase a world starts with
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BroadPhaseKind {
    /// Dynamic AABB tree with leaves fattened by `margin`
    Bvh { margin: f32 },
    /// Exhaustive pair test
    BruteForce,
}

impl Default for BroadPhaseKind {
    fn default() -> Self {
        BroadPhaseKind::Bvh {
            margin: Bvh::DEFAULT_MARGIN,
        }
    }
}

impl BroadPhaseKind {
    fn build(self) -> Box<dyn BroadPhase> {
        match self {
            BroadPhaseKind::Bvh { margin } => Box::new(Bvh::with_margin(margin)),
            BroadPhaseKind::BruteForce => Box::new(BruteForce::new()),
        }
    }
}

/// Configuration for the physics world
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Contact edge lifetime and refresh rule
    pub contact: ContactGraphConfig,
    pub broad_phase: BroadPhaseKind,
}

/// Owns every entity and the collision pipeline that runs over them
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    pub(crate) entities: Arena<Entity>,
    next_id: u64,
    pub(crate) broad_phase: Box<dyn BroadPhase>,
    pub(crate) filter: Box<dyn ContactFilter>,
    pub(crate) narrow_phase: NarrowPhase,
    pub(crate) contacts: ContactGraph,
    pub(crate) solver: Box<dyn ContactSolver>,
    /// Current simulation time
    time: f32,
    tick: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            entities: Arena::new(),
            next_id: 1,
            broad_phase: config.broad_phase.build(),
            filter: Box::new(DefaultContactFilter),
            narrow_phase: NarrowPhase::new(),
            contacts: ContactGraph::new(config.contact),
            solver: Box::new(NullSolver),
            config,
            time: 0.0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Builds an entity from `desc`, assigns it the next id and starts
    /// tracking it in the broad phase.
    pub fn create_entity(&mut self, desc: EntityDesc) -> SimResult<EntityHandle> {
        let id = EntityId(self.next_id);
        let entity = Entity::from_desc(id, desc)?;
        self.next_id += 1;

        let aabb = entity.world_aabb();
        let kind = kind_name(entity.kind());
        let handle = self.entities.insert(entity);
        self.broad_phase.add(handle, aabb);

        debug!("created {} entity {} at {:?}", kind, id, handle);
        Ok(handle)
    }

    /// Removes an entity together with its contact edges and drops it
    pub fn destroy_entity(&mut self, handle: EntityHandle) -> SimResult<()> {
        let entity = self
            .entities
            .remove(handle)
            .ok_or(SimError::EntityNotFound)?;
        self.broad_phase.remove(handle);
        let edges = self.contacts.remove_entity(handle);

        debug!("destroyed entity {} and {} contact edges", entity.id(), edges);
        Ok(())
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle)
    }

    /// Mutable access to an entity. Moves made through
    /// [`Entity::set_transform`] reach the broad phase on the next step.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities.get_mut(handle)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn entity_checked(&mut self, handle: EntityHandle) -> SimResult<&mut Entity> {
        self.entities
            .get_mut(handle)
            .ok_or(SimError::EntityNotFound)
    }

    /// Moves an entity and updates its broad-phase box
    pub fn set_transform(&mut self, handle: EntityHandle, transform: Transform) -> SimResult<()> {
        let entity = self.entity_checked(handle)?;
        entity.set_transform(transform);
        let aabb = entity.world_aabb();
        self.broad_phase.update(handle, aabb);
        Ok(())
    }

    pub fn set_position(&mut self, handle: EntityHandle, position: Vec3) -> SimResult<()> {
        let rotation = self.entity_checked(handle)?.transform().rotation;
        self.set_transform(handle, Transform::new(position, rotation))
    }

    /// Makes `mass` authoritative; density follows from the shape volume
    pub fn set_mass(&mut self, handle: EntityHandle, mass: f32) -> SimResult<()> {
        self.entity_checked(handle)?.set_mass(mass)
    }

    /// Makes `density` authoritative; mass follows from the shape volume
    pub fn set_density(&mut self, handle: EntityHandle, density: f32) -> SimResult<()> {
        self.entity_checked(handle)?.set_density(density)
    }

    /// Fails with [`SimError::NotSolid`] unless the entity is a rigid body
    pub fn set_velocity(
        &mut self,
        handle: EntityHandle,
        linear: Vec3,
        angular: Vec3,
    ) -> SimResult<()> {
        let entity = self.entity_checked(handle)?;
        let id = entity.id();
        let body = entity.rigid_body_mut().ok_or(SimError::NotSolid(id))?;
        body.linear_velocity = linear;
        body.angular_velocity = angular;
        Ok(())
    }

    /// Contact between two live entities at their current placement
    pub fn intersect(&self, a: EntityHandle, b: EntityHandle) -> Option<Contact> {
        let (entity_a, entity_b) = (self.entities.get(a)?, self.entities.get(b)?);
        self.narrow_phase.intersect_entities(entity_a, entity_b)
    }

    /// Whether entity `a` strictly encloses entity `b`
    pub fn contains(&self, a: EntityHandle, b: EntityHandle) -> bool {
        match (self.entities.get(a), self.entities.get(b)) {
            (Some(entity_a), Some(entity_b)) => self.narrow_phase.contains_entity(entity_a, entity_b),
            _ => false,
        }
    }

    /// Runs one collision tick. Non-positive or non-finite `dt` is ignored.
    pub fn step(&mut self, dt: f32) -> StepReport {
        if !dt.is_finite() || dt <= 0.0 {
            return StepReport::default();
        }

        let report = CollisionGraph::new(self).advance(dt);
        self.time += dt;
        self.tick += 1;
        report
    }

    /// Current simulation time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of completed steps
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn contacts(&self) -> &ContactGraph {
        &self.contacts
    }

    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad_phase.as_ref()
    }

    /// Swaps the broad phase and re-registers every entity with it
    pub fn set_broad_phase(&mut self, mut broad_phase: Box<dyn BroadPhase>) {
        broad_phase.clear();
        for (handle, entity) in self.entities.iter() {
            broad_phase.add(handle, entity.world_aabb());
        }
        self.broad_phase = broad_phase;
    }

    pub fn set_contact_filter(&mut self, filter: Box<dyn ContactFilter>) {
        self.filter = filter;
    }

    pub fn set_solver(&mut self, solver: Box<dyn ContactSolver>) {
        self.solver = solver;
    }

    pub fn narrow_phase(&self) -> &NarrowPhase {
        &self.narrow_phase
    }

    /// Register custom pairwise handlers here
    pub fn narrow_phase_mut(&mut self) -> &mut NarrowPhase {
        &mut self.narrow_phase
    }

    /// Nearest entity hit by `ray` within `max_distance`
    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> Option<RayCastHit> {
        let candidates = self.broad_phase.query_ray(ray, max_distance);

        let mut closest: Option<RayCastHit> = None;
        for handle in candidates {
            let Some(entity) = self.entities.get(handle) else {
                continue;
            };
            let Some(hit) = entity.ray_intersect(ray) else {
                continue;
            };
            if hit.distance > max_distance {
                continue;
            }
            if closest.map_or(true, |best| hit.distance < best.distance) {
                closest = Some(RayCastHit {
                    entity: handle,
                    point: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                });
            }
        }

        closest
    }
}

fn kind_name(kind: &EntityKind) -> &'static str {
    match kind {
        EntityKind::Static => "static",
        EntityKind::Solid(_) => "solid",
        EntityKind::RigidBody(_) => "rigid body",
    }
}

/// Result of a ray cast query
#[derive(Debug, Clone, Copy)]
pub struct RayCastHit {
    /// Entity that was hit
    pub entity: EntityHandle,
    /// World space hit point
    pub point: Vec3,
    /// Surface normal at hit point, facing the ray
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}
