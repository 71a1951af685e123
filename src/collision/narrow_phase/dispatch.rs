use std::collections::HashMap;

use log::trace;

use crate::collision::contact::Contact;
use crate::dynamics::Entity;
use crate::geometry::{Shape, ShapeKind};
use crate::math::Transform;

use super::analytic;

/// Pairwise intersection handler. The contact normal points from the first
/// shape towards the second.
pub type IntersectFn = fn(&Shape, &Transform, &Shape, &Transform) -> Option<Contact>;

/// Returns true when the first shape strictly encloses the second
pub type ContainsFn = fn(&Shape, &Transform, &Shape, &Transform) -> bool;

#[derive(Debug, Clone, Copy)]
struct IntersectEntry {
    handler: IntersectFn,
    /// Registered for the opposite order; arguments and normal are flipped
    swapped: bool,
}

const BOUNDED: [ShapeKind; 3] = [ShapeKind::Sphere, ShapeKind::PlaneShape, ShapeKind::Polytope];

/// Double-dispatch table for pairwise shape queries, keyed by the kinds of
/// both shapes.
#[derive(Debug, Clone)]
pub struct NarrowPhase {
    intersect: HashMap<(ShapeKind, ShapeKind), IntersectEntry>,
    contains: HashMap<(ShapeKind, ShapeKind), ContainsFn>,
}

impl Default for NarrowPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrowPhase {
    /// Table with the default handlers for every supported pair
    pub fn new() -> Self {
        let mut narrow_phase = Self::empty();

        for (i, &a) in BOUNDED.iter().enumerate() {
            for &b in &BOUNDED[i..] {
                narrow_phase.register_intersect(a, b, analytic::convex_convex);
            }
        }
        narrow_phase.register_intersect(ShapeKind::Sphere, ShapeKind::Sphere, analytic::sphere_sphere);
        narrow_phase.register_intersect(
            ShapeKind::Sphere,
            ShapeKind::PlaneShape,
            analytic::sphere_plane_shape,
        );
        for b in BOUNDED {
            narrow_phase.register_intersect(ShapeKind::Plane, b, analytic::plane_vertices);
        }

        for a in [
            ShapeKind::Sphere,
            ShapeKind::Plane,
            ShapeKind::PlaneShape,
            ShapeKind::Polytope,
        ] {
            for b in BOUNDED {
                narrow_phase.register_contains(a, b, analytic::contains_vertices);
            }
        }
        narrow_phase.register_contains(
            ShapeKind::Sphere,
            ShapeKind::Sphere,
            analytic::contains_sphere_sphere,
        );

        narrow_phase
    }

    /// Table with no handlers
    pub fn empty() -> Self {
        Self {
            intersect: HashMap::new(),
            contains: HashMap::new(),
        }
    }

    /// Registers `handler` for `(a, b)` and, unless explicitly registered
    /// already, its mirror for `(b, a)`.
    pub fn register_intersect(&mut self, a: ShapeKind, b: ShapeKind, handler: IntersectFn) {
        self.intersect.insert(
            (a, b),
            IntersectEntry {
                handler,
                swapped: false,
            },
        );
        if a == b {
            return;
        }

        let mirror_is_explicit = self
            .intersect
            .get(&(b, a))
            .is_some_and(|entry| !entry.swapped);
        if !mirror_is_explicit {
            self.intersect.insert(
                (b, a),
                IntersectEntry {
                    handler,
                    swapped: true,
                },
            );
        }
    }

    /// Registers a containment test for "`a` encloses `b`". Not mirrored.
    pub fn register_contains(&mut self, a: ShapeKind, b: ShapeKind, handler: ContainsFn) {
        self.contains.insert((a, b), handler);
    }

    pub fn has_intersect(&self, a: ShapeKind, b: ShapeKind) -> bool {
        self.intersect.contains_key(&(a, b))
    }

    /// Contact between two placed shapes, `None` when apart or unsupported
    pub fn intersect(
        &self,
        a: &Shape,
        ta: &Transform,
        b: &Shape,
        tb: &Transform,
    ) -> Option<Contact> {
        let Some(entry) = self.intersect.get(&(a.kind(), b.kind())) else {
            trace!("no intersect handler for {:?} / {:?}", a.kind(), b.kind());
            return None;
        };

        if entry.swapped {
            (entry.handler)(b, tb, a, ta).map(Contact::flipped)
        } else {
            (entry.handler)(a, ta, b, tb)
        }
    }

    /// Whether `a` strictly encloses `b`; false when unsupported
    pub fn contains(&self, a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> bool {
        match self.contains.get(&(a.kind(), b.kind())) {
            Some(handler) => handler(a, ta, b, tb),
            None => {
                trace!("no contains handler for {:?} / {:?}", a.kind(), b.kind());
                false
            }
        }
    }

    /// [`NarrowPhase::intersect`] on two entities at their current placement
    pub fn intersect_entities(&self, a: &Entity, b: &Entity) -> Option<Contact> {
        self.intersect(a.shape(), a.transform(), b.shape(), b.transform())
    }

    pub fn contains_entity(&self, a: &Entity, b: &Entity) -> bool {
        self.contains(a.shape(), a.transform(), b.shape(), b.transform())
    }
}
