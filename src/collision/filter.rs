use std::fmt;

use crate::dynamics::Entity;

/// Decides whether a candidate pair proceeds to the narrow phase
pub trait ContactFilter: fmt::Debug {
    fn filter(&self, a: &Entity, b: &Entity) -> bool;
}

/// Rejects pairs of static entities; nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContactFilter;

impl ContactFilter for DefaultContactFilter {
    fn filter(&self, a: &Entity, b: &Entity) -> bool {
        !(a.is_static() && b.is_static())
    }
}

/// Default rule plus [`CollisionLayers`](crate::dynamics::CollisionLayers)
/// membership and mask tests
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerFilter;

impl ContactFilter for LayerFilter {
    fn filter(&self, a: &Entity, b: &Entity) -> bool {
        DefaultContactFilter.filter(a, b) && a.layers().interacts_with(b.layers())
    }
}
