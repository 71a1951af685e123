use std::fmt;

use crate::arena::Arena;
use crate::dynamics::{Entity, EntityHandle};

use super::contact_graph::ContactGraph;

/// Mutable view of a world's entities.
///
/// Entities can be read and changed in place but not added or removed, so
/// the broad phase and the contact graph keep tracking the same set.
#[derive(Debug)]
pub struct Entities<'a> {
    arena: &'a mut Arena<Entity>,
}

impl<'a> Entities<'a> {
    pub(crate) fn new(arena: &'a mut Arena<Entity>) -> Self {
        Self { arena }
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.arena.get(handle)
    }

    /// Moves made through [`Entity::set_transform`] reach the broad phase on
    /// the next step
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.arena.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.arena.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut Entity)> {
        self.arena.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Hook run once per tick, after the contact graph has aged its edges.
///
/// Implementations read the surviving edges and may change entity state
/// (velocities, transforms). Edges whose contact is `None` were not
/// confirmed this tick but have not expired yet.
pub trait ContactSolver: fmt::Debug {
    fn solve(&mut self, contacts: &ContactGraph, entities: &mut Entities<'_>, dt: f32);
}

/// Leaves every entity untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSolver;

impl ContactSolver for NullSolver {
    fn solve(&mut self, _contacts: &ContactGraph, _entities: &mut Entities<'_>, _dt: f32) {}
}
