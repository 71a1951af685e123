//! Candidate pair generation.
//!
//! A broad phase tracks one bounding box per entity and reports every pair
//! whose boxes overlap. Reporting extra pairs is allowed; missing one is not.

mod brute_force;
mod bvh;

use std::fmt;

use crate::dynamics::EntityHandle;
use crate::geometry::{Aabb, Ray};

pub use brute_force::BruteForce;
pub use bvh::Bvh;

/// Pair of entity handles, lower handle first
pub type CandidatePair = (EntityHandle, EntityHandle);

/// Orders a pair so the lower handle comes first
#[inline]
pub fn canonical_pair(a: EntityHandle, b: EntityHandle) -> CandidatePair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub trait BroadPhase: fmt::Debug {
    /// Starts tracking `entity`. Adding a tracked entity updates it.
    fn add(&mut self, entity: EntityHandle, aabb: Aabb);

    fn update(&mut self, entity: EntityHandle, aabb: Aabb);

    /// Stops tracking `entity`; untracked entities are ignored
    fn remove(&mut self, entity: EntityHandle);

    fn clear(&mut self);

    /// Overlapping pairs, each reported once in canonical order and sorted.
    /// Implementations may use `dt` to predict motion.
    fn step(&mut self, dt: f32) -> Vec<CandidatePair>;

    /// Entities whose boxes the ray enters within `max_distance`
    fn query_ray(&self, ray: &Ray, max_distance: f32) -> Vec<EntityHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
