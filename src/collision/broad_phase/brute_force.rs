use crate::dynamics::EntityHandle;
use crate::geometry::{Aabb, Ray};

use super::{canonical_pair, BroadPhase, CandidatePair};

/// Tests every pair of boxes. Exact, quadratic, useful as a reference.
#[derive(Debug, Default)]
pub struct BruteForce {
    entries: Vec<(EntityHandle, Aabb)>,
}

impl BruteForce {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForce {
    fn add(&mut self, entity: EntityHandle, aabb: Aabb) {
        self.update(entity, aabb);
    }

    fn update(&mut self, entity: EntityHandle, aabb: Aabb) {
        match self.entries.iter_mut().find(|(e, _)| *e == entity) {
            Some(entry) => entry.1 = aabb,
            None => self.entries.push((entity, aabb)),
        }
    }

    fn remove(&mut self, entity: EntityHandle) {
        self.entries.retain(|(e, _)| *e != entity);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn step(&mut self, _dt: f32) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        for (i, &(a, box_a)) in self.entries.iter().enumerate() {
            for &(b, box_b) in &self.entries[i + 1..] {
                if box_a.intersects(box_b) {
                    pairs.push(canonical_pair(a, b));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn query_ray(&self, ray: &Ray, max_distance: f32) -> Vec<EntityHandle> {
        self.entries
            .iter()
            .filter(|(_, aabb)| {
                aabb.ray_intersection(ray.origin(), ray.direction())
                    .is_some_and(|(t_min, _)| t_min <= max_distance)
            })
            .map(|&(entity, _)| entity)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn h(i: u32) -> EntityHandle {
        EntityHandle::from_raw_parts(i, 0)
    }

    #[test]
    fn test_pairs_are_canonical() {
        let mut bp = BruteForce::new();
        bp.add(h(5), Aabb::new(Vec3::ZERO, Vec3::ONE));
        bp.add(h(2), Aabb::new(Vec3::splat(0.5), Vec3::splat(2.0)));
        bp.add(h(7), Aabb::new(Vec3::splat(1.5), Vec3::splat(3.0)));

        assert_eq!(bp.step(0.016), vec![(h(2), h(5)), (h(2), h(7))]);
    }

    #[test]
    fn test_update_and_remove() {
        let mut bp = BruteForce::new();
        bp.add(h(0), Aabb::new(Vec3::ZERO, Vec3::ONE));
        bp.add(h(1), Aabb::new(Vec3::splat(4.0), Vec3::splat(5.0)));
        assert!(bp.step(0.0).is_empty());

        bp.update(h(1), Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5)));
        assert_eq!(bp.step(0.0).len(), 1);

        bp.remove(h(0));
        bp.remove(h(0));
        assert_eq!(bp.len(), 1);
        assert!(bp.step(0.0).is_empty());
    }

    #[test]
    fn test_infinite_box_overlaps_all() {
        let mut bp = BruteForce::new();
        bp.add(h(0), Aabb::INFINITE);
        bp.add(h(1), Aabb::new(Vec3::splat(100.0), Vec3::splat(101.0)));
        assert_eq!(bp.step(0.0), vec![(h(0), h(1))]);
    }
}
