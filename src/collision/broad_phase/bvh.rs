use std::collections::HashMap;

use log::trace;

use crate::dynamics::EntityHandle;
use crate::geometry::{Aabb, Ray};

use super::{canonical_pair, BroadPhase, CandidatePair};

const NULL: u32 = u32::MAX;

/// A node in the BVH tree
#[derive(Debug, Clone)]
struct BvhNode {
    /// Fat box for leaves, union of children otherwise
    aabb: Aabb,
    left: u32,
    right: u32,
    parent: u32,
    /// Height of the subtree
    height: i32,
    /// Set on leaves only
    entity: Option<EntityHandle>,
}

impl BvhNode {
    fn is_leaf(&self) -> bool {
        self.entity.is_some()
    }
}

/// Dynamic AABB tree over fattened entity boxes.
///
/// Leaves store boxes grown by `margin` so small motions do not restructure
/// the tree. Entities with infinite boxes are kept aside and paired with
/// everything.
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<u32>,
    /// Maps entities to their leaf node indices
    leaves: HashMap<EntityHandle, u32>,
    unbounded: Vec<EntityHandle>,
    /// Free node list for reuse
    free_list: Vec<u32>,
    margin: f32,
}

impl Default for Bvh {
    fn default() -> Self {
        Self::new()
    }
}

impl Bvh {
    pub const DEFAULT_MARGIN: f32 = 0.1;

    pub fn new() -> Self {
        Self::with_margin(Self::DEFAULT_MARGIN)
    }

    pub fn with_margin(margin: f32) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            leaves: HashMap::new(),
            unbounded: Vec::new(),
            free_list: Vec::new(),
            margin: margin.max(0.0),
        }
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Height of the tree, 0 for a single leaf or an empty tree
    pub fn height(&self) -> i32 {
        self.root.map_or(0, |root| self.nodes[root as usize].height)
    }

    /// The fat box stored for `entity`
    pub fn fat_aabb(&self, entity: EntityHandle) -> Option<Aabb> {
        if self.unbounded.contains(&entity) {
            return Some(Aabb::INFINITE);
        }
        self.leaves
            .get(&entity)
            .map(|&leaf| self.nodes[leaf as usize].aabb)
    }

    /// Visits entities whose fat boxes intersect `aabb`
    pub fn query_aabb(&self, aabb: Aabb, mut callback: impl FnMut(EntityHandle)) {
        if let Some(root) = self.root {
            self.query_tree(root, aabb, &mut callback);
        }
        for &entity in &self.unbounded {
            callback(entity);
        }
    }

    fn query_tree(&self, node: u32, aabb: Aabb, callback: &mut impl FnMut(EntityHandle)) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            let n = &self.nodes[current as usize];

            if !n.aabb.intersects(aabb) {
                continue;
            }

            match n.entity {
                Some(entity) => callback(entity),
                None => {
                    stack.push(n.left);
                    stack.push(n.right);
                }
            }
        }
    }

    fn insert_leaf(&mut self, entity: EntityHandle, aabb: Aabb) {
        let leaf = self.allocate_node(BvhNode {
            aabb: aabb.expand(self.margin),
            left: NULL,
            right: NULL,
            parent: NULL,
            height: 0,
            entity: Some(entity),
        });
        self.leaves.insert(entity, leaf);

        let Some(root) = self.root else {
            self.root = Some(leaf);
            return;
        };

        let sibling = self.find_best_sibling(root, leaf);

        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node(BvhNode {
            aabb: self.nodes[leaf as usize]
                .aabb
                .union(self.nodes[sibling as usize].aabb),
            left: sibling,
            right: leaf,
            parent: old_parent,
            height: 0,
            entity: None,
        });
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent == NULL {
            self.root = Some(new_parent);
        } else {
            let old_parent_node = &mut self.nodes[old_parent as usize];
            if old_parent_node.left == sibling {
                old_parent_node.left = new_parent;
            } else {
                old_parent_node.right = new_parent;
            }
        }

        self.refit(new_parent);
    }

    fn remove_leaf(&mut self, entity: EntityHandle) -> bool {
        let Some(leaf) = self.leaves.remove(&entity) else {
            return false;
        };

        if Some(leaf) == self.root {
            self.root = None;
            self.free_list.push(leaf);
            return true;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grandparent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].left == leaf {
            self.nodes[parent as usize].right
        } else {
            self.nodes[parent as usize].left
        };

        if grandparent == NULL {
            self.root = Some(sibling);
            self.nodes[sibling as usize].parent = NULL;
        } else {
            let grandparent_node = &mut self.nodes[grandparent as usize];
            if grandparent_node.left == parent {
                grandparent_node.left = sibling;
            } else {
                grandparent_node.right = sibling;
            }
            self.nodes[sibling as usize].parent = grandparent;
            self.refit(grandparent);
        }

        self.free_list.push(leaf);
        self.free_list.push(parent);
        true
    }

    fn allocate_node(&mut self, node: BvhNode) -> u32 {
        if let Some(index) = self.free_list.pop() {
            self.nodes[index as usize] = node;
            index
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(node);
            index
        }
    }

    /// Surface-area heuristic descent, pruned by the inherited cost
    fn find_best_sibling(&self, root: u32, leaf: u32) -> u32 {
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut best = root;
        let mut best_cost = leaf_aabb.union(self.nodes[root as usize].aabb).surface_area();

        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            let n = &self.nodes[current as usize];

            let combined_cost = leaf_aabb.union(n.aabb).surface_area();
            if combined_cost < best_cost {
                best = current;
                best_cost = combined_cost;
            }

            if !n.is_leaf() {
                let inherited_cost = combined_cost - n.aabb.surface_area();
                let left_cost = leaf_aabb.union(self.nodes[n.left as usize].aabb).surface_area()
                    + inherited_cost;
                let right_cost = leaf_aabb
                    .union(self.nodes[n.right as usize].aabb)
                    .surface_area()
                    + inherited_cost;

                if left_cost < best_cost || right_cost < best_cost {
                    stack.push(n.left);
                    stack.push(n.right);
                }
            }
        }

        best
    }

    fn refit(&mut self, start: u32) {
        let mut current = start;

        while current != NULL {
            let n = &self.nodes[current as usize];
            if n.is_leaf() {
                current = n.parent;
                continue;
            }

            let left = &self.nodes[n.left as usize];
            let right = &self.nodes[n.right as usize];
            let aabb = left.aabb.union(right.aabb);
            let height = 1 + left.height.max(right.height);

            let n = &mut self.nodes[current as usize];
            n.aabb = aabb;
            n.height = height;
            current = n.parent;
        }
    }
}

impl BroadPhase for Bvh {
    fn add(&mut self, entity: EntityHandle, aabb: Aabb) {
        if self.leaves.contains_key(&entity) || self.unbounded.contains(&entity) {
            self.update(entity, aabb);
            return;
        }

        if aabb.is_finite() {
            self.insert_leaf(entity, aabb);
        } else {
            self.unbounded.push(entity);
        }
    }

    fn update(&mut self, entity: EntityHandle, aabb: Aabb) {
        if !aabb.is_finite() {
            if self.remove_leaf(entity) || !self.unbounded.contains(&entity) {
                self.unbounded.push(entity);
            }
            return;
        }

        if let Some(pos) = self.unbounded.iter().position(|&e| e == entity) {
            self.unbounded.swap_remove(pos);
            self.insert_leaf(entity, aabb);
            return;
        }

        match self.leaves.get(&entity) {
            // Still inside its fat box
            Some(&leaf) if self.nodes[leaf as usize].aabb.contains_aabb(aabb) => {}
            Some(_) => {
                trace!("bvh: reinserting {entity:?}");
                self.remove_leaf(entity);
                self.insert_leaf(entity, aabb);
            }
            None => self.insert_leaf(entity, aabb),
        }
    }

    fn remove(&mut self, entity: EntityHandle) {
        if !self.remove_leaf(entity) {
            self.unbounded.retain(|&e| e != entity);
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaves.clear();
        self.unbounded.clear();
        self.free_list.clear();
    }

    fn step(&mut self, _dt: f32) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();

        if let Some(root) = self.root {
            for (&entity, &leaf) in &self.leaves {
                let aabb = self.nodes[leaf as usize].aabb;
                self.query_tree(root, aabb, &mut |other| {
                    if entity < other {
                        pairs.push((entity, other));
                    }
                });
            }
        }

        for (i, &a) in self.unbounded.iter().enumerate() {
            for &b in &self.unbounded[i + 1..] {
                pairs.push(canonical_pair(a, b));
            }
            for &b in self.leaves.keys() {
                pairs.push(canonical_pair(a, b));
            }
        }

        pairs.sort_unstable();
        pairs
    }

    fn query_ray(&self, ray: &Ray, max_distance: f32) -> Vec<EntityHandle> {
        let mut results = self.unbounded.clone();

        let Some(root) = self.root else {
            return results;
        };

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let n = &self.nodes[current as usize];

            let Some((t_min, _)) = n.aabb.ray_intersection(ray.origin(), ray.direction()) else {
                continue;
            };
            if t_min > max_distance {
                continue;
            }

            match n.entity {
                Some(entity) => results.push(entity),
                None => {
                    stack.push(n.left);
                    stack.push(n.right);
                }
            }
        }

        results
    }

    fn len(&self) -> usize {
        self.leaves.len() + self.unbounded.len()
    }
}
