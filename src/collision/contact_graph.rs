//! Persistent pairwise contacts with time decay.
//!
//! Every confirmed pair owns one [`ContactEdge`]. Each [`ContactGraph::advance`]
//! ages all edges by one tick; an edge that is not confirmed again before its
//! age reaches zero is evicted.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::arena::{Arena, Handle};
use crate::dynamics::{Entity, EntityHandle};

use super::broad_phase::{canonical_pair, CandidatePair};
use super::contact::Contact;
use super::solver::{ContactSolver, Entities};

/// Lifetime of a new edge, in ticks
pub const DEFAULT_INITIAL_AGE: i32 = 10;

/// Smallest initial age that lets an edge confirmed every tick outlive the
/// `advance` of that same tick
pub const MIN_INITIAL_AGE: i32 = 2;

pub type EdgeHandle = Handle<ContactEdge>;

/// How a reconfirmed edge's age changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefreshPolicy {
    /// Back to the initial age
    #[default]
    Reset,
    /// One extra tick per confirmation, uncapped
    Increment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactGraphConfig {
    pub initial_age: i32,
    pub refresh: RefreshPolicy,
}

impl Default for ContactGraphConfig {
    fn default() -> Self {
        Self {
            initial_age: DEFAULT_INITIAL_AGE,
            refresh: RefreshPolicy::Reset,
        }
    }
}

/// A tracked contact between two entities, lower handle first.
///
/// The edge does not own the entities; it is dropped by the graph when it
/// expires or when either entity leaves the world.
#[derive(Debug, Clone)]
pub struct ContactEdge {
    a: EntityHandle,
    b: EntityHandle,
    age: i32,
    contact: Option<Contact>,
    confirmations: u32,
    refreshed: bool,
}

impl ContactEdge {
    #[inline]
    pub fn a(&self) -> EntityHandle {
        self.a
    }

    #[inline]
    pub fn b(&self) -> EntityHandle {
        self.b
    }

    #[inline]
    pub fn pair(&self) -> CandidatePair {
        (self.a, self.b)
    }

    /// Ticks left before eviction
    #[inline]
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Latest contact, `None` once a tick passes without confirmation.
    /// The normal points from [`ContactEdge::a`] towards [`ContactEdge::b`].
    #[inline]
    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    /// Number of times the pair has been confirmed, creation included
    #[inline]
    pub fn confirmations(&self) -> u32 {
        self.confirmations
    }

    #[inline]
    pub fn involves(&self, entity: EntityHandle) -> bool {
        self.a == entity || self.b == entity
    }
}

/// Arena of contact edges indexed by unordered entity pair
#[derive(Debug, Default)]
pub struct ContactGraph {
    config: ContactGraphConfig,
    edges: Arena<ContactEdge>,
    index: HashMap<CandidatePair, EdgeHandle>,
}

impl ContactGraph {
    /// Initial ages below [`MIN_INITIAL_AGE`] are raised to it
    pub fn new(mut config: ContactGraphConfig) -> Self {
        if config.initial_age < MIN_INITIAL_AGE {
            warn!(
                "contact initial age {} raised to {}",
                config.initial_age, MIN_INITIAL_AGE
            );
            config.initial_age = MIN_INITIAL_AGE;
        }
        Self {
            config,
            edges: Arena::new(),
            index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ContactGraphConfig {
        &self.config
    }

    /// Records a confirmed contact between `a` and `b`.
    ///
    /// `(a, b)` and `(b, a)` address the same edge; the contact is stored
    /// with its normal pointing from the lower handle to the higher one.
    /// Returns true when a new edge was created.
    pub fn check(&mut self, a: EntityHandle, b: EntityHandle, contact: Contact) -> bool {
        let key = canonical_pair(a, b);
        let contact = if key.0 == a { contact } else { contact.flipped() };

        if let Some(edge) = self
            .index
            .get(&key)
            .and_then(|&handle| self.edges.get_mut(handle))
        {
            edge.age = match self.config.refresh {
                RefreshPolicy::Reset => self.config.initial_age,
                RefreshPolicy::Increment => edge.age.saturating_add(1),
            };
            edge.contact = Some(contact);
            edge.confirmations += 1;
            edge.refreshed = true;
            trace!("contact {:?} refreshed, age {}", key, edge.age);
            return false;
        }

        let handle = self.edges.insert(ContactEdge {
            a: key.0,
            b: key.1,
            age: self.config.initial_age,
            contact: Some(contact),
            confirmations: 1,
            refreshed: true,
        });
        self.index.insert(key, handle);
        trace!("contact {:?} created", key);
        true
    }

    /// Ages every edge by one tick and evicts the expired ones.
    ///
    /// Returns the pairs that were evicted.
    pub fn advance(&mut self) -> Vec<CandidatePair> {
        let mut expired = Vec::new();
        for (handle, edge) in self.edges.iter_mut() {
            edge.age -= 1;
            if !edge.refreshed {
                edge.contact = None;
            }
            edge.refreshed = false;
            if edge.age <= 0 {
                expired.push(handle);
            }
        }

        let evicted: Vec<CandidatePair> = expired
            .into_iter()
            .filter_map(|handle| self.remove_edge(handle))
            .collect();
        if !evicted.is_empty() {
            debug!("evicted {} contact edges", evicted.len());
        }
        evicted
    }

    /// Hands the current edges to `solver`. The solver may change entities
    /// in place but cannot add or remove them.
    pub fn solve(&self, solver: &mut dyn ContactSolver, entities: &mut Arena<Entity>, dt: f32) {
        solver.solve(self, &mut Entities::new(entities), dt);
    }

    /// Drops every edge touching `entity`, returning how many were removed
    pub fn remove_entity(&mut self, entity: EntityHandle) -> usize {
        let touching: Vec<EdgeHandle> = self
            .edges
            .iter()
            .filter(|(_, edge)| edge.involves(entity))
            .map(|(handle, _)| handle)
            .collect();

        touching
            .into_iter()
            .filter_map(|handle| self.remove_edge(handle))
            .count()
    }

    pub fn contains(&self, a: EntityHandle, b: EntityHandle) -> bool {
        self.index.contains_key(&canonical_pair(a, b))
    }

    pub fn edge(&self, a: EntityHandle, b: EntityHandle) -> Option<&ContactEdge> {
        let handle = *self.index.get(&canonical_pair(a, b))?;
        self.edges.get(handle)
    }

    pub fn age(&self, a: EntityHandle, b: EntityHandle) -> Option<i32> {
        self.edge(a, b).map(ContactEdge::age)
    }

    pub fn edges(&self) -> impl Iterator<Item = &ContactEdge> {
        self.edges.iter().map(|(_, edge)| edge)
    }

    /// Edges confirmed during the current tick
    pub fn active_edges(&self) -> impl Iterator<Item = &ContactEdge> {
        self.edges().filter(|edge| edge.contact.is_some())
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.index.clear();
    }

    fn remove_edge(&mut self, handle: EdgeHandle) -> Option<CandidatePair> {
        let edge = self.edges.remove(handle)?;
        self.index.remove(&edge.pair());
        Some(edge.pair())
    }
}
