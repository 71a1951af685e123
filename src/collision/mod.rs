pub mod broad_phase;
mod collision_graph;
pub mod contact;
pub mod contact_graph;
mod filter;
pub mod narrow_phase;
mod solver;

pub use broad_phase::{canonical_pair, BroadPhase, BruteForce, Bvh, CandidatePair};
pub use collision_graph::{CollisionGraph, StepReport};
pub use contact::Contact;
pub use contact_graph::{
    ContactEdge, ContactGraph, ContactGraphConfig, EdgeHandle, RefreshPolicy, DEFAULT_INITIAL_AGE,
    MIN_INITIAL_AGE,
};
pub use filter::{ContactFilter, DefaultContactFilter, LayerFilter};
pub use narrow_phase::{ContainsFn, IntersectFn, NarrowPhase};
pub use solver::{ContactSolver, Entities, NullSolver};
