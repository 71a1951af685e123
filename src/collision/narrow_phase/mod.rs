//! Exact pairwise queries between shapes.

pub mod analytic;
mod dispatch;
pub mod epa;
pub mod gjk;

pub use dispatch::{ContainsFn, IntersectFn, NarrowPhase};
pub use epa::{epa, EpaResult};
pub use gjk::{gjk, GjkResult, Placed, Simplex, SupportPoint};
