//! # rigidsim
//!
//! The collision core of a real-time rigid-body simulation.
//!
//! ## Features
//!
//! - **Shapes**: spheres, infinite planes, square plane patches and convex polytopes
//! - **Ray Queries**: exact ray tests per shape and nearest-hit world ray casts
//! - **Broad Phase**: dynamic AABB tree (BVH) or exhaustive pair test, behind one trait
//! - **Narrow Phase**: pairwise handler registry with analytic tests and GJK + EPA
//! - **Contact Graph**: persistent contact edges that expire unless reconfirmed
//! - **Solver Hook**: a pluggable [`ContactSolver`](collision::ContactSolver) runs last in every tick
//!
//! ## Quick Start
//!
//! ```rust
//! use rigidsim::prelude::*;
//!
//! # fn main() -> Result<(), SimError> {
//! let mut world = World::default();
//!
//! let ground = world.create_entity(EntityDesc::fixed(Shape::plane(Vec3::Y, 0.0)?))?;
//! let ball = world.create_entity(
//!     EntityDesc::rigid_body(Shape::sphere(0.5)?)
//!         .with_position(Vec3::new(0.0, 0.4, 0.0))
//!         .with_mass(1.0),
//! )?;
//!
//! let report = world.step(1.0 / 60.0);
//! assert_eq!(report.confirmed, 1);
//! assert!(world.contacts().contains(ground, ball));
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod collision;
pub mod dynamics;
pub mod error;
pub mod geometry;
pub mod math;
mod world;

pub use error::{SimError, SimResult};
pub use world::{BroadPhaseKind, RayCastHit, World, WorldConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collision::{
        BroadPhase, Contact, ContactFilter, ContactGraphConfig, ContactSolver, Entities, NarrowPhase,
        RefreshPolicy, StepReport,
    };
    pub use crate::dynamics::{CollisionLayers, Entity, EntityDesc, EntityHandle, EntityId};
    pub use crate::error::{SimError, SimResult};
    pub use crate::geometry::{Aabb, Ray, RayHit, Shape, ShapeKind};
    pub use crate::math::{Mat3, Mat4, Quat, Transform, Vec3};
    pub use crate::world::{BroadPhaseKind, RayCastHit, World, WorldConfig};
}
