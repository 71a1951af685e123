//! Entities and their mass payloads.

mod entity;
mod rigid_body;

pub use entity::{CollisionLayers, Entity, EntityDesc, EntityHandle, EntityId, EntityKind};
pub use rigid_body::{MassSpec, RigidBodyState, SolidState};
