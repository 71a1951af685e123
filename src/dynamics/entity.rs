use std::fmt;

use crate::arena::Handle;
use crate::error::{SimError, SimResult};
use crate::geometry::{Aabb, LocalBounds, Ray, RayHit, Shape};
use crate::math::{Quat, Transform, Vec3};

use super::rigid_body::{MassSpec, RigidBodyState, SolidState};

/// Identifier issued by a world, strictly increasing and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to an entity stored in a world
pub type EntityHandle = Handle<Entity>;

/// Bitmask collision groups.
///
/// Two entities may touch when each one's membership overlaps the other's
/// mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionLayers {
    pub membership: u32,
    pub mask: u32,
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::ALL
    }
}

impl CollisionLayers {
    pub const ALL: Self = Self {
        membership: u32::MAX,
        mask: u32::MAX,
    };

    pub const NONE: Self = Self {
        membership: 0,
        mask: 0,
    };

    #[inline]
    pub const fn new(membership: u32, mask: u32) -> Self {
        Self { membership, mask }
    }

    #[inline]
    pub fn interacts_with(self, other: Self) -> bool {
        self.membership & other.mask != 0 && other.membership & self.mask != 0
    }
}

/// What an entity is, with the data that kind carries
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Immovable, massless
    Static,
    /// Occupies volume and has mass, but carries no velocity
    Solid(SolidState),
    /// Solid with velocities and inertia
    RigidBody(RigidBodyState),
}

/// Kind requested by an [`EntityDesc`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescKind {
    Static,
    Solid,
    RigidBody,
}

/// Builder describing an entity to create
#[derive(Debug, Clone)]
pub struct EntityDesc {
    kind: DescKind,
    shape: Shape,
    transform: Transform,
    mass: MassSpec,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    user_data: u64,
    layers: CollisionLayers,
}

impl EntityDesc {
    fn with_kind(kind: DescKind, shape: Shape) -> Self {
        Self {
            kind,
            shape,
            transform: Transform::IDENTITY,
            mass: MassSpec::default(),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            user_data: 0,
            layers: CollisionLayers::ALL,
        }
    }

    /// Static scenery
    pub fn fixed(shape: Shape) -> Self {
        Self::with_kind(DescKind::Static, shape)
    }

    /// A solid with mass, unit density unless set
    pub fn solid(shape: Shape) -> Self {
        Self::with_kind(DescKind::Solid, shape)
    }

    /// A moving rigid body, unit density unless set
    pub fn rigid_body(shape: Shape) -> Self {
        Self::with_kind(DescKind::RigidBody, shape)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation.normalize();
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Transform::new(transform.position, transform.rotation.normalize());
        self
    }

    /// Sets the mass, ignored for static entities
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = MassSpec::Mass(mass);
        self
    }

    /// Sets the density, ignored for static entities
    pub fn with_density(mut self, density: f32) -> Self {
        self.mass = MassSpec::Density(density);
        self
    }

    /// Sets the initial velocities, ignored unless rigid
    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn with_layers(mut self, layers: CollisionLayers) -> Self {
        self.layers = layers;
        self
    }
}

/// Something in the world: a shape, where it is and what it is.
///
/// Entities own their shape and are owned by the world; they are not
/// `Clone`.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    shape: Shape,
    transform: Transform,
    user_data: u64,
    layers: CollisionLayers,
    bounds: LocalBounds,
}

impl Entity {
    pub(crate) fn from_desc(id: EntityId, desc: EntityDesc) -> SimResult<Self> {
        let kind = match desc.kind {
            DescKind::Static => EntityKind::Static,
            DescKind::Solid => EntityKind::Solid(SolidState::new(desc.mass, &desc.shape)?),
            DescKind::RigidBody => {
                let solid = SolidState::new(desc.mass, &desc.shape)?;
                let mut body = RigidBodyState::new(solid, &desc.shape)?;
                body.linear_velocity = desc.linear_velocity;
                body.angular_velocity = desc.angular_velocity;
                EntityKind::RigidBody(body)
            }
        };

        let mut entity = Self {
            id,
            kind,
            shape: desc.shape,
            transform: desc.transform,
            user_data: desc.user_data,
            layers: desc.layers,
            bounds: LocalBounds::default(),
        };
        entity.refresh_bounds();
        Ok(entity)
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self.kind, EntityKind::Static)
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Opaque value owned by the caller
    #[inline]
    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    #[inline]
    pub fn set_user_data(&mut self, user_data: u64) {
        self.user_data = user_data;
    }

    #[inline]
    pub fn layers(&self) -> CollisionLayers {
        self.layers
    }

    #[inline]
    pub fn set_layers(&mut self, layers: CollisionLayers) {
        self.layers = layers;
    }

    #[inline]
    pub fn local_bounds(&self) -> &LocalBounds {
        &self.bounds
    }

    /// Bounding box in world space, shell included
    #[inline]
    pub fn world_aabb(&self) -> Aabb {
        self.bounds.world_aabb(self.transform.position)
    }

    pub fn solid(&self) -> Option<&SolidState> {
        match &self.kind {
            EntityKind::Static => None,
            EntityKind::Solid(solid) => Some(solid),
            EntityKind::RigidBody(body) => Some(body.solid()),
        }
    }

    pub fn rigid_body(&self) -> Option<&RigidBodyState> {
        match &self.kind {
            EntityKind::RigidBody(body) => Some(body),
            _ => None,
        }
    }

    pub fn rigid_body_mut(&mut self) -> Option<&mut RigidBodyState> {
        match &mut self.kind {
            EntityKind::RigidBody(body) => Some(body),
            _ => None,
        }
    }

    /// `None` for static entities
    #[inline]
    pub fn mass(&self) -> Option<f32> {
        self.solid().map(SolidState::mass)
    }

    #[inline]
    pub fn density(&self) -> Option<f32> {
        self.solid().map(SolidState::density)
    }

    /// Ray test against the shape at its current placement
    pub fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.shape.ray_intersect(&self.transform.to_mat4(), ray)
    }

    /// Whether a world-space point is inside the shape
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.shape
            .contains_point(self.transform.inverse_transform_point(point))
    }

    pub(crate) fn set_mass(&mut self, mass: f32) -> SimResult<()> {
        match &mut self.kind {
            EntityKind::Static => Err(SimError::NotSolid(self.id)),
            EntityKind::Solid(solid) => solid.set_mass(mass),
            EntityKind::RigidBody(body) => body.set_mass(mass, &self.shape),
        }
    }

    pub(crate) fn set_density(&mut self, density: f32) -> SimResult<()> {
        match &mut self.kind {
            EntityKind::Static => Err(SimError::NotSolid(self.id)),
            EntityKind::Solid(solid) => solid.set_density(density),
            EntityKind::RigidBody(body) => body.set_density(density, &self.shape),
        }
    }

    /// Moves the entity and recomputes its bounds
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = Transform::new(transform.position, transform.rotation.normalize());
        self.refresh_bounds();
    }

    pub(crate) fn refresh_bounds(&mut self) {
        let rotation = self.transform.rotation_matrix();
        self.bounds.recompute(&self.shape, &rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn test_static_entity_has_no_mass() {
        let shape = Shape::sphere(1.0).unwrap();
        let mut entity = Entity::from_desc(EntityId(1), EntityDesc::fixed(shape)).unwrap();

        assert!(entity.is_static());
        assert_eq!(entity.mass(), None);
        assert_eq!(entity.set_mass(1.0), Err(SimError::NotSolid(EntityId(1))));
    }

    #[test]
    fn test_plane_cannot_be_solid() {
        let plane = Shape::plane(Vec3::Y, 0.0).unwrap();
        let result = Entity::from_desc(EntityId(1), EntityDesc::solid(plane));
        assert!(matches!(result, Err(SimError::NoVolume)));
    }

    #[test]
    fn test_rigid_body_desc() {
        let shape = Shape::cuboid(Vec3::splat(0.5)).unwrap();
        let desc = EntityDesc::rigid_body(shape)
            .with_position(Vec3::new(0.0, 3.0, 0.0))
            .with_mass(2.0)
            .with_velocity(Vec3::X, Vec3::ZERO)
            .with_user_data(42);
        let entity = Entity::from_desc(EntityId(7), desc).unwrap();

        assert_eq!(entity.user_data(), 42);
        assert_eq!(entity.mass(), Some(2.0));
        assert!(approx_eq(entity.density().unwrap(), 2.0, 1e-5));
        assert_eq!(entity.rigid_body().unwrap().linear_velocity, Vec3::X);
        assert_eq!(entity.world_aabb().center(), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_bounds_follow_rotation() {
        let shape = Shape::cuboid(Vec3::new(2.0, 0.5, 0.5)).unwrap();
        let mut entity = Entity::from_desc(EntityId(1), EntityDesc::fixed(shape)).unwrap();
        assert!(approx_eq(entity.local_bounds().half_extents.x, 2.0, 1e-6));

        entity.set_transform(Transform::new(
            Vec3::ZERO,
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2),
        ));
        assert!(approx_eq(entity.local_bounds().half_extents.y, 2.0, 1e-5));
        assert!(approx_eq(entity.local_bounds().half_extents.x, 0.5, 1e-5));
    }

    #[test]
    fn test_world_space_queries() {
        let shape = Shape::sphere(1.0).unwrap();
        let desc = EntityDesc::fixed(shape).with_position(Vec3::new(0.0, 0.0, 5.0));
        let entity = Entity::from_desc(EntityId(1), desc).unwrap();

        assert!(entity.contains_point(Vec3::new(0.0, 0.5, 5.0)));
        assert!(!entity.contains_point(Vec3::ZERO));

        let ray = Ray::new(Vec3::ZERO, Vec3::Z).unwrap();
        let hit = entity.ray_intersect(&ray).unwrap();
        assert!(approx_eq(hit.distance, 4.0, 1e-4));
    }

    #[test]
    fn test_layers() {
        let a = CollisionLayers::new(0b01, 0b10);
        let b = CollisionLayers::new(0b10, 0b01);
        let c = CollisionLayers::new(0b10, 0b10);
        assert!(a.interacts_with(b));
        assert!(!a.interacts_with(c));
        assert!(!CollisionLayers::NONE.interacts_with(CollisionLayers::ALL));
    }
}
