use crate::error::{SimError, SimResult};
use crate::geometry::Shape;
use crate::math::{Mat3, Vec3};

/// Which of mass and density was set last; the other is derived from the
/// shape volume.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MassSpec {
    Mass(f32),
    Density(f32),
}

impl Default for MassSpec {
    fn default() -> Self {
        MassSpec::Density(1.0)
    }
}

impl MassSpec {
    fn validate(self) -> SimResult<Self> {
        let (what, value) = match self {
            MassSpec::Mass(m) => ("mass", m),
            MassSpec::Density(d) => ("density", d),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(SimError::InvalidMass { what, value });
        }
        Ok(self)
    }
}

/// Mass payload of an entity that occupies volume
#[derive(Debug, Clone, PartialEq)]
pub struct SolidState {
    spec: MassSpec,
    volume: f32,
}

impl SolidState {
    /// Fails with [`SimError::NoVolume`] unless the shape has a finite,
    /// positive volume.
    pub fn new(spec: MassSpec, shape: &Shape) -> SimResult<Self> {
        let volume = shape
            .volume()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or(SimError::NoVolume)?;
        Ok(Self {
            spec: spec.validate()?,
            volume,
        })
    }

    #[inline]
    pub fn spec(&self) -> MassSpec {
        self.spec
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn mass(&self) -> f32 {
        match self.spec {
            MassSpec::Mass(m) => m,
            MassSpec::Density(d) => d * self.volume,
        }
    }

    pub fn density(&self) -> f32 {
        match self.spec {
            MassSpec::Mass(m) => m / self.volume,
            MassSpec::Density(d) => d,
        }
    }

    /// Makes `mass` authoritative
    pub fn set_mass(&mut self, mass: f32) -> SimResult<()> {
        self.spec = MassSpec::Mass(mass).validate()?;
        Ok(())
    }

    /// Makes `density` authoritative
    pub fn set_density(&mut self, density: f32) -> SimResult<()> {
        self.spec = MassSpec::Density(density).validate()?;
        Ok(())
    }
}

/// A solid that moves: velocities plus an inertia tensor kept in step with
/// its mass.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyState {
    solid: SolidState,
    /// Linear velocity
    pub linear_velocity: Vec3,
    /// Angular velocity (in radians per second)
    pub angular_velocity: Vec3,
    inertia: Mat3,
}

impl RigidBodyState {
    pub fn new(solid: SolidState, shape: &Shape) -> SimResult<Self> {
        let inertia = shape.inertia(solid.mass()).ok_or(SimError::NoVolume)?;
        Ok(Self {
            solid,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inertia,
        })
    }

    #[inline]
    pub fn solid(&self) -> &SolidState {
        &self.solid
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.solid.mass()
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.solid.mass()
    }

    /// Local inertia tensor
    #[inline]
    pub fn inertia(&self) -> Mat3 {
        self.inertia
    }

    /// Inverse inertia in world space for the given orientation
    pub fn world_inverse_inertia(&self, rotation: &Mat3) -> Mat3 {
        let inv_local = self.inertia.try_inverse().unwrap_or(Mat3::ZERO);
        *rotation * inv_local * rotation.transpose()
    }

    /// Velocity of a point at offset `r` from the body origin
    #[inline]
    pub fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    pub fn set_mass(&mut self, mass: f32, shape: &Shape) -> SimResult<()> {
        self.solid.set_mass(mass)?;
        self.recompute_inertia(shape);
        Ok(())
    }

    pub fn set_density(&mut self, density: f32, shape: &Shape) -> SimResult<()> {
        self.solid.set_density(density)?;
        self.recompute_inertia(shape);
        Ok(())
    }

    fn recompute_inertia(&mut self, shape: &Shape) {
        if let Some(inertia) = shape.inertia(self.solid.mass()) {
            self.inertia = inertia;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Quat};

    fn cube() -> Shape {
        // Unit volume
        Shape::cuboid(Vec3::splat(0.5)).unwrap()
    }

    #[test]
    fn test_mass_density_roundtrip() {
        let shape = Shape::cuboid(Vec3::ONE).unwrap();
        let mut solid = SolidState::new(MassSpec::Density(2.0), &shape).unwrap();
        assert!(approx_eq(solid.mass(), 16.0, 1e-4));

        solid.set_mass(4.0).unwrap();
        assert_eq!(solid.spec(), MassSpec::Mass(4.0));
        assert!(approx_eq(solid.density(), 0.5, 1e-6));
    }

    #[test]
    fn test_invalid_mass() {
        let mut solid = SolidState::new(MassSpec::default(), &cube()).unwrap();
        assert!(matches!(
            solid.set_mass(0.0),
            Err(SimError::InvalidMass { what: "mass", .. })
        ));
        assert!(solid.set_density(f32::NAN).is_err());
        assert!(solid.set_mass(-3.0).is_err());
        assert!(SolidState::new(MassSpec::Mass(-1.0), &cube()).is_err());
    }

    #[test]
    fn test_requires_volume() {
        let patch = Shape::plane_shape(Vec3::Y, 0.0, 1.0).unwrap();
        let plane = Shape::plane(Vec3::Y, 0.0).unwrap();
        assert_eq!(
            SolidState::new(MassSpec::default(), &patch),
            Err(SimError::NoVolume)
        );
        assert_eq!(
            SolidState::new(MassSpec::default(), &plane),
            Err(SimError::NoVolume)
        );
    }

    #[test]
    fn test_inertia_follows_mass() {
        let shape = cube();
        let solid = SolidState::new(MassSpec::Mass(1.0), &shape).unwrap();
        let mut body = RigidBodyState::new(solid, &shape).unwrap();
        let before = body.inertia().get(0, 0);

        body.set_mass(3.0, &shape).unwrap();
        assert!(approx_eq(body.inertia().get(0, 0), before * 3.0, 1e-6));
        assert!(approx_eq(body.inverse_mass(), 1.0 / 3.0, 1e-6));
    }

    #[test]
    fn test_world_inverse_inertia_of_sphere_is_rotation_invariant() {
        let shape = Shape::sphere(1.0).unwrap();
        let solid = SolidState::new(MassSpec::Mass(2.5), &shape).unwrap();
        let body = RigidBodyState::new(solid, &shape).unwrap();

        let rotation = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.8).to_mat3();
        let world = body.world_inverse_inertia(&rotation);
        let local = body.world_inverse_inertia(&Mat3::IDENTITY);
        assert!(world.approx_eq(&local, 1e-5));
    }

    #[test]
    fn test_velocity_at() {
        let shape = cube();
        let solid = SolidState::new(MassSpec::default(), &shape).unwrap();
        let mut body = RigidBodyState::new(solid, &shape).unwrap();
        body.linear_velocity = Vec3::X;
        body.angular_velocity = Vec3::new(0.0, 0.0, 2.0);

        let v = body.velocity_at(Vec3::X);
        assert!(approx_eq(v.x, 1.0, 1e-6));
        assert!(approx_eq(v.y, 2.0, 1e-6));
    }
}
