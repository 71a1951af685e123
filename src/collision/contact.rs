use crate::math::Vec3;

/// A single contact between two shapes.
///
/// `point` lies midway between the two surfaces. `normal` is unit length and
/// points from the first shape towards the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Penetration depth (positive when overlapping, zero when touching)
    pub depth: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

impl Contact {
    pub fn new(depth: f32, point: Vec3, normal: Vec3) -> Self {
        Self {
            depth,
            point,
            normal,
        }
    }

    /// Builds a contact from the deepest surface point of each shape
    pub fn from_surface_points(point_a: Vec3, point_b: Vec3, normal: Vec3, depth: f32) -> Self {
        Self::new(depth, (point_a + point_b) * 0.5, normal)
    }

    /// Deepest point of the first shape inside the second
    #[inline]
    pub fn point_a(&self) -> Vec3 {
        self.point + self.normal * (self.depth * 0.5)
    }

    /// Deepest point of the second shape inside the first
    #[inline]
    pub fn point_b(&self) -> Vec3 {
        self.point - self.normal * (self.depth * 0.5)
    }

    /// The same contact seen from the other shape
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_points() {
        // A's surface reaches x = 1, B's reaches back to x = 0.5
        let contact = Contact::from_surface_points(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::X,
            0.5,
        );
        assert_eq!(contact.point, Vec3::new(0.75, 0.0, 0.0));
        assert_eq!(contact.point_a(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(contact.point_b(), Vec3::new(0.5, 0.0, 0.0));

        let flipped = contact.flipped();
        assert_eq!(flipped.normal, -Vec3::X);
        assert_eq!(flipped.depth, 0.5);
    }
}
