use rand::{Rng, RngCore};

use crate::error::{SimError, SimResult};
use crate::math::{Vec3, EPSILON};

use super::ray::RayHit;
use super::shape::{ShapeGeometry, ShapeKind};

/// Outward face plane: points with `dot(normal, p) <= offset` are inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePlane {
    pub normal: Vec3,
    pub offset: f32,
}

/// A convex polyhedron given by its vertices and faces.
///
/// Faces are vertex index lists. Construction rewinds any face whose normal
/// points towards the centroid so every stored face winds outward.
#[derive(Debug, Clone, PartialEq)]
pub struct Polytope {
    vertices: Vec<Vec3>,
    faces: Vec<Vec<usize>>,
    planes: Vec<FacePlane>,
    min: Vec3,
    max: Vec3,
}

impl Polytope {
    pub fn new(vertices: Vec<Vec3>, mut faces: Vec<Vec<usize>>) -> SimResult<Self> {
        if vertices.len() < 4 || faces.len() < 4 {
            return Err(SimError::invalid_shape(format!(
                "polytope needs at least 4 vertices and 4 faces, got {} and {}",
                vertices.len(),
                faces.len()
            )));
        }
        if let Some(v) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(SimError::invalid_shape(format!("non-finite vertex {v:?}")));
        }

        let centroid = vertices.iter().fold(Vec3::ZERO, |acc, &v| acc + v) / vertices.len() as f32;
        let scale = vertices
            .iter()
            .map(|v| (*v - centroid).length())
            .fold(1.0f32, f32::max);
        let tolerance = 1e-4 * scale;

        let mut planes = Vec::with_capacity(faces.len());
        for (index, face) in faces.iter_mut().enumerate() {
            if face.len() < 3 || face.iter().any(|&i| i >= vertices.len()) {
                return Err(SimError::invalid_shape(format!(
                    "face {index} must reference at least 3 valid vertices"
                )));
            }

            let mut normal = face_normal(&vertices, face).ok_or_else(|| {
                SimError::invalid_shape(format!("face {index} is degenerate"))
            })?;
            let mut offset = face_center(&vertices, face).dot(normal);

            if normal.dot(centroid) > offset {
                face.reverse();
                normal = -normal;
                offset = -offset;
            }

            if vertices.iter().any(|v| normal.dot(*v) > offset + tolerance) {
                return Err(SimError::invalid_shape(format!(
                    "polytope is not convex at face {index}"
                )));
            }

            planes.push(FacePlane { normal, offset });
        }

        let (min, max) = vertices.iter().fold(
            (Vec3::INFINITY, -Vec3::INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        );

        Ok(Self {
            vertices,
            faces,
            planes,
            min,
            max,
        })
    }

    /// An axis-aligned box centred on the origin
    pub fn cuboid(half_extents: Vec3) -> SimResult<Self> {
        let h = half_extents;
        if !h.is_finite() || h.x <= 0.0 || h.y <= 0.0 || h.z <= 0.0 {
            return Err(SimError::invalid_shape(format!(
                "box half extents must be finite and positive, got {half_extents:?}"
            )));
        }

        // Bit 0 selects +x, bit 1 +y, bit 2 +z
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        let faces = vec![
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
        ];
        Self::new(vertices, faces)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    #[inline]
    pub fn planes(&self) -> &[FacePlane] {
        &self.planes
    }
}

fn face_normal(vertices: &[Vec3], face: &[usize]) -> Option<Vec3> {
    let mut sum = Vec3::ZERO;
    for (k, &i) in face.iter().enumerate() {
        let next = face[(k + 1) % face.len()];
        sum += vertices[i].cross(vertices[next]);
    }
    sum.try_normalize()
}

fn face_center(vertices: &[Vec3], face: &[usize]) -> Vec3 {
    face.iter().fold(Vec3::ZERO, |acc, &i| acc + vertices[i]) / face.len() as f32
}

impl ShapeGeometry for Polytope {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Polytope
    }

    fn num_verts(&self) -> usize {
        self.vertices.len()
    }

    fn vert(&self, i: usize) -> Vec3 {
        self.vertices[i]
    }

    /// Clips the ray against every face plane. The hit is the last entry,
    /// provided it precedes the first exit.
    fn local_ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = Vec3::ZERO;

        for plane in &self.planes {
            let denom = plane.normal.dot(direction);
            let dist = plane.offset - plane.normal.dot(origin);

            if denom.abs() < EPSILON {
                if dist < 0.0 {
                    return None;
                }
                continue;
            }

            let t = dist / denom;
            if denom < 0.0 {
                if t > t_enter {
                    t_enter = t;
                    enter_normal = plane.normal;
                }
            } else {
                t_exit = t_exit.min(t);
            }

            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter < EPSILON {
            return None;
        }

        Some(RayHit {
            distance: t_enter,
            point: origin + direction * t_enter,
            normal: enter_normal,
        })
    }

    fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.normal.dot(point) < plane.offset)
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        self.planes
            .iter()
            .map(|plane| plane.normal.dot(point) - plane.offset)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        for _ in 0..64 {
            let p = Vec3::new(
                rng.gen_range(self.min.x..=self.max.x),
                rng.gen_range(self.min.y..=self.max.y),
                rng.gen_range(self.min.z..=self.max.z),
            );
            if self.contains_point(p) {
                return p;
            }
        }
        (self.min + self.max) * 0.5
    }

    /// Sum of signed tetrahedra from the origin over every face fan
    fn volume(&self) -> Option<f32> {
        let mut six_volume = 0.0;
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            for k in 1..face.len() - 1 {
                let v1 = self.vertices[face[k]];
                let v2 = self.vertices[face[k + 1]];
                six_volume += v0.dot(v1.cross(v2));
            }
        }
        Some(six_volume / 6.0)
    }

    /// Approximated by the solid box spanning the vertices
    fn unit_inertia(&self) -> Option<Vec3> {
        let size = self.max - self.min;
        let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
        Some(Vec3::new(y2 + z2, x2 + z2, x2 + y2) * (1.0 / 12.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tetrahedron() -> Polytope {
        // Faces deliberately given with mixed winding
        Polytope::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_faces_wound_outward() {
        let tet = tetrahedron();
        let centroid = Vec3::splat(0.25);
        for plane in tet.planes() {
            assert!(plane.normal.dot(centroid) < plane.offset);
        }
        assert!(approx_eq(tet.volume().unwrap(), 1.0 / 6.0, 1e-6));
    }

    #[test]
    fn test_cuboid_volume_and_inertia() {
        let cube = Polytope::cuboid(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert!(approx_eq(cube.volume().unwrap(), 48.0, 1e-4));

        let i = cube.unit_inertia().unwrap();
        assert!(approx_eq(i.x, (16.0 + 36.0) / 12.0, 1e-5));
        assert!(approx_eq(i.z, (4.0 + 16.0) / 12.0, 1e-5));
    }

    #[test]
    fn test_invalid() {
        assert!(Polytope::cuboid(Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(Polytope::new(vec![Vec3::ZERO; 3], vec![vec![0, 1, 2]; 4]).is_err());
        // Index out of range
        assert!(Polytope::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 9]],
        )
        .is_err());
    }

    #[test]
    fn test_rejects_concave() {
        // Square pyramid with the apex pushed inside the base plane
        let vertices = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.2, 0.0),
        ];
        let faces = vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 4],
            vec![1, 2, 4],
            vec![2, 3, 4],
            vec![3, 0, 5],
        ];
        assert!(Polytope::new(vertices, faces).is_err());
    }

    #[test]
    fn test_contains() {
        let cube = Polytope::cuboid(Vec3::ONE).unwrap();
        assert!(cube.contains_point(Vec3::splat(0.9)));
        assert!(!cube.contains_point(Vec3::new(1.0, 0.0, 0.0)));
        assert!(!cube.contains_point(Vec3::new(1.5, 0.0, 0.0)));
        assert!(approx_eq(cube.signed_distance(Vec3::ZERO), -1.0, 1e-6));
        assert!(approx_eq(cube.signed_distance(Vec3::new(3.0, 0.0, 0.0)), 2.0, 1e-6));
    }

    #[test]
    fn test_ray() {
        let cube = Polytope::cuboid(Vec3::ONE).unwrap();

        let hit = cube
            .local_ray_intersect(Vec3::new(-5.0, 0.2, 0.3), Vec3::X)
            .unwrap();
        assert!(approx_eq(hit.distance, 4.0, 1e-5));
        assert_eq!(hit.normal, -Vec3::X);

        let diagonal = Vec3::ONE.normalize();
        let hit = cube.local_ray_intersect(Vec3::splat(-3.0), diagonal).unwrap();
        assert!(approx_eq(hit.point.x, -1.0, 1e-4));

        assert!(cube
            .local_ray_intersect(Vec3::new(-5.0, 1.5, 0.0), Vec3::X)
            .is_none());
        // Starting inside
        assert!(cube.local_ray_intersect(Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn test_support() {
        let cube = Polytope::cuboid(Vec3::ONE).unwrap();
        assert_eq!(cube.support(Vec3::new(1.0, -2.0, 0.5)), Vec3::new(1.0, -1.0, 1.0));
    }

    #[test]
    fn test_random_points_inside() {
        let tet = tetrahedron();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let p = tet.random_point(&mut rng);
            assert!(tet.signed_distance(p) <= 1e-5);
        }
    }
}
