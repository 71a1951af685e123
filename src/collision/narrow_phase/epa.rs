use crate::math::Vec3;

use super::gjk::{minkowski_support, Placed, Simplex, SupportPoint};

/// Maximum iterations for EPA algorithm
const EPA_MAX_ITERATIONS: usize = 64;

/// Tolerance for EPA convergence
const EPA_TOLERANCE: f32 = 1e-4;

/// Maximum number of faces in the polytope
const EPA_MAX_FACES: usize = 128;

/// Smallest usable face area (doubled) and tetrahedron volume
const DEGENERATE: f32 = 1e-10;

/// Penetration of two overlapping cores
#[derive(Debug, Clone, Copy)]
pub struct EpaResult {
    /// Unit normal pointing from A towards B
    pub normal: Vec3,
    /// Penetration depth of the cores
    pub depth: f32,
    /// Deepest core point of A, world space
    pub point_a: Vec3,
    /// Deepest core point of B, world space
    pub point_b: Vec3,
}

/// A face of the polytope
#[derive(Debug, Clone, Copy)]
struct Face {
    indices: [usize; 3],
    /// Outward unit normal
    normal: Vec3,
    /// Distance from origin to the face plane
    distance: f32,
}

/// Expands the GJK simplex into the face of A - B nearest the origin.
///
/// Returns `None` when the Minkowski difference is flat and no enclosing
/// tetrahedron can be built.
pub fn epa(simplex: &Simplex, a: &Placed<'_>, b: &Placed<'_>) -> Option<EpaResult> {
    let mut vertices: Vec<SupportPoint> = simplex.points().to_vec();
    if !blow_up(&mut vertices, a, b) {
        return None;
    }

    let interior = vertices
        .iter()
        .fold(Vec3::ZERO, |acc, v| acc + v.point)
        * 0.25;

    let mut faces: Vec<Face> = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]]
        .into_iter()
        .filter_map(|indices| create_face(&vertices, indices, interior))
        .collect();

    for _ in 0..EPA_MAX_ITERATIONS {
        let closest = *closest_face(&faces)?;

        let support = minkowski_support(a, b, closest.normal);
        let distance = support.point.dot(closest.normal);
        if distance - closest.distance < EPA_TOLERANCE {
            return Some(compute_contact(&vertices, &closest));
        }

        let new_index = vertices.len();
        vertices.push(support);

        // Remove every face the new point can see, keeping the horizon
        let mut horizon: Vec<(usize, usize)> = Vec::new();
        faces.retain(|face| {
            let on_face = vertices[face.indices[0]].point;
            if face.normal.dot(support.point - on_face) <= 0.0 {
                return true;
            }
            for j in 0..3 {
                add_or_remove_edge(&mut horizon, (face.indices[j], face.indices[(j + 1) % 3]));
            }
            false
        });

        for (i, j) in horizon {
            if let Some(face) = create_face(&vertices, [i, j, new_index], interior) {
                faces.push(face);
            }
        }

        if faces.len() > EPA_MAX_FACES {
            break;
        }
    }

    closest_face(&faces).map(|face| compute_contact(&vertices, face))
}

/// Grows a 1-3 point simplex into a tetrahedron with volume
fn blow_up(vertices: &mut Vec<SupportPoint>, a: &Placed<'_>, b: &Placed<'_>) -> bool {
    const AXES: [Vec3; 6] = [
        Vec3::X,
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::Y,
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::Z,
        Vec3::new(0.0, 0.0, -1.0),
    ];

    if vertices.is_empty() {
        vertices.push(minkowski_support(a, b, Vec3::X));
    }

    if vertices.len() == 1 {
        let origin = vertices[0].point;
        let found = AXES.iter().find_map(|&dir| {
            let s = minkowski_support(a, b, dir);
            ((s.point - origin).length_squared() > DEGENERATE).then_some(s)
        });
        match found {
            Some(s) => vertices.push(s),
            None => return false,
        }
    }

    if vertices.len() == 2 {
        let p0 = vertices[0].point;
        let line = (vertices[1].point - p0).normalize();
        let found = AXES.iter().find_map(|&axis| {
            let dir = line.cross(axis);
            if dir.is_near_zero(1e-3) {
                return None;
            }
            let s = minkowski_support(a, b, dir);
            let off_line = (s.point - p0) - line * (s.point - p0).dot(line);
            (off_line.length_squared() > DEGENERATE).then_some(s)
        });
        match found {
            Some(s) => vertices.push(s),
            None => return false,
        }
    }

    if vertices.len() == 3 {
        let p0 = vertices[0].point;
        let normal = (vertices[1].point - p0).cross(vertices[2].point - p0);
        if normal.length_squared() < DEGENERATE {
            return false;
        }
        let found = [normal, -normal].into_iter().find_map(|dir| {
            let s = minkowski_support(a, b, dir);
            ((s.point - p0).dot(normal).abs() > DEGENERATE.sqrt()).then_some(s)
        });
        match found {
            Some(s) => vertices.push(s),
            None => return false,
        }
    }

    let [p0, p1, p2, p3] = [
        vertices[0].point,
        vertices[1].point,
        vertices[2].point,
        vertices[3].point,
    ];
    (p1 - p0).dot((p2 - p0).cross(p3 - p0)).abs() > DEGENERATE
}

/// Builds a face wound so its normal points away from `interior`
fn create_face(vertices: &[SupportPoint], mut indices: [usize; 3], interior: Vec3) -> Option<Face> {
    let a = vertices[indices[0]].point;
    let b = vertices[indices[1]].point;
    let c = vertices[indices[2]].point;

    let mut normal = (b - a).cross(c - a).try_normalize()?;
    if normal.dot(a - interior) < 0.0 {
        normal = -normal;
        indices.swap(0, 1);
    }

    Some(Face {
        indices,
        normal,
        distance: normal.dot(a),
    })
}

fn closest_face(faces: &[Face]) -> Option<&Face> {
    faces
        .iter()
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
}

/// Adds an edge to the list, or removes it if it already exists (shared edge)
fn add_or_remove_edge(edges: &mut Vec<(usize, usize)>, edge: (usize, usize)) {
    let reverse = (edge.1, edge.0);

    if let Some(pos) = edges.iter().position(|e| *e == reverse || *e == edge) {
        edges.swap_remove(pos);
    } else {
        edges.push(edge);
    }
}

fn compute_contact(vertices: &[SupportPoint], face: &Face) -> EpaResult {
    let [i, j, k] = face.indices;
    let (va, vb, vc) = (vertices[i], vertices[j], vertices[k]);

    // Origin projected onto the face
    let bary = barycentric(face.normal * face.distance, va.point, vb.point, vc.point);

    EpaResult {
        normal: face.normal,
        depth: face.distance.max(0.0),
        point_a: va.a * bary.x + vb.a * bary.y + vc.a * bary.z,
        point_b: va.b * bary.x + vb.b * bary.y + vc.b * bary.z,
    }
}

/// Barycentric coordinates of `p` in triangle `abc`
fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < DEGENERATE {
        return Vec3::splat(1.0 / 3.0);
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - v - w, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::narrow_phase::gjk::{gjk, GjkResult};
    use crate::geometry::Shape;
    use crate::math::{approx_eq, Transform};

    fn penetration(shape_a: &Shape, ta: Transform, shape_b: &Shape, tb: Transform) -> EpaResult {
        let a = Placed::new(shape_a, &ta);
        let b = Placed::new(shape_b, &tb);
        match gjk(&a, &b) {
            GjkResult::Overlapping(simplex) => epa(&simplex, &a, &b).expect("epa result"),
            GjkResult::Separated { .. } => panic!("expected overlap"),
        }
    }

    #[test]
    fn test_box_box_penetration() {
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let result = penetration(
            &cube,
            Transform::IDENTITY,
            &cube,
            Transform::from_position(Vec3::new(1.5, 0.1, 0.0)),
        );

        assert!(approx_eq(result.depth, 0.5, 1e-3));
        assert!(approx_eq(result.normal.x, 1.0, 1e-3));
        assert!(approx_eq(result.point_a.x, 1.0, 1e-3));
        assert!(approx_eq(result.point_b.x, 0.5, 1e-3));
    }

    #[test]
    fn test_deep_vertical_overlap() {
        let wide = Shape::cuboid(Vec3::new(4.0, 1.0, 4.0)).unwrap();
        let small = Shape::cuboid(Vec3::splat(0.5)).unwrap();
        let result = penetration(
            &wide,
            Transform::IDENTITY,
            &small,
            Transform::from_position(Vec3::new(0.3, 1.2, -0.2)),
        );

        assert!(approx_eq(result.depth, 0.3, 1e-3));
        assert!(approx_eq(result.normal.y, 1.0, 1e-3));
    }

    #[test]
    fn test_horizon_edges() {
        let mut edges = Vec::new();
        add_or_remove_edge(&mut edges, (0, 1));
        add_or_remove_edge(&mut edges, (1, 2));
        add_or_remove_edge(&mut edges, (1, 0));
        assert_eq!(edges, vec![(1, 2)]);
    }
}
