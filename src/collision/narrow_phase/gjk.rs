use crate::geometry::Shape;
use crate::math::{Transform, Vec3};

/// Maximum iterations for GJK algorithm
const GJK_MAX_ITERATIONS: usize = 64;

/// Relative tolerance for GJK convergence
const GJK_TOLERANCE: f32 = 1e-6;

/// Squared distance below which the cores count as overlapping
const OVERLAP_DISTANCE_SQ: f32 = 1e-10;

/// A shape at a world placement. Supports are taken on the core, rounding
/// excluded.
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub shape: &'a Shape,
    pub transform: &'a Transform,
}

impl<'a> Placed<'a> {
    pub fn new(shape: &'a Shape, transform: &'a Transform) -> Self {
        Self { shape, transform }
    }

    /// World-space support point of the core
    pub fn support(&self, direction: Vec3) -> Vec3 {
        let local_dir = self.transform.inverse_transform_vector(direction);
        self.transform
            .transform_point(self.shape.support(local_dir))
    }
}

/// A point of the Minkowski difference A - B with the points it came from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SupportPoint {
    pub point: Vec3,
    pub a: Vec3,
    pub b: Vec3,
}

/// Support point of A - B in `direction`
pub fn minkowski_support(a: &Placed<'_>, b: &Placed<'_>, direction: Vec3) -> SupportPoint {
    let sa = a.support(direction);
    let sb = b.support(-direction);
    SupportPoint {
        point: sa - sb,
        a: sa,
        b: sb,
    }
}

/// Up to four support points
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {
    pub fn from_slice(points: &[SupportPoint]) -> Self {
        let mut simplex = Self::default();
        for &p in points {
            simplex.push(p);
        }
        simplex
    }

    pub fn push(&mut self, point: SupportPoint) {
        debug_assert!(self.len < 4);
        self.points[self.len] = point;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn points(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }

    fn contains_point(&self, p: Vec3) -> bool {
        self.points()
            .iter()
            .any(|s| (s.point - p).length_squared() < OVERLAP_DISTANCE_SQ)
    }
}

/// Result of a GJK query on the cores of two shapes
#[derive(Debug, Clone)]
pub enum GjkResult {
    /// Cores overlap; the simplex seeds EPA
    Overlapping(Simplex),
    /// Cores are apart, with the closest point on each
    Separated {
        closest_a: Vec3,
        closest_b: Vec3,
        distance: f32,
    },
}

impl GjkResult {
    pub fn is_overlapping(&self) -> bool {
        matches!(self, GjkResult::Overlapping(_))
    }
}

/// Distance between the cores of `a` and `b`.
pub fn gjk(a: &Placed<'_>, b: &Placed<'_>) -> GjkResult {
    let mut direction = b.transform.position - a.transform.position;
    if direction.is_near_zero(GJK_TOLERANCE) {
        direction = Vec3::X;
    }

    let first = minkowski_support(a, b, -direction);
    let mut simplex = Simplex::from_slice(&[first]);
    let mut weights = [1.0, 0.0, 0.0, 0.0];
    let mut v = first.point;

    for _ in 0..GJK_MAX_ITERATIONS {
        let dist_sq = v.length_squared();
        if dist_sq < OVERLAP_DISTANCE_SQ {
            return GjkResult::Overlapping(simplex);
        }

        let w = minkowski_support(a, b, -v);
        // No support point gets meaningfully closer to the origin
        if dist_sq - v.dot(w.point) <= GJK_TOLERANCE * dist_sq || simplex.contains_point(w.point)
        {
            break;
        }

        simplex.push(w);
        let (reduced, reduced_weights) = closest_to_origin(&simplex);
        if reduced.len() == 4 {
            return GjkResult::Overlapping(reduced);
        }

        let next_v = combine(&reduced, &reduced_weights, |s| s.point);
        if next_v.length_squared() >= dist_sq {
            break;
        }
        simplex = reduced;
        weights = reduced_weights;
        v = next_v;
    }

    let closest_a = combine(&simplex, &weights, |s| s.a);
    let closest_b = combine(&simplex, &weights, |s| s.b);
    GjkResult::Separated {
        closest_a,
        closest_b,
        distance: v.length(),
    }
}

fn combine(simplex: &Simplex, weights: &[f32; 4], pick: impl Fn(&SupportPoint) -> Vec3) -> Vec3 {
    simplex
        .points()
        .iter()
        .zip(weights)
        .fold(Vec3::ZERO, |acc, (s, &w)| acc + pick(s) * w)
}

/// Smallest sub-simplex containing the point closest to the origin, with
/// the barycentric weights of that point.
fn closest_to_origin(simplex: &Simplex) -> (Simplex, [f32; 4]) {
    match simplex.points() {
        [a] => (Simplex::from_slice(&[*a]), [1.0, 0.0, 0.0, 0.0]),
        [a, b] => closest_on_segment(*a, *b),
        [a, b, c] => closest_on_triangle(*a, *b, *c),
        [a, b, c, d] => closest_on_tetrahedron(*a, *b, *c, *d),
        _ => (*simplex, [0.0; 4]),
    }
}

fn closest_on_segment(a: SupportPoint, b: SupportPoint) -> (Simplex, [f32; 4]) {
    let ab = b.point - a.point;
    let len_sq = ab.length_squared();
    if len_sq < OVERLAP_DISTANCE_SQ {
        return (Simplex::from_slice(&[a]), [1.0, 0.0, 0.0, 0.0]);
    }

    let t = (-a.point).dot(ab) / len_sq;
    if t <= 0.0 {
        (Simplex::from_slice(&[a]), [1.0, 0.0, 0.0, 0.0])
    } else if t >= 1.0 {
        (Simplex::from_slice(&[b]), [1.0, 0.0, 0.0, 0.0])
    } else {
        (Simplex::from_slice(&[a, b]), [1.0 - t, t, 0.0, 0.0])
    }
}

/// Voronoi-region walk over vertices, edges and the face of a triangle
fn closest_on_triangle(a: SupportPoint, b: SupportPoint, c: SupportPoint) -> (Simplex, [f32; 4]) {
    let ab = b.point - a.point;
    let ac = c.point - a.point;

    let ap = -a.point;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (Simplex::from_slice(&[a]), [1.0, 0.0, 0.0, 0.0]);
    }

    let bp = -b.point;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (Simplex::from_slice(&[b]), [1.0, 0.0, 0.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return (Simplex::from_slice(&[a, b]), [1.0 - t, t, 0.0, 0.0]);
    }

    let cp = -c.point;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (Simplex::from_slice(&[c]), [1.0, 0.0, 0.0, 0.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return (Simplex::from_slice(&[a, c]), [1.0 - t, t, 0.0, 0.0]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && d4 - d3 >= 0.0 && d5 - d6 >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (Simplex::from_slice(&[b, c]), [1.0 - t, t, 0.0, 0.0]);
    }

    let sum = va + vb + vc;
    if sum.abs() < f32::EPSILON {
        // Collinear: the answer lies on one of the edges
        return [
            closest_on_segment(a, b),
            closest_on_segment(a, c),
            closest_on_segment(b, c),
        ]
        .into_iter()
        .min_by(|x, y| distance_sq(x).total_cmp(&distance_sq(y)))
        .unwrap_or_else(|| (Simplex::from_slice(&[a]), [1.0, 0.0, 0.0, 0.0]));
    }

    let v = vb / sum;
    let w = vc / sum;
    (Simplex::from_slice(&[a, b, c]), [1.0 - v - w, v, w, 0.0])
}

fn closest_on_tetrahedron(
    a: SupportPoint,
    b: SupportPoint,
    c: SupportPoint,
    d: SupportPoint,
) -> (Simplex, [f32; 4]) {
    // Each face with the vertex opposite it
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];

    let volume = (b.point - a.point).dot((c.point - a.point).cross(d.point - a.point));
    let degenerate = volume.abs() < OVERLAP_DISTANCE_SQ;

    let mut best: Option<(Simplex, [f32; 4])> = None;
    let mut best_dist = f32::INFINITY;
    for (p, q, r, opposite) in faces {
        let normal = (q.point - p.point).cross(r.point - p.point);
        let origin_side = normal.dot(-p.point);
        let opposite_side = normal.dot(opposite.point - p.point);
        let outside = degenerate || origin_side * opposite_side < 0.0;
        if !outside {
            continue;
        }

        let candidate = closest_on_triangle(p, q, r);
        let dist = distance_sq(&candidate);
        if dist < best_dist {
            best_dist = dist;
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(|| {
        // Origin inside: keep the whole tetrahedron
        (Simplex::from_slice(&[a, b, c, d]), [0.25; 4])
    })
}

fn distance_sq(result: &(Simplex, [f32; 4])) -> f32 {
    combine(&result.0, &result.1, |s| s.point).length_squared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Quat};

    fn separated(result: GjkResult) -> (Vec3, Vec3, f32) {
        match result {
            GjkResult::Separated {
                closest_a,
                closest_b,
                distance,
            } => (closest_a, closest_b, distance),
            GjkResult::Overlapping(_) => panic!("expected separation"),
        }
    }

    #[test]
    fn test_box_box_distance() {
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let t1 = Transform::IDENTITY;
        let t2 = Transform::from_position(Vec3::new(3.5, 0.2, -0.1));

        let (closest_a, closest_b, distance) =
            separated(gjk(&Placed::new(&cube, &t1), &Placed::new(&cube, &t2)));
        assert!(approx_eq(distance, 1.5, 1e-4));
        assert!(approx_eq(closest_a.x, 1.0, 1e-4));
        assert!(approx_eq(closest_b.x, 2.5, 1e-4));
    }

    #[test]
    fn test_point_core_to_box() {
        // A sphere's core is its center
        let sphere = Shape::sphere(0.5).unwrap();
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let ts = Transform::from_position(Vec3::new(3.0, 3.0, 0.0));
        let tb = Transform::IDENTITY;

        let (closest_a, closest_b, distance) =
            separated(gjk(&Placed::new(&sphere, &ts), &Placed::new(&cube, &tb)));
        assert!(approx_eq(distance, 8.0f32.sqrt(), 1e-4));
        assert!(closest_a.distance(Vec3::new(3.0, 3.0, 0.0)) < 1e-4);
        assert!(closest_b.distance(Vec3::new(1.0, 1.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_rotated_boxes_overlap() {
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let t1 = Transform::IDENTITY;
        let t2 = Transform::new(
            Vec3::new(2.2, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
        );
        // The rotated corner reaches x = 2.2 - sqrt(2) < 1
        assert!(gjk(&Placed::new(&cube, &t1), &Placed::new(&cube, &t2)).is_overlapping());
    }

    #[test]
    fn test_concentric_overlap() {
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let t = Transform::IDENTITY;
        assert!(gjk(&Placed::new(&cube, &t), &Placed::new(&cube, &t)).is_overlapping());
    }

    #[test]
    fn test_triangle_face_region() {
        let p = |x: f32, y: f32, z: f32| SupportPoint {
            point: Vec3::new(x, y, z),
            ..Default::default()
        };
        let (simplex, weights) =
            closest_on_triangle(p(-1.0, -1.0, 1.0), p(2.0, -1.0, 1.0), p(-1.0, 2.0, 1.0));
        assert_eq!(simplex.len(), 3);
        let closest = combine(&simplex, &weights, |s| s.point);
        assert!(closest.distance(Vec3::Z) < 1e-5);
    }
}
