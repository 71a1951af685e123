mod mat3;
mod mat4;
mod quat;
mod transform;
mod vec3;

pub use mat3::Mat3;
pub use mat4::Mat4;
pub use quat::Quat;
pub use transform::Transform;
pub use vec3::Vec3;

/// Tolerance shared by the geometric queries.
///
/// Roots, denominators and plane comparisons below this magnitude are
/// treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Returns true if two floats are within `epsilon` of each other
#[inline]
pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}
