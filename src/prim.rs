//! Scalar and linear-algebra primitives shared by every other module.
//!
//! The scalar type is selectable at build time: `f32` by default, or `f64`
//! with the `double-precision` feature. Every vector/matrix alias below is
//! built on top of `nalgebra` so the core gets real SIMD-friendly types
//! instead of hand-rolled math.

#[cfg(feature = "double-precision")]
pub type Scalar = f64;
#[cfg(not(feature = "double-precision"))]
pub type Scalar = f32;

pub type Vec2 = nalgebra::Vector2<Scalar>;
pub type Vec3 = nalgebra::Vector3<Scalar>;
pub type Vec4 = nalgebra::Vector4<Scalar>;
pub type Mat2 = nalgebra::Matrix2<Scalar>;
pub type Mat4 = nalgebra::Matrix4<Scalar>;

/// Build a homogeneous point (w = 1) from its xyz components.
pub fn point4(x: Scalar, y: Scalar, z: Scalar) -> Vec4 {
    Vec4::new(x, y, z, 1.0)
}

/// Build a homogeneous direction (w = 0) from its xyz components.
pub fn dir4(x: Scalar, y: Scalar, z: Scalar) -> Vec4 {
    Vec4::new(x, y, z, 0.0)
}

/// Drop the w component of a homogeneous vector.
pub fn xyz(v: Vec4) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
