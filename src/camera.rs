//! The camera: maps a screen position in `[-1, 1]^2` to a world-space ray.

use crate::prim::{Mat4, Scalar, Vec2};
use crate::ray::Ray;

/// `xform` is camera-to-world. `fov` is vertical, in radians. `aspect` is
/// width/height. `is_fov_horizontal` tracks whether the originating source
/// (an imported camera) specified FOV horizontally, which changes how
/// `set_aspect` keeps it constant (spec §4.5).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub xform: Mat4,
    pub fov: Scalar,
    pub aspect: Scalar,
    pub is_fov_horizontal: bool,
}

impl Camera {
    pub fn new(xform: Mat4, fov: Scalar, aspect: Scalar) -> Camera {
        Camera {
            xform,
            fov,
            aspect,
            is_fov_horizontal: false,
        }
    }

    /// Overwrite the vertical FOV directly; clears `is_fov_horizontal` since
    /// the caller now owns the vertical value explicitly.
    pub fn set_fov(&mut self, fov: Scalar) {
        self.fov = fov;
        self.is_fov_horizontal = false;
    }

    /// Change the aspect ratio. If this camera's FOV originated as a
    /// horizontal value, the stored vertical FOV is adjusted to keep the
    /// horizontal FOV constant; otherwise the vertical FOV is left alone.
    pub fn set_aspect(&mut self, aspect: Scalar) {
        if self.is_fov_horizontal {
            let h_fov = self.fov * self.aspect;
            self.fov = h_fov / aspect;
        }
        self.aspect = aspect;
    }

    /// Compute the view ray through screen position `pos ∈ [-1, 1]^2`, with
    /// `(-1, -1)` top-left and `(1, 1)` bottom-right (spec §4.5).
    pub fn compute_ray(&self, pos: Vec2) -> Ray {
        let tan_half_fov = (self.fov * 0.5).tan();
        let x = tan_half_fov * self.aspect * pos.x;
        let y = tan_half_fov * pos.y;
        let dir = (self.xform * crate::prim::dir4(x, y, -1.0)).normalize();
        let origin = self.xform * crate::prim::point4(0.0, 0.0, 0.0);
        Ray::new(origin, dir)
    }
}
