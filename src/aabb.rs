//! Axis-aligned bounding boxes.

use std::ops::Add;

use crate::prim::{point4, Mat4, Scalar, Vec3};

/// `{ min, max }` with `min[c] <= max[c]` for every axis, or the empty
/// sentinel (`min = +inf`, `max = -inf`), which combines additively with
/// any other AABB without special-casing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty sentinel: combines with any AABB to yield that AABB.
    pub fn empty() -> Self {
        Aabb {
            min: Vec3::from_element(Scalar::INFINITY),
            max: Vec3::from_element(Scalar::NEG_INFINITY),
        }
    }

    /// The tight AABB enclosing every point given.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Aabb::empty(), |acc, p| acc.union_point(p))
    }

    pub fn union_point(&self, p: Vec3) -> Self {
        Aabb {
            min: self.min.zip_map(&p, Scalar::min),
            max: self.max.zip_map(&p, Scalar::max),
        }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Aabb {
            min: self.min.zip_map(&other.min, Scalar::min),
            max: self.max.zip_map(&other.max, Scalar::max),
        }
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.max + self.min) * 0.5
    }

    /// The 8 corners of the box, in no particular winding order.
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::zeros(); 8];
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let x = if i == 0 { self.min.x } else { self.max.x };
                    let y = if j == 0 { self.min.y } else { self.max.y };
                    let z = if k == 0 { self.min.z } else { self.max.z };
                    out[i * 4 + j * 2 + k] = Vec3::new(x, y, z);
                }
            }
        }
        out
    }

    /// Transform this (object-space) AABB by `xform`, producing the tight
    /// world-space AABB around the resulting oriented bounding box.
    pub fn transform(&self, xform: &Mat4) -> Aabb {
        let corners = self
            .corners()
            .map(|c| crate::prim::xyz(xform * point4(c.x, c.y, c.z)));
        Aabb::from_points(corners)
    }

    /// Index `0` returns `min`, index `1` returns `max` — mirrors the
    /// original `aabb::operator[]`.
    pub fn axis_bound(&self, i: usize) -> &Vec3 {
        if i == 0 {
            &self.min
        } else {
            &self.max
        }
    }
}

impl Add for Aabb {
    type Output = Aabb;

    fn add(self, rhs: Aabb) -> Aabb {
        self.union(&rhs)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::empty()
    }
}
