//! The ray-primitive geometry kernel: ray/AABB slab test and ray/triangle
//! intersection in object space.

use crate::aabb::Aabb;
use crate::mesh::MeshInstance;
use crate::prim::{xyz, Mat2, Scalar, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    None,
    Intersected,
    BehindRay,
    InsideVolume,
    Degenerate,
}

#[derive(Debug, Clone, Copy)]
pub struct TraceResult {
    pub kind: IntersectionType,
    pub distance: Scalar,
}

/// Detailed information about a triangle trace. `distance` is an opaque
/// ordering key scoped to `hitobj`: it is measured in that instance's
/// object-space units (spec §4.2, §9) and must never be compared across
/// instances directly — callers compare only within [`crate::bvh::Bvh`]'s own
/// candidate list, which always does so per-instance.
#[derive(Debug, Clone, Copy)]
pub struct TraceInfo<'a> {
    pub kind: IntersectionType,
    pub hitobj: Option<&'a MeshInstance>,
    pub hitpos: Vec4,
    pub hitnorm: Vec4,
    pub barycenter: Vec3,
    pub distance: Scalar,
}

impl<'a> TraceInfo<'a> {
    pub fn miss() -> TraceInfo<'a> {
        TraceInfo {
            kind: IntersectionType::None,
            hitobj: None,
            hitpos: Vec4::zeros(),
            hitnorm: Vec4::zeros(),
            barycenter: Vec3::zeros(),
            distance: Scalar::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec4,
    pub dir: Vec4,
}

impl Ray {
    pub fn new(origin: Vec4, dir: Vec4) -> Ray {
        Ray { origin, dir }
    }

    /// Ray/AABB slab test (spec §4.1).
    pub fn intersect_aabb(&self, volume: &Aabb) -> TraceResult {
        let half = volume.extent() * 0.5;
        let center = volume.center();
        let p = center - xyz(self.origin);

        let mut tmin = Scalar::NEG_INFINITY;
        let mut tmax = Scalar::INFINITY;

        for c in 0..3 {
            let f = self.dir[c];
            if f.abs() > 0.0 {
                let inv_f = 1.0 / f;
                let mut t1 = (p[c] + half[c]) * inv_f;
                let mut t2 = (p[c] - half[c]) * inv_f;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                tmin = tmin.max(t1);
                tmax = tmax.min(t2);
                if tmin > tmax {
                    return TraceResult {
                        kind: IntersectionType::None,
                        distance: Scalar::NEG_INFINITY,
                    };
                }
                if tmax < 0.0 {
                    return TraceResult {
                        kind: IntersectionType::BehindRay,
                        distance: Scalar::NEG_INFINITY,
                    };
                }
            } else if -p[c] - half[c] > 0.0 || -p[c] + half[c] < 0.0 {
                return TraceResult {
                    kind: IntersectionType::None,
                    distance: Scalar::NEG_INFINITY,
                };
            }
        }

        if tmin > 0.0 {
            TraceResult {
                kind: IntersectionType::Intersected,
                distance: tmin,
            }
        } else {
            TraceResult {
                kind: IntersectionType::InsideVolume,
                distance: 0.0,
            }
        }
    }

    /// Ray/triangle intersection against every face of `inst`'s mesh, in
    /// object space (spec §4.2). Returns the closest accepted hit.
    pub fn intersect_mesh_instance<'a>(&self, inst: &'a MeshInstance) -> TraceInfo<'a> {
        const EPS: Scalar = 5e-5;

        let ro = inst.inv_xform * self.origin;
        let rd = inst.inv_xform * self.dir;

        let mut best = TraceInfo::miss();

        for tri in inst.mesh.triangles() {
            let v0 = tri.p0();
            let v1 = tri.p1();
            let v2 = tri.p2();
            let n = tri.plane_normal();

            let plane = Vec4::new(n.x, n.y, n.z, -xyz(n).dot(&xyz(v0)));
            let denom = plane.dot(&rd);
            let t = -plane.dot(&ro) / denom;
            if t < 0.0 || t > best.distance {
                continue;
            }

            let p = ro + rd * t;
            let r = p - v0;
            let q1 = v1 - v0;
            let q2 = v2 - v0;

            let q1q1 = q1.dot(&q1);
            let q2q2 = q2.dot(&q2);
            let q1q2 = q1.dot(&q2);
            let det = q1q1 * q2q2 - q1q2 * q1q2;

            let m_inv = Mat2::new(q2q2, -q1q2, -q1q2, q1q1) * (1.0 / det);
            let rq = nalgebra::Vector2::new(r.dot(&q1), r.dot(&q2));
            let w = m_inv * rq;
            let (w1, w2) = (w.x, w.y);

            if w1 >= -EPS && w2 >= -EPS && w1 + w2 <= 1.0 + EPS {
                let barycenter = Vec3::new(1.0 - w1 - w2, w1, w2);
                best = TraceInfo {
                    kind: IntersectionType::Intersected,
                    hitobj: Some(inst),
                    hitpos: p,
                    hitnorm: tri.surface_normal(barycenter),
                    barycenter,
                    distance: t,
                };
            }
        }

        if best.hitobj.is_some() {
            best.hitpos = inst.xform * best.hitpos;
            best.hitnorm = (inst.xform * best.hitnorm).normalize();
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Mesh};
    use crate::prim::{dir4, point4, Mat4};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn forward_triangle() -> MeshInstance {
        let mesh = Mesh::new(
            "tri".to_string(),
            vec![
                point4(-1.0, -1.0, 0.0),
                point4(1.0, -1.0, 0.0),
                point4(0.0, 1.0, 0.0),
            ],
            vec![],
            vec![],
            vec![Face { i0: 0, i1: 1, i2: 2 }],
        )
        .unwrap();
        MeshInstance::new(Arc::new(mesh), Mat4::identity())
    }

    #[test]
    fn inside_volume_reports_zero_distance() {
        let aabb = Aabb::from_points([Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)]);
        let ray = Ray::new(point4(0.0, 0.0, 0.0), dir4(0.0, 0.0, 1.0));
        let result = ray.intersect_aabb(&aabb);
        assert_eq!(result.kind, IntersectionType::InsideVolume);
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn outside_ray_misses_aabb_behind_it() {
        let aabb = Aabb::from_points([Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)]);
        let ray = Ray::new(point4(0.0, 0.0, -5.0), dir4(0.0, 0.0, -1.0));
        let result = ray.intersect_aabb(&aabb);
        assert_eq!(result.kind, IntersectionType::BehindRay);
    }

    #[test]
    fn triangle_hit_barycenter_sums_to_one() {
        let inst = forward_triangle();
        let ray = Ray::new(point4(0.0, 0.0, -2.0), dir4(0.0, 0.0, 1.0));
        let info = ray.intersect_mesh_instance(&inst);
        assert_eq!(info.kind, IntersectionType::Intersected);
        let sum = info.barycenter.x + info.barycenter.y + info.barycenter.z;
        assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn triangle_miss_returns_none_and_infinite_distance() {
        let inst = forward_triangle();
        let ray = Ray::new(point4(5.0, 5.0, -2.0), dir4(0.0, 0.0, 1.0));
        let info = ray.intersect_mesh_instance(&inst);
        assert_eq!(info.kind, IntersectionType::None);
        assert!(info.distance.is_infinite());
    }

    #[test]
    fn backface_is_still_accepted_current_behavior() {
        // Reversed winding from `forward_triangle`; spec §9 documents that
        // backface culling is intentionally not applied.
        let mesh = Mesh::new(
            "tri".to_string(),
            vec![
                point4(-1.0, -1.0, 0.0),
                point4(0.0, 1.0, 0.0),
                point4(1.0, -1.0, 0.0),
            ],
            vec![],
            vec![],
            vec![Face { i0: 0, i1: 1, i2: 2 }],
        )
        .unwrap();
        let inst = MeshInstance::new(Arc::new(mesh), Mat4::identity());
        let ray = Ray::new(point4(0.0, 0.0, -2.0), dir4(0.0, 0.0, 1.0));
        let info = ray.intersect_mesh_instance(&inst);
        assert_eq!(info.kind, IntersectionType::Intersected);
        assert!(xyz(info.hitnorm).dot(&xyz(ray.dir)) > 0.0);
    }
}
