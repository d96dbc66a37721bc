//! Lights: a small closed set, so a tagged variant is preferred over dynamic
//! dispatch (spec §9) — a branch on a tag, exhaustiveness-checked, data held
//! by value.

use crate::prim::{Scalar, Vec3, Vec4};

#[derive(Debug, Clone, Copy)]
pub enum Light {
    Directional {
        color: Vec3,
        intensity: Scalar,
        /// Unit direction the light travels, w = 0.
        dir: Vec4,
    },
    Point {
        color: Vec3,
        intensity: Scalar,
        /// w = 1.
        pos: Vec4,
    },
}

/// Incoming light direction `l` (unit, pointing toward the light) and
/// irradiance `E_l` at `hitpos`, per spec §4.7.
pub struct Incidence {
    pub l: Vec4,
    pub irradiance: Vec3,
}

impl Light {
    pub fn incidence_at(&self, hitpos: Vec4) -> Incidence {
        match *self {
            Light::Directional {
                color,
                intensity,
                dir,
            } => Incidence {
                l: -dir,
                irradiance: color * intensity,
            },
            Light::Point {
                color,
                intensity,
                pos,
            } => {
                let delta = pos - hitpos;
                let r2 = delta.dot(&delta);
                let l = delta / delta.magnitude();
                Incidence {
                    l,
                    irradiance: color * (intensity / r2),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{dir4, point4};
    use approx::assert_relative_eq;

    #[test]
    fn directional_incidence_opposes_travel_direction() {
        let light = Light::Directional {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            dir: dir4(0.0, 0.0, -1.0),
        };
        let incidence = light.incidence_at(point4(0.0, 0.0, 0.0));
        assert_relative_eq!(incidence.l.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(incidence.irradiance.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn point_incidence_falls_off_with_squared_distance() {
        let light = Light::Point {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 4.0,
            pos: point4(0.0, 0.0, 2.0),
        };
        let incidence = light.incidence_at(point4(0.0, 0.0, 0.0));
        // distance 2, r^2 = 4, irradiance = 4/4 = 1
        assert_relative_eq!(incidence.irradiance.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(incidence.l.z, 1.0, epsilon = 1e-6);
    }
}
