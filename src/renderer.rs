//! The tiled parallel renderer: static row-stripe partitioning, MSAA,
//! Lambertian shading, sRGB encoding (spec §4.6/§4.7, §5).

use bitflags::bitflags;
use indicatif::{ProgressBar, ProgressStyle};

use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::lights::Light;
use crate::prim::{Scalar, Vec2, Vec3};
use crate::ray::{IntersectionType, Ray, TraceInfo};

bitflags! {
    /// Debug coloring modes. Both bypass physical shading and sRGB encoding
    /// (spec §4.7).
    #[derive(Default)]
    pub struct DebugFlags: u8 {
        const NORMAL_COLORING = 1 << 0;
        const INTERP_COLORING = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub width: u16,
    pub height: u16,
    pub debug_flags: DebugFlags,
    pub msaa: bool,
    pub max_recursion: usize,
    pub concurrency: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            width: 640,
            height: 480,
            debug_flags: DebugFlags::empty(),
            msaa: false,
            max_recursion: 1,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Row-major `width * height` pixels, top-to-bottom.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<Rgb8>,
}

/// Owns the scene's acceleration structure and lights; read-only during
/// rendering so it can be shared immutably across worker threads.
pub struct Renderer {
    pub bvh: Bvh,
    pub lights: Vec<Light>,
}

impl Renderer {
    pub fn new(bvh: Bvh, lights: Vec<Light>) -> Renderer {
        Renderer { bvh, lights }
    }

    /// Render the full image. Partitions into `opts.concurrency` horizontal
    /// stripes, one worker thread per stripe, joins, and concatenates in
    /// stripe order — deterministic regardless of concurrency (spec §5).
    pub fn render(&self, cam: &Camera, opts: &RenderOptions) -> Framebuffer {
        let concurrency = opts.concurrency.max(1);
        let base_height = opts.height as usize / concurrency;

        let mut stripe_heights = Vec::with_capacity(concurrency);
        let mut consumed = 0usize;
        for t in 0..concurrency {
            let h = if t == concurrency - 1 {
                opts.height as usize - consumed
            } else {
                base_height
            };
            stripe_heights.push(h);
            consumed += h;
        }

        let progress = ProgressBar::new(opts.width as u64 * opts.height as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} pixels")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut pixels = Vec::with_capacity(opts.width as usize * opts.height as usize);
        let mut y = 0u16;
        let stripes: Vec<(u16, u16)> = stripe_heights
            .into_iter()
            .map(|h| {
                let start = y;
                y += h as u16;
                (start, h as u16)
            })
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = stripes
                .iter()
                .map(|&(start_y, height)| {
                    let progress = &progress;
                    scope.spawn(move || self.render_range(cam, opts, 0, start_y, opts.width, height, progress))
                })
                .collect();

            for handle in handles {
                pixels.extend(handle.join().expect("render worker thread panicked"));
            }
        });

        progress.finish_and_clear();

        Framebuffer {
            width: opts.width,
            height: opts.height,
            pixels,
        }
    }

    /// Render one horizontal stripe starting at `(x, y)` with the given
    /// `width`/`height` (spec §4.6).
    fn render_range(
        &self,
        cam: &Camera,
        opts: &RenderOptions,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        progress: &ProgressBar,
    ) -> Vec<Rgb8> {
        let mut out = Vec::with_capacity(width as usize * height as usize);
        let msfactor: u32 = if opts.msaa { 2 } else { 1 };
        let samples = msfactor * msfactor;

        for py in y..(y + height) {
            for px in x..(x + width) {
                let mut color = Vec3::zeros();
                for s in 0..samples {
                    let sx = (s % msfactor) as Scalar;
                    let sy = (s / msfactor) as Scalar;
                    let u = 2.0 * (px as Scalar * msfactor as Scalar + sx)
                        / (opts.width as Scalar * msfactor as Scalar)
                        - 1.0;
                    let v = 1.0
                        - 2.0 * (py as Scalar * msfactor as Scalar + sy)
                            / (opts.height as Scalar * msfactor as Scalar);
                    let ray = cam.compute_ray(Vec2::new(u, v));
                    let info = self.bvh.trace_ray(&ray);
                    let sample = shade(&info, &ray, opts, &self.lights);
                    color += clamp01(sample);
                }
                color /= samples as Scalar;

                let encoded = if opts.debug_flags.is_empty() {
                    linear_to_srgb(color)
                } else {
                    color
                };
                out.push(Rgb8 {
                    r: quantize(encoded.x),
                    g: quantize(encoded.y),
                    b: quantize(encoded.z),
                });
            }
            progress.inc(width as u64);
        }
        out
    }
}

/// Shade a hit per spec §4.7: debug coloring modes bypass the physical path;
/// otherwise accumulate Lambertian contribution from every light. Miss is
/// black. `max_recursion == 0` also forces black (reserved for future
/// recursive bounces; never triggered by the direct-lighting-only path
/// today).
fn shade(info: &TraceInfo, ray: &Ray, opts: &RenderOptions, lights: &[Light]) -> Vec3 {
    if opts.max_recursion == 0 || info.kind != IntersectionType::Intersected {
        return Vec3::zeros();
    }

    if opts.debug_flags.contains(DebugFlags::NORMAL_COLORING) {
        return (crate::prim::xyz(info.hitnorm) + Vec3::new(1.0, 1.0, 1.0)) * 0.5;
    }
    if opts.debug_flags.contains(DebugFlags::INTERP_COLORING) {
        return info.barycenter;
    }

    let _ = ray; // view direction is unused by the Lambertian-only path today
    let n = crate::prim::xyz(info.hitnorm);
    let albedo = Vec3::new(1.0, 1.0, 1.0);
    let one_over_pi = std::f64::consts::FRAC_1_PI as Scalar;

    let mut color = Vec3::zeros();
    for light in lights {
        let incidence = light.incidence_at(info.hitpos);
        let l = crate::prim::xyz(incidence.l);
        let n_dot_l = n.dot(&l).max(0.0);
        color += albedo.component_mul(&incidence.irradiance) * (one_over_pi * n_dot_l);
    }
    color
}

fn clamp01(v: Vec3) -> Vec3 {
    Vec3::new(
        v.x.clamp(0.0, 1.0),
        v.y.clamp(0.0, 1.0),
        v.z.clamp(0.0, 1.0),
    )
}

/// `channel -> clamp(channel, 0, 1)^(1/2.2)` (spec §4.6).
fn linear_to_srgb(color: Vec3) -> Vec3 {
    let inv_gamma = 1.0 / 2.2;
    Vec3::new(
        color.x.clamp(0.0, 1.0).powf(inv_gamma),
        color.y.clamp(0.0, 1.0).powf(inv_gamma),
        color.z.clamp(0.0, 1.0).powf(inv_gamma),
    )
}

fn quantize(c: Scalar) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}
