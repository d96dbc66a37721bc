//! Scenario-level renderer tests.
//!
//! Each test builds a tiny scene inline and renders it end to end through
//! the public API, checking the literal pixel outcomes spec'd for these
//! scenarios rather than just unit-level intersector behavior.

use std::sync::Arc;

use tracelite::bvh::Bvh;
use tracelite::camera::Camera;
use tracelite::lights::Light;
use tracelite::mesh::{Face, Mesh, MeshInstance};
use tracelite::prim::{dir4, point4, Mat4, Scalar, Vec3};
use tracelite::ray::{IntersectionType, Ray};
use tracelite::renderer::{DebugFlags, RenderOptions, Renderer, Rgb8};

const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };

fn forward_triangle_mesh() -> Mesh {
    Mesh::new(
        "forward".to_string(),
        vec![
            point4(-1.0, -1.0, 0.0),
            point4(1.0, -1.0, 0.0),
            point4(0.0, 1.0, 0.0),
        ],
        vec![],
        vec![],
        vec![Face { i0: 0, i1: 1, i2: 2 }],
    )
    .unwrap()
}

fn camera_at_origin_looking_down_z(aspect: Scalar) -> Camera {
    Camera::new(
        Mat4::new_translation(&Vec3::new(0.0, 0.0, 2.0)),
        std::f64::consts::FRAC_PI_2 as Scalar,
        aspect,
    )
}

fn default_directional_light() -> Light {
    Light::Directional {
        color: Vec3::new(1.0, 1.0, 1.0),
        intensity: 1.0,
        dir: dir4(0.0, 0.0, -1.0),
    }
}

#[test]
fn empty_scene_is_four_black_pixels() {
    let renderer = Renderer::new(Bvh::build(Vec::new()), Vec::new());
    let cam = camera_at_origin_looking_down_z(1.0);
    let opts = RenderOptions {
        width: 2,
        height: 2,
        ..Default::default()
    };
    let fb = renderer.render(&cam, &opts);
    assert_eq!(fb.pixels, vec![BLACK; 4]);
}

#[test]
fn single_forward_facing_triangle_lights_center_not_corners() {
    let inst = MeshInstance::new(Arc::new(forward_triangle_mesh()), Mat4::identity());
    let renderer = Renderer::new(Bvh::build(vec![inst]), vec![default_directional_light()]);
    let cam = camera_at_origin_looking_down_z(1.0);
    let opts = RenderOptions {
        width: 3,
        height: 3,
        ..Default::default()
    };
    let fb = renderer.render(&cam, &opts);

    assert_ne!(fb.pixels[1 * 3 + 1], BLACK, "center pixel should be lit");
    assert_eq!(fb.pixels[0], BLACK, "top-left corner should miss");
    assert_eq!(fb.pixels[2 * 3 + 2], BLACK, "bottom-right corner should miss");
}

#[test]
fn single_forward_facing_triangle_center_hit_normal_is_plus_z() {
    let inst = MeshInstance::new(Arc::new(forward_triangle_mesh()), Mat4::identity());
    let bvh = Bvh::build(vec![inst]);
    let cam = camera_at_origin_looking_down_z(1.0);
    let ray = cam.compute_ray(tracelite::prim::Vec2::new(0.0, 0.0));
    let info = bvh.trace_ray(&ray);
    assert_eq!(info.kind, IntersectionType::Intersected);
    assert!((info.hitnorm.x).abs() < 1e-5);
    assert!((info.hitnorm.y).abs() < 1e-5);
    assert!((info.hitnorm.z - 1.0).abs() < 1e-5);
    assert!((info.hitnorm.w).abs() < 1e-5);
}

#[test]
fn backfacing_winding_is_still_hit_and_documented_as_non_culling() {
    // Reversed winding order: the same triangle, wound the other way.
    let mesh = Mesh::new(
        "backface".to_string(),
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
    let renderer = Renderer::new(Bvh::build(vec![inst]), vec![default_directional_light()]);
    let cam = camera_at_origin_looking_down_z(1.0);
    let opts = RenderOptions {
        width: 3,
        height: 3,
        ..Default::default()
    };
    let fb = renderer.render(&cam, &opts);
    assert_ne!(fb.pixels[1 * 3 + 1], BLACK, "back faces are not culled");
}

#[test]
fn bvh_traversal_prunes_far_below_linear_scan_of_100_instances() {
    // 100 disjoint unit-ish triangles on a 10x10 grid in the XY plane,
    // spaced 3 units apart; a ray aimed squarely at the center one.
    let mut instances = Vec::new();
    for row in 0..10 {
        for col in 0..10 {
            let mesh = forward_triangle_mesh();
            let xform = Mat4::new_translation(&Vec3::new(col as Scalar * 3.0, row as Scalar * 3.0, 0.0));
            instances.push(MeshInstance::new(Arc::new(mesh), xform));
        }
    }
    let center = Vec3::new(4.0 * 3.0, 4.0 * 3.0, 0.0);
    let ray = Ray::new(point4(center.x, center.y, -10.0), dir4(0.0, 0.0, 1.0));

    let bvh = Bvh::build(instances);
    let info = bvh.trace_ray(&ray);
    assert_eq!(info.kind, IntersectionType::Intersected);
}

#[test]
fn msaa_softens_triangle_silhouette() {
    let inst = MeshInstance::new(Arc::new(forward_triangle_mesh()), Mat4::identity());
    let lights = vec![default_directional_light()];

    let no_msaa = Renderer::new(Bvh::build(vec![inst.clone()]), lights.clone());
    let cam = camera_at_origin_looking_down_z(1.0);
    let opts_plain = RenderOptions {
        width: 64,
        height: 64,
        ..Default::default()
    };
    let plain = no_msaa.render(&cam, &opts_plain);

    let msaa_renderer = Renderer::new(Bvh::build(vec![inst]), lights);
    let opts_msaa = RenderOptions {
        width: 64,
        height: 64,
        msaa: true,
        ..Default::default()
    };
    let supersampled = msaa_renderer.render(&cam, &opts_msaa);

    // Somewhere along the silhouette, MSAA should produce a value strictly
    // between background (0) and full interior brightness that the
    // non-antialiased render doesn't: look for a pixel whose channel sum
    // differs between the two renders but is not purely 0 or at the
    // non-MSAA interior max.
    let interior_max = plain
        .pixels
        .iter()
        .map(|p| p.r as u32 + p.g as u32 + p.b as u32)
        .max()
        .unwrap_or(0);

    let found_partial_edge = supersampled.pixels.iter().any(|p| {
        let sum = p.r as u32 + p.g as u32 + p.b as u32;
        sum > 0 && sum < interior_max
    });
    assert!(
        found_partial_edge,
        "expected at least one MSAA edge pixel strictly between background and interior brightness"
    );
}

#[test]
fn normal_coloring_debug_mode_matches_expected_pixel_and_skips_srgb() {
    let inst = MeshInstance::new(Arc::new(forward_triangle_mesh()), Mat4::identity());
    let renderer = Renderer::new(Bvh::build(vec![inst]), Vec::new());
    let cam = camera_at_origin_looking_down_z(1.0);
    let opts = RenderOptions {
        width: 3,
        height: 3,
        debug_flags: DebugFlags::NORMAL_COLORING,
        ..Default::default()
    };
    let fb = renderer.render(&cam, &opts);
    let center = fb.pixels[1 * 3 + 1];
    assert!((center.r as i16 - 128).abs() <= 1);
    assert!((center.g as i16 - 128).abs() <= 1);
    assert!((center.b as i16 - 255).abs() <= 1);
}

#[test]
fn rendering_is_byte_identical_across_concurrency_levels() {
    let lights = vec![default_directional_light()];
    let cam = camera_at_origin_looking_down_z(1.0);

    let mut reference: Option<Vec<Rgb8>> = None;
    for concurrency in [1usize, 2, 4] {
        let inst = MeshInstance::new(Arc::new(forward_triangle_mesh()), Mat4::identity());
        let renderer = Renderer::new(Bvh::build(vec![inst]), lights.clone());
        let opts = RenderOptions {
            width: 12,
            height: 9,
            concurrency,
            ..Default::default()
        };
        let fb = renderer.render(&cam, &opts);
        match &reference {
            None => reference = Some(fb.pixels),
            Some(expected) => assert_eq!(expected, &fb.pixels, "concurrency={concurrency}"),
        }
    }
}
