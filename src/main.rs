use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tracelite::bvh::Bvh;
use tracelite::camera::Camera;
use tracelite::prim::Scalar;
use tracelite::renderer::{self, DebugFlags, RenderOptions, Renderer};
use tracelite::scene::{self, default_lights, load_obj_scene_graph, Scene};

/// An offline CPU ray-tracing renderer.
#[derive(Parser, Debug)]
#[command(name = "tracelite", version, about, disable_help_flag = true)]
struct Args {
    /// Scene file to render.
    input: PathBuf,

    /// Framebuffer destination.
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Output width in pixels.
    #[arg(short, long, default_value_t = 1920)]
    width: u16,

    /// Output height in pixels.
    #[arg(short, long, default_value_t = 1080)]
    height: u16,

    /// Name of the camera in the scene to use (else the first).
    #[arg(short, long)]
    camera: Option<String>,

    /// Keep the camera's native aspect instead of overriding with width/height.
    #[arg(long)]
    no_aspect_override: bool,

    /// Override vertical FOV, in degrees.
    #[arg(long)]
    fov: Option<Scalar>,

    /// Debug: show surface normals instead of shading.
    #[arg(long)]
    normal_coloring: bool,

    /// Debug: show barycentric coordinates instead of shading.
    #[arg(long)]
    interp_coloring: bool,

    /// Enable 2x2 MSAA.
    #[arg(long)]
    msaa: bool,

    /// Worker thread count (0 = auto, matching available parallelism).
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Print usage, exit 0.
    #[arg(long, action = clap::ArgAction::HelpLong)]
    help: Option<bool>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap's own exit codes (0 for --help, 2 for usage errors) don't
            // match spec §6 (0 success, 1 argument error); normalize here.
            let code = if err.exit_code() == 0 { 0 } else { 1 };
            err.print().ok();
            std::process::exit(code);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    info!(path = %args.input.display(), "loading scene");
    let graph =
        load_obj_scene_graph(&args.input).with_context(|| "failed to load scene")?;
    let mut camera = resolve_camera(&graph, &args);

    let scene = Scene::from_graph(graph, default_lights());
    info!(count = scene.instances.len(), "instantiated mesh instances");

    if !args.no_aspect_override {
        camera.set_aspect(args.width as Scalar / args.height as Scalar);
    }
    if let Some(fov_deg) = args.fov {
        camera.set_fov(fov_deg.to_radians());
    }

    let mut debug_flags = DebugFlags::empty();
    if args.normal_coloring {
        debug_flags |= DebugFlags::NORMAL_COLORING;
    }
    if args.interp_coloring {
        debug_flags |= DebugFlags::INTERP_COLORING;
    }

    let concurrency = if args.threads == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        args.threads
    };

    let opts = RenderOptions {
        width: args.width,
        height: args.height,
        debug_flags,
        msaa: args.msaa,
        max_recursion: 1,
        concurrency,
    };

    let bvh = Bvh::build(scene.instances);
    let renderer = Renderer::new(bvh, scene.lights);

    info!(threads = concurrency, "rendering");
    let framebuffer = renderer.render(&camera, &opts);

    write_png(&args.output, &framebuffer)?;
    info!(path = %args.output.display(), "wrote output");
    Ok(())
}

fn resolve_camera(graph: &scene::SceneGraph, args: &Args) -> Camera {
    let imported = match &args.camera {
        Some(name) => graph.cameras.iter().find(|c| &c.name == name),
        None => graph.cameras.first(),
    };

    match imported {
        Some(imported) => {
            info!(camera = %imported.name, "using camera from scene");
            let mut cam = Camera::new(imported.xform, imported.fov, imported.aspect);
            cam.is_fov_horizontal = true;
            cam
        }
        None => {
            info!("no cameras imported; falling back to default");
            Camera::new(tracelite::prim::Mat4::identity(), 90f64.to_radians() as Scalar, 16.0 / 9.0)
        }
    }
}

fn write_png(path: &PathBuf, framebuffer: &renderer::Framebuffer) -> Result<()> {
    let mut bytes = Vec::with_capacity(framebuffer.pixels.len() * 3);
    for p in &framebuffer.pixels {
        bytes.push(p.r);
        bytes.push(p.g);
        bytes.push(p.b);
    }
    image::save_buffer(
        path,
        &bytes,
        framebuffer.width as u32,
        framebuffer.height as u32,
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("failed to write image to {}", path.display()))
}
