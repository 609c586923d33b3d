//! Flat-shaded ray tracer. Opens a window showing three primitives that the
//! arrow keys pan around, or renders a fixed number of frames with `--headless`.

use anyhow::Result;
use clap::Parser;
use log::{info, LevelFilter};
use nalgebra::{point, vector};

use flat_tracer::{render_frame, Camera, Color, FrameBuffer, Primitive, RenderSettings, Scene};

use crate::cli::Args;

mod app;
mod cli;
mod gpu;

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Two unit spheres resting on a ground plane.
fn demo_scene() -> Result<Scene> {
    let white = Color::rgb_hex(0xffffff);
    let red = Color::rgb_hex(0xff0000);
    let scene = Scene::new(vec![
        Primitive::sphere(point![-1.0, 0.0, 0.0], 1.0, white),
        Primitive::sphere(point![1.0, 0.0, 0.0], 1.0, red),
        Primitive::plane(point![0.0, -1.0, 0.0], vector![0.0, 1.0, 0.0], white)?,
    ])?;
    Ok(scene)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    // Reject bad configuration before anything is rendered.
    let frame = FrameBuffer::new(args.width, args.height)?;
    let aspect = args.width as f32 / args.height as f32;
    let camera = Camera::new(args.position, args.fov, aspect)?;
    let scene = demo_scene()?;
    let settings = RenderSettings { background: args.background };

    info!(target: "app", "Scene with {} primitives, {}x{} output, fov {} deg, aspect {:.3}",
        scene.primitives().len(), args.width, args.height, camera.fov(), camera.aspect());

    if args.headless {
        let mut frame = frame;
        for index in 0..args.frames {
            let stats = render_frame(&scene, &camera, &settings, &mut frame);
            info!(target: "app", "Frame {}: {} pixels in {:?}", index, stats.pixels, stats.elapsed);
        }
        return Ok(());
    }

    app::run(scene, camera, settings, frame)
}
