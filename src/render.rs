use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::camera::{Camera, Viewport};
use crate::error::ConfigError;
use crate::object::Scene;
use crate::picture::{Color, FrameBuffer, RGBA8};
use crate::ray::Ray;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Written for rays that escape the scene.
    pub background: Color,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings { background: Color::BLACK }
    }
}

/// Timing of one render pass, reported for display and logging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub elapsed: Duration,
    pub pixels: u64,
}

/// Flat shading: the nearest primitive's color, opaque, or the background.
pub fn trace_ray(ray: &Ray, scene: &Scene, background: Color) -> Color {
    match scene.hit(ray) {
        Some(hit) => Color { a: 1.0, ..hit.color },
        None => background,
    }
}

pub fn render_pixel(i: u32, j: u32, viewport: &Viewport, scene: &Scene, settings: &RenderSettings) -> RGBA8 {
    let ray = viewport.emit_ray(i, j);
    trace_ray(&ray, scene, settings.background).into()
}

const LINES_PER_WORK: usize = 16;

/// Renders one frame into `frame`, overwriting every pixel. Bands of rows
/// are shaded in parallel; each band only writes its own slice.
pub fn render_frame(scene: &Scene, camera: &Camera, settings: &RenderSettings, frame: &mut FrameBuffer) -> FrameStats {
    let (width, height) = (frame.width(), frame.height());
    let viewport = camera.viewport(width, height);

    debug!(target: "app", "Starting frame render at {:?}", camera.position);
    let start = Instant::now();

    let band_len = width as usize * LINES_PER_WORK;
    frame.pixels_mut()
        .par_chunks_mut(band_len)
        .enumerate()
        .for_each(|(band, pixels)| {
            let first_row = band * LINES_PER_WORK;
            trace!(target: "app", "Rendering rows {}..{}", first_row, first_row + pixels.len() / width as usize);
            for (offset, pixel) in pixels.iter_mut().enumerate() {
                let i = (offset % width as usize) as u32;
                let j = (first_row + offset / width as usize) as u32;
                *pixel = render_pixel(i, j, &viewport, scene, settings);
            }
        });

    let stats = FrameStats {
        elapsed: start.elapsed(),
        pixels: width as u64 * height as u64,
    };
    info!(target: "app", "Finished rendering {}x{}. Took {:?}", width, height, stats.elapsed);
    stats
}

/// Allocates a buffer of the requested size and renders a single frame into it.
pub fn render(scene: &Scene, camera: &Camera, width: u32, height: u32) -> Result<(FrameBuffer, Duration), ConfigError> {
    let mut frame = FrameBuffer::new(width, height)?;
    let stats = render_frame(scene, camera, &RenderSettings::default(), &mut frame);
    Ok((frame, stats.elapsed))
}
