//! Flat-shaded ray tracer: one ray per pixel from a pinhole camera, colored
//! by the nearest sphere or plane it strikes.

pub mod camera;
pub mod error;
pub mod object;
pub mod picture;
pub mod ray;
pub mod render;

pub use camera::Camera;
pub use error::ConfigError;
pub use object::{Primitive, Scene};
pub use picture::{Color, FrameBuffer, RGBA8};
pub use render::{render, render_frame, FrameStats, RenderSettings};
