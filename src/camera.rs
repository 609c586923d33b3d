use nalgebra::{Point3, Rotation3, vector, Vector3};

use crate::error::ConfigError;
use crate::ray::Ray;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Pinhole camera. Orientation is yaw (about y), then pitch (about x), then
/// roll (about z), all in radians; with no rotation it looks down -z.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// `fov` is in degrees and must lie strictly between 0 and 180.
    pub fn new(position: Point3<f32>, fov: f32, aspect: f32) -> Result<Self, ConfigError> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::InvalidFov(fov));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(ConfigError::InvalidAspect(aspect));
        }
        Ok(Camera {
            position,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            fov,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        })
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Result<Self, ConfigError> {
        if !(near > 0.0 && far > near) {
            return Err(ConfigError::InvalidClip { near, far });
        }
        self.near = near;
        self.far = far;
        Ok(self)
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn clip(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Moves the camera on the horizontal plane.
    pub fn pan(&mut self, dx: f32, dz: f32) {
        self.position.x += dx;
        self.position.z += dz;
    }

    pub fn rotation(&self) -> Rotation3<f32> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), self.yaw) *
            Rotation3::from_axis_angle(&Vector3::x_axis(), self.pitch) *
            Rotation3::from_axis_angle(&Vector3::z_axis(), self.roll)
    }

    /// Precomputes everything needed to emit one ray per pixel of a
    /// `width` x `height` image.
    pub fn viewport(&self, width: u32, height: u32) -> Viewport {
        let image_width = width as f32;
        let image_height = height as f32;

        let rotation = self.rotation();
        let right = rotation * Vector3::x();
        let up = rotation * Vector3::y();
        let back = rotation * Vector3::z();

        // Distance of the image plane, in pixels, for which the half-width
        // spans the field of view.
        let half_width = image_width / 2.0;
        let depth = half_width / (std::f32::consts::PI * self.fov / 360.0).tan();

        Viewport {
            origin: self.position,
            center: ((image_width - 1.0) / 2.0, (image_height - 1.0) / 2.0),
            depth,
            right,
            up,
            back,
        }
    }
}

/// Camera basis and image-plane geometry for one output resolution.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub origin: Point3<f32>,
    /// Pixel coordinates of the optical axis.
    pub center: (f32, f32),
    pub depth: f32,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub back: Vector3<f32>,
}

impl Viewport {
    /// Direction through pixel `(i, j)` in camera space. Rows grow downwards.
    pub fn local_direction(&self, i: u32, j: u32) -> Vector3<f32> {
        vector![i as f32 - self.center.0, self.center.1 - j as f32, -self.depth]
    }

    pub fn emit_ray(&self, i: u32, j: u32) -> Ray {
        let local = self.local_direction(i, j);
        let direction = local.x * self.right + local.y * self.up + local.z * self.back;
        Ray::new(self.origin, direction)
    }
}
