use thiserror::Error;

/// Setup-time failures. Every one of these is raised before the first frame
/// is rendered; a running render pass never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClip { near: f32, far: f32 },
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f32),
    #[error("output resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },
    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("plane normal must have non-zero length")]
    DegenerateNormal,
    #[error("invalid color {0:?}, expected RRGGBB or RRGGBBAA hex")]
    InvalidColor(String),
}
