use clap::{Parser, ValueEnum};
use log::LevelFilter;
use nalgebra::Point3;

use flat_tracer::Color;

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line configuration. Everything is validated before the first frame.
#[derive(Debug, Parser)]
#[command(name = "flat-tracer")]
#[command(about = "Flat-shaded ray tracer with arrow-key camera panning")]
pub struct Args {
    /// Output width in pixels
    #[arg(long, default_value_t = 400)]
    pub width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 300)]
    pub height: u32,

    /// Field of view in degrees, strictly between 0 and 180
    #[arg(long, default_value_t = 45.0)]
    pub fov: f32,

    /// Initial camera position as x,y,z
    #[arg(long, default_value = "0,0,10", value_parser = parse_point, allow_hyphen_values = true)]
    pub position: Point3<f32>,

    /// Color written where rays escape the scene, as RRGGBB or RRGGBBAA
    #[arg(long, default_value = "000000ff", value_parser = Color::parse_hex)]
    pub background: Color,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Render without opening a window
    #[arg(long)]
    pub headless: bool,

    /// Number of frames to render in headless mode
    #[arg(long, default_value_t = 1)]
    pub frames: u32,
}

fn parse_point(text: &str) -> Result<Point3<f32>, String> {
    let coords = text.split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|err| format!("{part:?}: {err}")))
        .collect::<Result<Vec<_>, _>>()?;
    match coords[..] {
        [x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {} components", coords.len())),
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;

    #[test]
    fn defaults_match_the_demo_setup() {
        let args = Args::parse_from(["flat-tracer"]);
        assert_eq!((args.width, args.height), (400, 300));
        assert_eq!(args.fov, 45.0);
        assert_eq!(args.position, point![0.0, 0.0, 10.0]);
        assert_eq!(args.background, Color::BLACK);
        assert!(!args.headless);
    }

    #[test]
    fn points_need_three_numbers() {
        assert_eq!(parse_point("-1, 2.5,3"), Ok(point![-1.0, 2.5, 3.0]));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,x,3").is_err());
    }

    #[test]
    fn malformed_background_is_rejected() {
        assert!(Args::try_parse_from(["flat-tracer", "--background", "red"]).is_err());
    }
}
