use bytemuck::cast_slice;
use bytemuck_derive::{AnyBitPattern, NoUninit};
use log::debug;

use crate::error::ConfigError;

/// Linear color with components nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub fn rgb_hex(rgb: u32) -> Self {
        let RGBA8 { r, g, b, .. } = RGBA8::new_hex(rgb << 8 | 0xff);
        Color::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parses `RRGGBB` or `RRGGBBAA`, with an optional leading `#` or `0x`.
    pub fn parse_hex(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(text.to_owned());
        let digits = text.trim_start_matches('#').trim_start_matches("0x");
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        let rgba = match digits.len() {
            6 => RGBA8::new_hex(value << 8 | 0xff),
            8 => RGBA8::new_hex(value),
            _ => return Err(invalid()),
        };
        Ok(rgba.into())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, AnyBitPattern, NoUninit)]
#[repr(C)]
pub struct RGBA8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Color> for RGBA8 {
    fn from(value: Color) -> Self {
        RGBA8::new_norm(value.r, value.g, value.b, value.a)
    }
}

impl From<RGBA8> for Color {
    fn from(value: RGBA8) -> Self {
        Color::new(
            value.r as f32 / 255.0,
            value.g as f32 / 255.0,
            value.b as f32 / 255.0,
            value.a as f32 / 255.0,
        )
    }
}

// NaN saturates to 0 through the float-to-int cast.
fn normalize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

impl RGBA8 {
    pub const BLACK: RGBA8 = RGBA8::new_hex(0x000000FF);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        RGBA8 { r, g, b, a }
    }

    pub const fn new_hex(rgba: u32) -> RGBA8 {
        RGBA8 {
            r: ((rgba & 0xff000000) >> 24) as u8,
            g: ((rgba & 0x00ff0000) >> 16) as u8,
            b: ((rgba & 0x0000ff00) >> 8) as u8,
            a: (rgba & 0x000000ff) as u8,
        }
    }

    pub fn new_norm(r: f32, g: f32, b: f32, a: f32) -> Self {
        RGBA8::new(normalize(r), normalize(g), normalize(b), normalize(a))
    }
}

/// Output image: `width * height` RGBA8 pixels in row-major order, so pixel
/// `(i, j)` starts at byte `(i + j * width) * 4`. The size is fixed when the
/// buffer is allocated.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pixels: Vec<RGBA8>,
    size: (u32, u32),
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroResolution { width, height });
        }
        let pixels = vec![RGBA8::default(); width as usize * height as usize];
        debug!(target: "app", "Allocating new frame. {}x{} ({}), {} bytes", width, height, pixels.len(), pixels.len() * 4);
        Ok(FrameBuffer { pixels, size: (width, height) })
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }

    fn to_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width() as usize + x as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> RGBA8 {
        self.pixels[self.to_index(x, y)]
    }

    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [RGBA8] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.pixels)
    }

    pub fn clear(&mut self, color: RGBA8) {
        self.pixels.fill(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_clamps_out_of_range_components() {
        let pixel = RGBA8::from(Color::new(1.7, -0.3, 0.5, f32::NAN));
        assert_eq!(pixel, RGBA8::new(255, 0, 127, 0));
    }

    #[test]
    fn hex_parsing_accepts_both_widths() {
        assert_eq!(Color::parse_hex("#ff0000").unwrap(), Color::RED);
        let translucent = RGBA8::from(Color::parse_hex("00000000").unwrap());
        assert_eq!(translucent, RGBA8::new(0, 0, 0, 0));
        assert!(Color::parse_hex("fff").is_err());
        assert!(Color::parse_hex("zzzzzz").is_err());
        assert_eq!(Color::rgb_hex(0xffffff), Color::WHITE);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert_eq!(FrameBuffer::new(0, 10), Err(ConfigError::ZeroResolution { width: 0, height: 10 }));
        assert!(FrameBuffer::new(10, 0).is_err());
    }

    #[test]
    fn byte_layout_is_row_major_rgba() {
        let mut frame = FrameBuffer::new(3, 2).unwrap();
        let index = frame.to_index(2, 1);
        frame.pixels_mut()[index] = RGBA8::new(1, 2, 3, 4);
        let offset = (2 + 1 * 3) * 4;
        assert_eq!(&frame.as_bytes()[offset..offset + 4], &[1, 2, 3, 4]);
        assert_eq!(frame.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(frame.pixel(2, 1), RGBA8::new(1, 2, 3, 4));
    }
}
