use crate::error::{ThumbError, ThumbResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The fixed logical frame all stored coordinates are expressed in.
    ///
    /// Positions in the scene model are independent of any on-screen display
    /// scale; the compositor rasterizes at exactly this resolution.
    pub const THUMBNAIL: Canvas = Canvas {
        width: 1280,
        height: 720,
    };

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a `#rrggbb` hex color.
    pub fn from_hex(hex: &str) -> ThumbResult<Self> {
        let s = hex.strip_prefix('#').unwrap_or(hex);
        if s.len() != 6 || !s.is_ascii() {
            return Err(ThumbError::validation(format!(
                "expected #rrggbb color, got '{hex}'"
            )));
        }
        let byte = |i: usize| -> ThumbResult<u8> {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| ThumbError::validation(format!("invalid hex color '{hex}'")))
        };
        Ok(Self::opaque(byte(0)?, byte(2)?, byte(4)?))
    }

    pub fn to_peniko(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_canvas_is_16_9() {
        let c = Canvas::THUMBNAIL;
        assert_eq!(c.width * 9, c.height * 16);
        assert_eq!(c.center(), Point::new(640.0, 360.0));
    }

    #[test]
    fn hex_parse_roundtrip() {
        assert_eq!(
            Rgba8::from_hex("#FFD700").unwrap(),
            Rgba8::opaque(255, 215, 0)
        );
        assert_eq!(Rgba8::from_hex("ff0000").unwrap(), Rgba8::opaque(255, 0, 0));
        assert!(Rgba8::from_hex("#xyzxyz").is_err());
        assert!(Rgba8::from_hex("#fff").is_err());
    }
}
