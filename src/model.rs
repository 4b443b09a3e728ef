use crate::{
    core::{Canvas, Rgba8, Vec2},
    error::{ThumbError, ThumbResult},
};

/// Line spacing multiplier for stacked text lines.
pub const LINE_HEIGHT: f64 = 1.1;
/// Horizontal padding used by the left/right alignment anchors.
pub const PADDING_X: f64 = 20.0;
/// Default vertical anchor for the text block (bottom edge of the canvas).
pub const TEXT_ANCHOR_Y: f64 = 720.0;
/// Accent red used by the highlight ring, badge ring and arrow.
pub const ACCENT_RED: Rgba8 = Rgba8::opaque(255, 0, 0);
/// Stroke width of the highlight/badge rings.
pub const RING_STROKE_WIDTH: f64 = 14.0;
/// Glow blur radius around rings, in canvas px.
pub const RING_GLOW_BLUR: f64 = 50.0;
/// Glow blur radius around the arrow, in canvas px.
pub const ARROW_GLOW_BLUR: f64 = 40.0;
/// Width of the white outline around the arrow.
pub const ARROW_OUTLINE_WIDTH: f64 = 4.0;
/// The stored outline width is multiplied by this before stroking text.
pub const TEXT_STROKE_FACTOR: f64 = 2.2;
/// Drop shadow color behind text lines.
pub const TEXT_SHADOW_COLOR: Rgba8 = Rgba8::new(0, 0, 0, 204);
/// Brightness boost inside the circular highlight window.
pub const HIGHLIGHT_BRIGHTNESS_BOOST: f64 = 1.4;

/// Horizontal text alignment, selected as a discrete action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One of the fixed (fill, stroke) text color pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextStyleId {
    GoldOnBlack,
    WhiteOnBlack,
}

/// A named fill/stroke color pair from the fixed palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub id: TextStyleId,
    pub fill: Rgba8,
    pub stroke: Rgba8,
}

impl TextStyleId {
    /// Resolve the palette entry for this id.
    pub fn style(self) -> TextStyle {
        match self {
            TextStyleId::GoldOnBlack => TextStyle {
                id: self,
                fill: Rgba8::opaque(255, 215, 0),
                stroke: Rgba8::opaque(0, 0, 0),
            },
            TextStyleId::WhiteOnBlack => TextStyle {
                id: self,
                fill: Rgba8::opaque(255, 255, 255),
                stroke: Rgba8::opaque(0, 0, 0),
            },
        }
    }
}

/// Circular window that re-exposes the base image at boosted brightness.
///
/// `pos` is the top-left corner of the circle's bounding square; hiding the
/// highlight preserves its geometry.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleHighlight {
    pub visible: bool,
    pub pos: Vec2,
    pub diameter: f64,
}

impl Default for CircleHighlight {
    fn default() -> Self {
        Self {
            visible: false,
            pos: Vec2::new(540.0, 260.0),
            diameter: 250.0,
        }
    }
}

/// Secondary image clipped into a circle with a glowing ring.
///
/// `pos` is the top-left corner of the circle's bounding square.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FocusBadge {
    /// Asset key of the badge image.
    pub image: String,
    pub pos: Vec2,
    pub diameter: f64,
}

impl FocusBadge {
    /// Badge with default geometry, as created when an image is attached.
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            pos: Vec2::new(400.0, 200.0),
            diameter: 300.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.diameter / 2.0, self.diameter / 2.0)
    }
}

/// Directional arrow marker; `pos` is the anchor center.
///
/// Orientation is never stored: it is derived from the anchor toward the
/// active secondary overlay on every render.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrowMarker {
    pub visible: bool,
    pub pos: Vec2,
    pub scale: f64,
}

impl Default for ArrowMarker {
    fn default() -> Self {
        Self {
            visible: false,
            pos: Vec2::new(800.0, 400.0),
            scale: 1.2,
        }
    }
}

/// The title block; all coordinates in canvas-logical space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextBlock {
    /// Raw content; rendering upper-cases it regardless of stored case.
    pub content: String,
    /// Font file the title is shaped with (path relative to the scene file).
    pub font_source: String,
    pub size_px: f64,
    pub align: TextAlign,
    pub rotation_deg: f64,
    pub style: TextStyleId,
    pub outline_width: f64,
    pub shadow_blur: f64,
    /// Anchor of the bottom line's baseline box.
    pub pos: Vec2,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_source: String::new(),
            size_px: 135.0,
            align: TextAlign::Center,
            rotation_deg: 0.0,
            style: TextStyleId::WhiteOnBlack,
            outline_width: 11.0,
            shadow_blur: 15.0,
            pos: Vec2::new(f64::from(Canvas::THUMBNAIL.width) / 2.0, TEXT_ANCHOR_Y),
        }
    }
}

/// The full editable composition.
///
/// Created empty, populated once a processed base image arrives, mutated by
/// interaction events, and serialized exactly once on export. There is no
/// persisted identity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub canvas: Canvas,
    /// Asset key of the processed 16:9 background image.
    pub base: Option<String>,
    /// Pan offset from canvas center, clamped so the zoomed base image always
    /// covers the canvas.
    pub offset: Vec2,
    /// Zoom scalar, >= 1.
    pub zoom: f64,
    /// Brightness multiplier applied to the base image.
    pub brightness: f64,
    pub circle: CircleHighlight,
    pub focus: Option<FocusBadge>,
    pub arrow: ArrowMarker,
    pub text: TextBlock,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            canvas: Canvas::THUMBNAIL,
            base: None,
            offset: Vec2::ZERO,
            zoom: 1.0,
            brightness: 1.0,
            circle: CircleHighlight::default(),
            focus: None,
            arrow: ArrowMarker::default(),
            text: TextBlock::default(),
        }
    }
}

impl Scene {
    pub fn validate(&self) -> ThumbResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ThumbError::validation("canvas width/height must be > 0"));
        }
        if !self.zoom.is_finite() || self.zoom < 1.0 {
            return Err(ThumbError::validation("zoom must be >= 1"));
        }
        if !self.brightness.is_finite() || self.brightness < 0.0 {
            return Err(ThumbError::validation("brightness must be >= 0"));
        }

        let max = crate::compose::max_offset(self.canvas, self.zoom);
        if self.offset.x.abs() > max.x + 1e-9 || self.offset.y.abs() > max.y + 1e-9 {
            return Err(ThumbError::validation(format!(
                "offset ({}, {}) exceeds pan bounds for zoom {}",
                self.offset.x, self.offset.y, self.zoom
            )));
        }

        if let Some(base) = &self.base
            && base.trim().is_empty()
        {
            return Err(ThumbError::validation("base asset key must be non-empty"));
        }
        if let Some(focus) = &self.focus {
            if focus.image.trim().is_empty() {
                return Err(ThumbError::validation("focus asset key must be non-empty"));
            }
            if !(focus.diameter > 0.0) {
                return Err(ThumbError::validation("focus diameter must be > 0"));
            }
        }
        if !(self.circle.diameter > 0.0) {
            return Err(ThumbError::validation("circle diameter must be > 0"));
        }
        if !(self.arrow.scale > 0.0) {
            return Err(ThumbError::validation("arrow scale must be > 0"));
        }
        if !(self.text.size_px > 0.0) {
            return Err(ThumbError::validation("text size_px must be > 0"));
        }
        if self.text.outline_width < 0.0 || self.text.shadow_blur < 0.0 {
            return Err(ThumbError::validation(
                "text outline_width and shadow_blur must be >= 0",
            ));
        }

        Ok(())
    }

    /// Center of the circular highlight.
    pub fn circle_center(&self) -> Vec2 {
        self.circle.pos + Vec2::new(self.circle.diameter / 2.0, self.circle.diameter / 2.0)
    }

    /// Point the arrow aims at: the focus badge center when a badge is
    /// attached, otherwise the circular highlight center.
    pub fn arrow_target(&self) -> Vec2 {
        match &self.focus {
            Some(focus) => focus.center(),
            None => self.circle_center(),
        }
    }

    /// Derived arrow orientation in degrees; 0 points straight up because the
    /// arrow artwork is authored pointing up.
    pub fn arrow_angle_deg(&self) -> f64 {
        let target = self.arrow_target();
        let d = target - self.arrow.pos;
        d.y.atan2(d.x).to_degrees() + 90.0
    }
}
