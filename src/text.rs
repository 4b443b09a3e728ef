//! Parley-backed shaping for title lines.
//!
//! Fonts are supplied as raw bytes and registered per layout, so the glyph
//! ids in the layout always belong to the same font the renderer draws with.

use crate::error::{ThumbError, ThumbResult};

/// Brush carried through parley layouts. The compositor paints shadow,
/// stroke and fill passes itself, so the brush carries no color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush;

/// One shaped title line plus the measurements the layout math needs.
pub(crate) struct ShapedLine {
    pub(crate) layout: parley::Layout<TextBrush>,
    /// Advance width in px.
    pub(crate) width: f64,
    /// Layout box height in px; the line's bottom edge sits this far below
    /// the layout origin.
    pub(crate) height: f64,
}

/// Stateful helper owning the parley font and layout contexts.
pub(crate) struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape a single line (no wrapping) with the given font bytes and size.
    pub(crate) fn shape_line(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
    ) -> ThumbResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ThumbError::validation("text size must be finite and > 0"));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ThumbError::validation("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ThumbError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let width = f64::from(layout.width());
        let height = f64::from(layout.height());
        Ok(ShapedLine {
            layout,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_font() -> Option<Vec<u8>> {
        std::fs::read("tests/data/fonts/DejaVuSans.ttf").ok()
    }

    #[test]
    fn shape_line_measures_nonempty_text() {
        let Some(font) = fixture_font() else {
            return;
        };
        let mut engine = TextEngine::new();
        let line = engine.shape_line("HELLO", &font, 135.0).unwrap();
        assert!(line.width > 0.0);
        assert!(line.height > 0.0);

        let wider = engine.shape_line("HELLO WORLD", &font, 135.0).unwrap();
        assert!(wider.width > line.width);
    }

    #[test]
    fn shape_line_rejects_bad_size() {
        let mut engine = TextEngine::new();
        assert!(engine.shape_line("X", &[], 0.0).is_err());
    }

    #[test]
    fn shape_line_rejects_non_font_bytes() {
        let mut engine = TextEngine::new();
        assert!(engine.shape_line("X", b"not a font", 16.0).is_err());
    }
}
