//! The single mutable owner of the composition during an editing session.
//!
//! Every mutation re-establishes the scene invariants at the edge: zoom never
//! drops below 1, the pan offset is re-clamped whenever zoom or offset
//! change, and attaching or replacing the base image resets the view.

use crate::{
    compose,
    core::Vec2,
    error::{ThumbError, ThumbResult},
    model::{FocusBadge, Scene, TextAlign, TextStyleId},
};

/// Owns the live [`Scene`] and applies edits to it.
///
/// Reads go through [`EditorState::scene`]; all writes go through the typed
/// setters so invariants cannot be bypassed.
#[derive(Clone, Debug, Default)]
pub struct EditorState {
    scene: Scene,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scene(scene: Scene) -> ThumbResult<Self> {
        scene.validate()?;
        Ok(Self { scene })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Install a (new) base image and reset the view: zoom back to 1, offset
    /// back to center.
    pub fn set_base(&mut self, key: impl Into<String>) -> ThumbResult<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ThumbError::validation("base asset key must be non-empty"));
        }
        self.scene.base = Some(key);
        self.scene.zoom = 1.0;
        self.scene.offset = Vec2::ZERO;
        Ok(())
    }

    /// Set the zoom scalar. Values below 1 clamp to 1, and the pan offset is
    /// re-clamped so the base image keeps covering the canvas.
    pub fn set_zoom(&mut self, zoom: f64) -> ThumbResult<()> {
        if !zoom.is_finite() {
            return Err(ThumbError::validation("zoom must be finite"));
        }
        self.scene.zoom = zoom.max(1.0);
        self.scene.offset =
            compose::clamp_offset(self.scene.offset, self.scene.zoom, self.scene.canvas);
        Ok(())
    }

    /// Set the pan offset, clamped to the bounds of the current zoom.
    pub fn set_offset(&mut self, offset: Vec2) -> ThumbResult<()> {
        if !offset.x.is_finite() || !offset.y.is_finite() {
            return Err(ThumbError::validation("offset must be finite"));
        }
        self.scene.offset = compose::clamp_offset(offset, self.scene.zoom, self.scene.canvas);
        Ok(())
    }

    pub fn set_brightness(&mut self, brightness: f64) -> ThumbResult<()> {
        if !brightness.is_finite() || brightness < 0.0 {
            return Err(ThumbError::validation("brightness must be >= 0"));
        }
        self.scene.brightness = brightness;
        Ok(())
    }

    pub fn set_text_content(&mut self, content: impl Into<String>) {
        self.scene.text.content = content.into();
    }

    pub fn set_text_size(&mut self, size_px: f64) -> ThumbResult<()> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ThumbError::validation("text size must be > 0"));
        }
        self.scene.text.size_px = size_px;
        Ok(())
    }

    pub fn set_text_style(&mut self, style: TextStyleId) {
        self.scene.text.style = style;
    }

    pub fn set_text_outline(&mut self, width: f64) -> ThumbResult<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(ThumbError::validation("outline width must be >= 0"));
        }
        self.scene.text.outline_width = width;
        Ok(())
    }

    pub fn set_text_shadow_blur(&mut self, blur: f64) -> ThumbResult<()> {
        if !blur.is_finite() || blur < 0.0 {
            return Err(ThumbError::validation("shadow blur must be >= 0"));
        }
        self.scene.text.shadow_blur = blur;
        Ok(())
    }

    pub fn set_text_rotation(&mut self, degrees: f64) -> ThumbResult<()> {
        if !degrees.is_finite() {
            return Err(ThumbError::validation("rotation must be finite"));
        }
        self.scene.text.rotation_deg = degrees;
        Ok(())
    }

    /// Select an alignment: snaps the block's horizontal anchor to the
    /// alignment's canvas anchor while keeping its vertical position.
    pub fn set_alignment(&mut self, align: TextAlign) {
        self.scene.text.align = align;
        self.scene.text.pos.x = compose::align_anchor_x(align, self.scene.canvas);
    }

    pub fn set_font_source(&mut self, key: impl Into<String>) {
        self.scene.text.font_source = key.into();
    }

    /// Attach a focus badge with default geometry for the given image key,
    /// replacing any existing badge.
    pub fn attach_focus(&mut self, image: impl Into<String>) -> ThumbResult<()> {
        let image = image.into();
        if image.trim().is_empty() {
            return Err(ThumbError::validation("focus asset key must be non-empty"));
        }
        self.scene.focus = Some(FocusBadge::with_image(image));
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.scene.focus = None;
    }

    pub fn set_text_pos(&mut self, pos: Vec2) -> ThumbResult<()> {
        self.scene.text.pos = finite_vec(pos, "text position")?;
        Ok(())
    }

    pub fn set_circle_pos(&mut self, pos: Vec2) -> ThumbResult<()> {
        self.scene.circle.pos = finite_vec(pos, "circle position")?;
        Ok(())
    }

    /// Move the focus badge. No-op when no badge is attached.
    pub fn set_focus_pos(&mut self, pos: Vec2) -> ThumbResult<()> {
        let pos = finite_vec(pos, "focus position")?;
        if let Some(focus) = &mut self.scene.focus {
            focus.pos = pos;
        }
        Ok(())
    }

    pub fn set_arrow_pos(&mut self, pos: Vec2) -> ThumbResult<()> {
        self.scene.arrow.pos = finite_vec(pos, "arrow position")?;
        Ok(())
    }

    pub fn set_circle_visible(&mut self, visible: bool) {
        self.scene.circle.visible = visible;
    }

    pub fn set_arrow_visible(&mut self, visible: bool) {
        self.scene.arrow.visible = visible;
    }
}

fn finite_vec(v: Vec2, what: &str) -> ThumbResult<Vec2> {
    if !v.x.is_finite() || !v.y.is_finite() {
        return Err(ThumbError::validation(format!("{what} must be finite")));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_zoom_clamps_below_one_and_reclamps_offset() {
        let mut state = EditorState::new();
        state.set_zoom(2.0).unwrap();
        state.set_offset(Vec2::new(640.0, 360.0)).unwrap();
        assert_eq!(state.scene().offset, Vec2::new(640.0, 360.0));

        // zooming back out shrinks the legal pan range
        state.set_zoom(1.5).unwrap();
        assert_eq!(state.scene().offset, Vec2::new(320.0, 180.0));

        state.set_zoom(0.2).unwrap();
        assert_eq!(state.scene().zoom, 1.0);
        assert_eq!(state.scene().offset, Vec2::ZERO);
    }

    #[test]
    fn set_offset_clamps_to_zoom_bounds() {
        let mut state = EditorState::new();
        state.set_zoom(2.0).unwrap();
        state.set_offset(Vec2::new(10_000.0, -10_000.0)).unwrap();
        assert_eq!(state.scene().offset, Vec2::new(640.0, -360.0));
    }

    #[test]
    fn new_base_resets_the_view() {
        let mut state = EditorState::new();
        state.set_base("a.png").unwrap();
        state.set_zoom(3.0).unwrap();
        state.set_offset(Vec2::new(100.0, 100.0)).unwrap();

        state.set_base("b.png").unwrap();
        assert_eq!(state.scene().base.as_deref(), Some("b.png"));
        assert_eq!(state.scene().zoom, 1.0);
        assert_eq!(state.scene().offset, Vec2::ZERO);
    }

    #[test]
    fn alignment_snaps_x_and_keeps_y() {
        let mut state = EditorState::new();
        state.scene.text.pos = Vec2::new(333.0, 500.0);

        state.set_alignment(TextAlign::Left);
        assert_eq!(state.scene().text.pos, Vec2::new(20.0, 500.0));

        state.set_alignment(TextAlign::Right);
        assert_eq!(state.scene().text.pos, Vec2::new(1260.0, 500.0));

        state.set_alignment(TextAlign::Center);
        assert_eq!(state.scene().text.pos, Vec2::new(640.0, 500.0));
    }

    #[test]
    fn attach_focus_uses_default_geometry() {
        let mut state = EditorState::new();
        state.attach_focus("badge.png").unwrap();
        let focus = state.scene().focus.clone().unwrap();
        assert_eq!(focus.pos, Vec2::new(400.0, 200.0));
        assert_eq!(focus.diameter, 300.0);

        state.clear_focus();
        assert!(state.scene().focus.is_none());
    }

    #[test]
    fn setters_reject_bad_values() {
        let mut state = EditorState::new();
        assert!(state.set_zoom(f64::NAN).is_err());
        assert!(state.set_brightness(-0.1).is_err());
        assert!(state.set_text_size(0.0).is_err());
        assert!(state.set_base("   ").is_err());
        assert!(state.attach_focus("").is_err());
    }

    #[test]
    fn from_scene_validates() {
        let mut scene = Scene::default();
        scene.zoom = 0.5;
        assert!(EditorState::from_scene(scene).is_err());
        assert!(EditorState::from_scene(Scene::default()).is_ok());
    }
}
