//! Pointer gesture interpretation.
//!
//! A gesture begins on a specific target, receives screen-space pointer
//! positions while the pointer is down, and ends wherever the pointer is
//! released. Screen deltas are divided by the preview's display scale so
//! drags track the pointer 1:1 regardless of how large the preview is drawn.

use crate::{
    core::Vec2,
    error::{ThumbError, ThumbResult},
    state::EditorState,
};

/// What a press landed on, decided by the caller's hit testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureTarget {
    /// Drag the base image (pan).
    Pan,
    /// Drag the text block.
    Text,
    /// Drag the rotation handle of the text block.
    TextRotate,
    /// Drag the circular highlight.
    Circle,
    /// Drag the focus badge.
    Focus,
    /// Drag the arrow anchor.
    Arrow,
}

/// An in-flight drag, if any. At most one gesture is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum ActiveGesture {
    #[default]
    None,
    Drag {
        target: GestureTarget,
        /// Last screen-space pointer position, for cumulative deltas.
        last: Vec2,
    },
}

/// Translates a press/move/release pointer stream into state edits.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureController {
    active: ActiveGesture,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.active, ActiveGesture::None)
    }

    /// Press: arm a drag on `target` at the given screen position. A second
    /// press while a gesture is active replaces it.
    pub fn begin(&mut self, target: GestureTarget, screen: Vec2) {
        self.active = ActiveGesture::Drag {
            target,
            last: screen,
        };
    }

    /// Pointer move: apply the delta since the previous event to the active
    /// target. Does nothing when no gesture is active.
    pub fn update(
        &mut self,
        state: &mut EditorState,
        screen: Vec2,
        display_scale: f64,
    ) -> ThumbResult<()> {
        let ActiveGesture::Drag { target, last } = self.active else {
            return Ok(());
        };
        if !display_scale.is_finite() || display_scale <= 0.0 {
            return Err(ThumbError::validation("display scale must be > 0"));
        }

        let delta = (screen - last) / display_scale;
        match target {
            GestureTarget::Pan => {
                // set_offset re-clamps, so dragging past the bound pins the
                // image edge instead of erroring.
                let offset = state.scene().offset;
                state.set_offset(offset + delta)?;
            }
            GestureTarget::Text => {
                let pos = state.scene().text.pos;
                state.set_text_pos(pos + delta)?;
            }
            GestureTarget::TextRotate => {
                // Absolute: the handle direction from the block anchor sets
                // the angle outright, with 0 pointing straight up.
                let anchor = state.scene().text.pos * display_scale;
                let d = screen - anchor;
                state.set_text_rotation(d.y.atan2(d.x).to_degrees() + 90.0)?;
            }
            GestureTarget::Circle => {
                let pos = state.scene().circle.pos;
                state.set_circle_pos(pos + delta)?;
            }
            GestureTarget::Focus => {
                let pos = state.scene().focus.as_ref().map(|f| f.pos);
                if let Some(pos) = pos {
                    state.set_focus_pos(pos + delta)?;
                }
            }
            GestureTarget::Arrow => {
                let pos = state.scene().arrow.pos;
                state.set_arrow_pos(pos + delta)?;
            }
        }

        self.active = ActiveGesture::Drag {
            target,
            last: screen,
        };
        Ok(())
    }

    /// Release: unconditionally ends any active gesture, wherever the pointer
    /// is, including outside the preview.
    pub fn end(&mut self) {
        self.active = ActiveGesture::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_accumulates_across_moves() {
        let mut state = EditorState::new();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::Arrow, Vec2::new(100.0, 100.0));
        gestures
            .update(&mut state, Vec2::new(110.0, 100.0), 1.0)
            .unwrap();
        gestures
            .update(&mut state, Vec2::new(110.0, 130.0), 1.0)
            .unwrap();
        gestures.end();

        // default anchor (800, 400) moved by the summed deltas (10, 30)
        assert_eq!(state.scene().arrow.pos, Vec2::new(810.0, 430.0));
    }

    #[test]
    fn display_scale_converts_screen_deltas() {
        let mut state = EditorState::new();
        let mut gestures = GestureController::new();

        // preview drawn at half size: a 10px screen drag is a 20px move
        gestures.begin(GestureTarget::Circle, Vec2::ZERO);
        gestures
            .update(&mut state, Vec2::new(10.0, 5.0), 0.5)
            .unwrap();

        assert_eq!(state.scene().circle.pos, Vec2::new(560.0, 270.0));
    }

    #[test]
    fn pan_drag_respects_clamp() {
        let mut state = EditorState::new();
        state.set_zoom(2.0).unwrap();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::Pan, Vec2::ZERO);
        gestures
            .update(&mut state, Vec2::new(10_000.0, 0.0), 1.0)
            .unwrap();

        assert_eq!(state.scene().offset, Vec2::new(640.0, 0.0));
    }

    #[test]
    fn moves_without_begin_are_ignored() {
        let mut state = EditorState::new();
        let before = state.scene().clone();
        let mut gestures = GestureController::new();

        gestures
            .update(&mut state, Vec2::new(50.0, 50.0), 1.0)
            .unwrap();
        assert_eq!(state.scene(), &before);
        assert!(!gestures.is_active());
    }

    #[test]
    fn release_anywhere_ends_the_gesture() {
        let mut state = EditorState::new();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::Text, Vec2::ZERO);
        assert!(gestures.is_active());
        // release lands far outside the preview bounds
        gestures.end();
        assert!(!gestures.is_active());

        // further moves do nothing
        let before = state.scene().clone();
        gestures
            .update(&mut state, Vec2::new(999.0, 999.0), 1.0)
            .unwrap();
        assert_eq!(state.scene(), &before);
    }

    #[test]
    fn rotation_handle_sets_absolute_angle() {
        let mut state = EditorState::new();
        state.set_text_pos(Vec2::new(640.0, 400.0)).unwrap();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::TextRotate, Vec2::new(640.0, 300.0));
        // handle straight above the anchor: 0 degrees
        gestures
            .update(&mut state, Vec2::new(640.0, 300.0), 1.0)
            .unwrap();
        assert!(state.scene().text.rotation_deg.abs() < 1e-9);

        // handle straight right of the anchor: 90 degrees
        gestures
            .update(&mut state, Vec2::new(740.0, 400.0), 1.0)
            .unwrap();
        assert!((state.scene().text.rotation_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_accounts_for_display_scale() {
        let mut state = EditorState::new();
        state.set_text_pos(Vec2::new(640.0, 400.0)).unwrap();
        let mut gestures = GestureController::new();

        // half-size preview: anchor appears at (320, 200)
        gestures.begin(GestureTarget::TextRotate, Vec2::new(320.0, 100.0));
        gestures
            .update(&mut state, Vec2::new(320.0, 100.0), 0.5)
            .unwrap();
        assert!(state.scene().text.rotation_deg.abs() < 1e-9);
    }

    #[test]
    fn focus_drag_without_badge_is_ignored() {
        let mut state = EditorState::new();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::Focus, Vec2::ZERO);
        gestures
            .update(&mut state, Vec2::new(10.0, 10.0), 1.0)
            .unwrap();
        assert!(state.scene().focus.is_none());
    }

    #[test]
    fn restarting_a_gesture_resets_the_reference_point() {
        let mut state = EditorState::new();
        let mut gestures = GestureController::new();

        gestures.begin(GestureTarget::Arrow, Vec2::new(0.0, 0.0));
        gestures
            .update(&mut state, Vec2::new(10.0, 0.0), 1.0)
            .unwrap();
        gestures.end();

        // new press far away must not teleport the target
        gestures.begin(GestureTarget::Arrow, Vec2::new(500.0, 500.0));
        gestures
            .update(&mut state, Vec2::new(505.0, 500.0), 1.0)
            .unwrap();
        assert_eq!(state.scene().arrow.pos, Vec2::new(815.0, 400.0));
    }
}
