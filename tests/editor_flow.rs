//! End-to-end editing scenarios through the public API: standardize a base
//! image, drag overlays around, and rasterize the result.

use std::io::Cursor;

use thumbsmith::{
    AssetStore, Compositor, EditorState, FailureClass, Gate, GestureController, GestureTarget,
    ImageStandardizer, ServiceError, StandardizeOutcome, StandardizeRequest, TextAlign, Vec2,
};

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn pixel(frame: &thumbsmith::FrameRgba, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * frame.width + x) * 4) as usize;
    frame.data[idx..idx + 4].try_into().unwrap()
}

struct OkStandardizer(Vec<u8>);

impl ImageStandardizer for OkStandardizer {
    fn standardize(&self, _req: &StandardizeRequest) -> Result<StandardizeOutcome, ServiceError> {
        Ok(StandardizeOutcome {
            image_png: Some(self.0.clone()),
        })
    }
}

struct RefusingStandardizer;

impl ImageStandardizer for RefusingStandardizer {
    fn standardize(&self, _req: &StandardizeRequest) -> Result<StandardizeOutcome, ServiceError> {
        Ok(StandardizeOutcome::default())
    }
}

#[test]
fn standardize_then_edit_then_render() {
    let mut state = EditorState::new();
    let mut assets = AssetStore::new();
    let gate = Gate::new("standardize");

    // A user image goes through the standardizer and lands as the base.
    let standardizer = OkStandardizer(png_bytes(64, 36, [40, 80, 120, 255]));
    thumbsmith::service::standardize_action(
        &standardizer,
        &gate,
        &mut state,
        &mut assets,
        "base",
        &StandardizeRequest {
            image: png_bytes(10, 30, [1, 1, 1, 255]),
            mime: "image/png".to_string(),
        },
    )
    .unwrap();
    assert_eq!(state.scene().base.as_deref(), Some("base"));
    assert_eq!(state.scene().zoom, 1.0);

    // Zoom in and drag the view; the pan clamp keeps the image covering.
    state.set_zoom(2.0).unwrap();
    let mut gestures = GestureController::new();
    gestures.begin(GestureTarget::Pan, Vec2::new(0.0, 0.0));
    gestures
        .update(&mut state, Vec2::new(9_999.0, 0.0), 1.0)
        .unwrap();
    gestures.end();
    assert_eq!(state.scene().offset, Vec2::new(640.0, 0.0));

    // Show the highlight and drag it somewhere else.
    state.set_circle_visible(true);
    gestures.begin(GestureTarget::Circle, Vec2::new(100.0, 100.0));
    gestures
        .update(&mut state, Vec2::new(150.0, 120.0), 1.0)
        .unwrap();
    gestures.end();
    assert_eq!(state.scene().circle.pos, Vec2::new(590.0, 280.0));

    let mut compositor = Compositor::new();
    let frame = compositor.render(state.scene(), &assets).unwrap();
    assert_eq!((frame.width, frame.height), (1280, 720));

    // Outside the highlight the base color is untouched.
    assert_eq!(pixel(&frame, 50, 650), [40, 80, 120, 255]);
    // Inside the highlight (center moved to (765, 405)) it is brighter.
    let inside = pixel(&frame, 765, 405);
    assert!(inside[0] > 40 && inside[1] > 80 && inside[2] > 120, "got {inside:?}");
}

#[test]
fn refused_standardize_leaves_the_editor_untouched() {
    let mut state = EditorState::new();
    let mut assets = AssetStore::new();
    let gate = Gate::new("standardize");

    let err = thumbsmith::service::standardize_action(
        &RefusingStandardizer,
        &gate,
        &mut state,
        &mut assets,
        "base",
        &StandardizeRequest {
            image: png_bytes(2, 2, [0, 0, 0, 255]),
            mime: "image/png".to_string(),
        },
    )
    .unwrap_err();

    assert_eq!(err.failure_class(), Some(FailureClass::Safety));
    assert!(state.scene().base.is_none());
    assert!(assets.image("base").is_err());
    assert!(!gate.is_busy());
}

#[test]
fn alignment_buttons_snap_the_title_anchor() {
    let mut state = EditorState::new();
    state.set_text_content("TITLE");
    state.set_text_pos(Vec2::new(300.0, 480.0)).unwrap();

    state.set_alignment(TextAlign::Left);
    assert_eq!(state.scene().text.pos, Vec2::new(20.0, 480.0));
    state.set_alignment(TextAlign::Right);
    assert_eq!(state.scene().text.pos, Vec2::new(1260.0, 480.0));
}

#[test]
fn arrow_tracks_the_focus_badge_across_drags() {
    let mut state = EditorState::new();
    state.set_arrow_visible(true);
    state.attach_focus("badge").unwrap();
    let mut gestures = GestureController::new();

    // badge center starts at (550, 350); put the arrow right below it
    state.set_arrow_pos(Vec2::new(550.0, 600.0)).unwrap();
    assert!(state.scene().arrow_angle_deg().abs() < 1e-9);

    // dragging the badge to the right swings the derived angle with it
    gestures.begin(GestureTarget::Focus, Vec2::new(0.0, 0.0));
    gestures
        .update(&mut state, Vec2::new(300.0, 0.0), 1.0)
        .unwrap();
    gestures.end();
    let angle = state.scene().arrow_angle_deg();
    assert!(angle > 0.0 && angle < 90.0, "got {angle}");
}

#[test]
fn full_scene_with_text_renders_when_a_font_is_available() {
    let Ok(font) = std::fs::read("tests/data/fonts/DejaVuSans.ttf") else {
        return;
    };

    let mut state = EditorState::new();
    let mut assets = AssetStore::new();
    assets
        .insert_image_bytes("base", &png_bytes(32, 18, [20, 20, 20, 255]))
        .unwrap();
    assets.insert_font_bytes("font", font);

    state.set_base("base").unwrap();
    state.set_font_source("font");
    // a narrow first line over a wide last line, so the pixel columns tell
    // the two lines apart
    state.set_text_content("I\nMMMMMM");
    state.set_alignment(TextAlign::Left);
    // the arrow's white outline would pollute the white-pixel scan below
    state.set_circle_visible(true);

    let mut compositor = Compositor::new();
    let frame = compositor.render(state.scene(), &assets).unwrap();

    // the default style fills white: collect every near-white pixel
    let mut min_y = u32::MAX;
    let mut max_y = 0u32;
    let mut pixels = Vec::new();
    for (i, p) in frame.data.chunks_exact(4).enumerate() {
        if p[0] > 220 && p[1] > 220 && p[2] > 220 {
            let x = i as u32 % frame.width;
            let y = i as u32 / frame.width;
            min_y = min_y.min(y);
            max_y = max_y.max(y);
            pixels.push((x, y));
        }
    }
    assert!(!pixels.is_empty(), "no text pixels rendered");

    // lines stack upward from the anchor: the last line ("MMMMMM", wide)
    // sits at the bottom, the first line ("I", narrow) above it
    let span = max_y - min_y;
    let top_cut = min_y + span / 4;
    let bottom_cut = max_y - span / 4;
    let top_max_x = pixels
        .iter()
        .filter(|&&(_, y)| y <= top_cut)
        .map(|&(x, _)| x)
        .max()
        .unwrap();
    let bottom_max_x = pixels
        .iter()
        .filter(|&&(_, y)| y >= bottom_cut)
        .map(|&(x, _)| x)
        .max()
        .unwrap();
    assert!(
        bottom_max_x > top_max_x + 100,
        "wide last line not at the bottom: top_max_x={top_max_x}, bottom_max_x={bottom_max_x}"
    );
    // the block is bottom-anchored at y=720
    assert!(max_y > 640, "text band ends at {max_y}, expected near the anchor");
}
