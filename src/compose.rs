//! Pure compositing math shared by preview layering and the export
//! rasterizer, so the two paths cannot silently diverge.
//!
//! Everything here is a function of scene values only; no pixels, no IO.

use kurbo::Shape as _;

use crate::{
    core::{Affine, BezPath, Canvas, Point, Vec2},
    model::{LINE_HEIGHT, PADDING_X, TextAlign},
};

/// Flattening tolerance for circles and stroke expansion, in canvas px.
const PATH_TOLERANCE: f64 = 0.1;

/// Maximum pan offset magnitude per axis at the given zoom.
///
/// At zoom `z` the base image overhangs the canvas by `dim*(z-1)` in total,
/// so the center may shift by half of that before background shows.
pub fn max_offset(canvas: Canvas, zoom: f64) -> Vec2 {
    let z = zoom.max(1.0);
    Vec2::new(
        f64::from(canvas.width) * (z - 1.0) / 2.0,
        f64::from(canvas.height) * (z - 1.0) / 2.0,
    )
}

/// Clamp a pan offset so the zoomed base image fully covers the canvas.
pub fn clamp_offset(offset: Vec2, zoom: f64, canvas: Canvas) -> Vec2 {
    let max = max_offset(canvas, zoom);
    Vec2::new(
        offset.x.clamp(-max.x, max.x),
        offset.y.clamp(-max.y, max.y),
    )
}

/// Ratio of an on-screen preview width to the logical canvas width.
///
/// Screen-space drag deltas are divided by this to land in canvas space.
pub fn display_scale(canvas: Canvas, rendered_width: f64) -> f64 {
    rendered_width / f64::from(canvas.width)
}

/// Pan/zoom transform for the base image: scale about the canvas center,
/// then shift by the pan offset. Input space is the canvas footprint the
/// image is stretched to before transforming.
pub fn base_transform(canvas: Canvas, offset: Vec2, zoom: f64) -> Affine {
    let c = canvas.center();
    Affine::translate(offset + c.to_vec2()) * Affine::scale(zoom) * Affine::translate(-c.to_vec2())
}

/// Stretch an image of native size `(w, h)` onto the full canvas footprint.
pub fn fit_to_canvas(canvas: Canvas, image_width: u32, image_height: u32) -> Affine {
    Affine::scale_non_uniform(
        f64::from(canvas.width) / f64::from(image_width.max(1)),
        f64::from(canvas.height) / f64::from(image_height.max(1)),
    )
}

/// Stretch an image of native size `(w, h)` onto the bounding square of a
/// circular overlay at `pos` (top-left) with the given diameter.
pub fn fit_to_circle_box(pos: Vec2, diameter: f64, image_width: u32, image_height: u32) -> Affine {
    Affine::translate(pos)
        * Affine::scale_non_uniform(
            diameter / f64::from(image_width.max(1)),
            diameter / f64::from(image_height.max(1)),
        )
}

/// Circle outline with center and diameter, as a fillable path.
pub fn circle_path(center: Vec2, diameter: f64) -> BezPath {
    kurbo::Circle::new(Point::new(center.x, center.y), diameter / 2.0).to_path(PATH_TOLERANCE)
}

/// Expand a stroked path into a fillable outline.
pub fn stroke_outline(path: &BezPath, width: f64) -> BezPath {
    let style = kurbo::Stroke::new(width).with_join(kurbo::Join::Round);
    kurbo::stroke(
        path.iter(),
        &style,
        &kurbo::StrokeOpts::default(),
        PATH_TOLERANCE,
    )
}

/// The arrow artwork: a vertical shaft with a triangular head, authored
/// pointing up in a 60x120 local box centered on the anchor.
pub fn arrow_path() -> BezPath {
    let mut p = BezPath::new();
    p.move_to((0.0, -60.0));
    p.line_to((30.0, 0.0));
    p.line_to((12.0, 0.0));
    p.line_to((12.0, 60.0));
    p.line_to((-12.0, 60.0));
    p.line_to((-12.0, 0.0));
    p.line_to((-30.0, 0.0));
    p.close_path();
    p
}

/// Placement of the arrow artwork: anchor translation, derived rotation,
/// uniform scale.
pub fn arrow_transform(pos: Vec2, angle_deg: f64, scale: f64) -> Affine {
    Affine::translate(pos) * Affine::rotate(angle_deg.to_radians()) * Affine::scale(scale)
}

/// Placement of the whole text block before per-line layout.
pub fn text_block_transform(pos: Vec2, rotation_deg: f64) -> Affine {
    Affine::translate(pos) * Affine::rotate(rotation_deg.to_radians())
}

/// Vertical offset of a line, counting up from the anchor: index 0 is the
/// last line (nearest the anchor), earlier lines stack above.
pub fn line_offset_y(line_index_from_bottom: usize, size_px: f64) -> f64 {
    -(line_index_from_bottom as f64) * size_px * LINE_HEIGHT
}

/// Horizontal anchor an alignment selection snaps the text block to.
pub fn align_anchor_x(align: TextAlign, canvas: Canvas) -> f64 {
    let w = f64::from(canvas.width);
    match align {
        TextAlign::Left => PADDING_X,
        TextAlign::Center => w / 2.0,
        TextAlign::Right => w - PADDING_X,
    }
}

/// Horizontal offset of a measured line relative to the block anchor.
pub fn line_x_offset(align: TextAlign, line_width: f64) -> f64 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -line_width / 2.0,
        TextAlign::Right => -line_width,
    }
}

/// Gaussian parameters approximating a canvas-style `shadowBlur` value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowParams {
    pub radius: u32,
    pub sigma: f32,
}

pub fn glow_params(shadow_blur: f64) -> GlowParams {
    let radius = shadow_blur.max(0.0).round() as u32;
    GlowParams {
        radius,
        sigma: (radius as f32 / 2.0).max(0.5),
    }
}
