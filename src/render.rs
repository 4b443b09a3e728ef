//! The export rasterizer: layers the full composition into one premultiplied
//! RGBA8 frame at the logical canvas resolution.
//!
//! Vector and image drawing go through `vello_cpu` passes; glows, drop
//! shadows and the brightness filter are pixel passes from [`crate::fx`]
//! composited between them. Layer order is load-bearing: backdrop, base
//! image, focus badge, circular highlight, arrow, text.

use crate::{
    assets::{AssetStore, PreparedImage},
    compose,
    core::{Affine, BezPath, Canvas, Rgba8, Vec2},
    error::{ThumbError, ThumbResult},
    fx,
    model::{
        ACCENT_RED, ARROW_GLOW_BLUR, ARROW_OUTLINE_WIDTH, HIGHLIGHT_BRIGHTNESS_BOOST,
        RING_GLOW_BLUR, RING_STROKE_WIDTH, Scene, TEXT_SHADOW_COLOR, TEXT_STROKE_FACTOR,
    },
    text::{ShapedLine, TextEngine},
};

/// One rasterized frame.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 bytes.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Rasterizes [`Scene`] snapshots. Owns the text shaping contexts so repeated
/// renders reuse them.
#[derive(Default)]
pub struct Compositor {
    text: TextEngine,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the authoritative raster of the composition.
    #[tracing::instrument(skip_all, fields(w = scene.canvas.width, h = scene.canvas.height))]
    pub fn render(&mut self, scene: &Scene, assets: &AssetStore) -> ThumbResult<FrameRgba> {
        scene.validate()?;
        let (w16, h16) = surface_dims(scene.canvas)?;
        let mut frame = vello_cpu::Pixmap::new(w16, h16);

        self.draw_backdrop(scene, assets, &mut frame, w16, h16)?;
        if let Some(focus) = scene.focus.clone() {
            self.draw_focus_badge(&focus, assets, &mut frame, w16, h16)?;
        }
        if scene.circle.visible && scene.base.is_some() {
            self.draw_highlight(scene, assets, &mut frame, w16, h16)?;
        }
        if scene.arrow.visible {
            self.draw_arrow(scene, &mut frame, w16, h16)?;
        }
        if !scene.text.content.trim().is_empty() {
            self.draw_text(scene, assets, &mut frame, w16, h16)?;
        }

        Ok(FrameRgba {
            width: scene.canvas.width,
            height: scene.canvas.height,
            data: frame.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    /// Opaque black fill, then the base image panned/zoomed to cover the
    /// canvas, then the brightness filter over the whole pass.
    fn draw_backdrop(
        &mut self,
        scene: &Scene,
        assets: &AssetStore,
        frame: &mut vello_cpu::Pixmap,
        w16: u16,
        h16: u16,
    ) -> ThumbResult<()> {
        let canvas = scene.canvas;
        render_onto(frame, w16, h16, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(Rgba8::opaque(0, 0, 0).to_peniko());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(canvas.width),
                f64::from(canvas.height),
            ));

            if let Some(key) = &scene.base {
                let img = assets.image(key)?;
                let tf = compose::base_transform(canvas, scene.offset, scene.zoom)
                    * compose::fit_to_canvas(canvas, img.width, img.height);
                draw_image(ctx, img, tf)?;
            }
            Ok(())
        })?;

        if (scene.brightness - 1.0).abs() > 1e-9 {
            fx::brighten_in_place(frame.data_as_u8_slice_mut(), scene.brightness)?;
        }
        Ok(())
    }

    /// Badge image clipped to its circle, then the red ring and its glow on
    /// top.
    fn draw_focus_badge(
        &mut self,
        focus: &crate::model::FocusBadge,
        assets: &AssetStore,
        frame: &mut vello_cpu::Pixmap,
        w16: u16,
        h16: u16,
    ) -> ThumbResult<()> {
        let circle = compose::circle_path(focus.center(), focus.diameter);
        let ring = compose::stroke_outline(&circle, RING_STROKE_WIDTH);

        let img = assets.image(&focus.image)?;
        render_onto(frame, w16, h16, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.push_clip_layer(&bezpath_to_cpu(&circle));
            let tf = compose::fit_to_circle_box(focus.pos, focus.diameter, img.width, img.height);
            draw_image(ctx, img, tf)?;
            ctx.pop_layer();
            Ok(())
        })?;

        glow_onto(frame, w16, h16, RING_GLOW_BLUR, accent_rgb(), |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            fill_path(ctx, &ring, ACCENT_RED);
            Ok(())
        })?;
        render_onto(frame, w16, h16, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            fill_path(ctx, &ring, ACCENT_RED);
            Ok(())
        })
    }

    /// The base image seen again through a circular window at boosted
    /// brightness, under the same pan/zoom transform as the backdrop so the
    /// window content lines up pixel-exactly with what it covers.
    fn draw_highlight(
        &mut self,
        scene: &Scene,
        assets: &AssetStore,
        frame: &mut vello_cpu::Pixmap,
        w16: u16,
        h16: u16,
    ) -> ThumbResult<()> {
        let canvas = scene.canvas;
        let circle = compose::circle_path(scene.circle_center(), scene.circle.diameter);
        let ring = compose::stroke_outline(&circle, RING_STROKE_WIDTH);
        let base_key = scene
            .base
            .as_ref()
            .ok_or_else(|| ThumbError::render("highlight requires a base image"))?;
        let img = assets.image(base_key)?;

        let mut window = render_pass(w16, h16, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.push_clip_layer(&bezpath_to_cpu(&circle));
            let tf = compose::base_transform(canvas, scene.offset, scene.zoom)
                * compose::fit_to_canvas(canvas, img.width, img.height);
            draw_image(ctx, img, tf)?;
            ctx.pop_layer();
            Ok(())
        })?;
        fx::brighten_in_place(
            window.data_as_u8_slice_mut(),
            scene.brightness * HIGHLIGHT_BRIGHTNESS_BOOST,
        )?;
        fx::over_in_place(frame.data_as_u8_slice_mut(), window.data_as_u8_slice())?;

        glow_onto(frame, w16, h16, RING_GLOW_BLUR, accent_rgb(), |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            fill_path(ctx, &ring, ACCENT_RED);
            Ok(())
        })?;
        render_onto(frame, w16, h16, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            fill_path(ctx, &ring, ACCENT_RED);
            Ok(())
        })
    }

    /// Red arrow with white outline, rotated to the derived angle, over a red
    /// glow of its silhouette.
    fn draw_arrow(
        &mut self,
        scene: &Scene,
        frame: &mut vello_cpu::Pixmap,
        w16: u16,
        h16: u16,
    ) -> ThumbResult<()> {
        let tf = compose::arrow_transform(
            scene.arrow.pos,
            scene.arrow_angle_deg(),
            scene.arrow.scale,
        );
        let shaft = compose::arrow_path();
        let outline = compose::stroke_outline(&shaft, ARROW_OUTLINE_WIDTH);

        let draw = |ctx: &mut vello_cpu::RenderContext| -> ThumbResult<()> {
            ctx.set_transform(affine_to_cpu(tf));
            fill_path(ctx, &shaft, ACCENT_RED);
            fill_path(ctx, &outline, Rgba8::opaque(255, 255, 255));
            Ok(())
        };

        glow_onto(frame, w16, h16, ARROW_GLOW_BLUR, accent_rgb(), draw)?;
        render_onto(frame, w16, h16, draw)
    }

    /// Upper-cased lines stacked bottom-to-top from the anchor; per line a
    /// blurred drop shadow, a thick rounded stroke, then the fill on top.
    fn draw_text(
        &mut self,
        scene: &Scene,
        assets: &AssetStore,
        frame: &mut vello_cpu::Pixmap,
        w16: u16,
        h16: u16,
    ) -> ThumbResult<()> {
        let block = &scene.text;
        let font_bytes = assets.font(&block.font_source)?;
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        let style = block.style.style();
        let stroke_width = block.outline_width * TEXT_STROKE_FACTOR;
        let block_tf = compose::text_block_transform(block.pos, block.rotation_deg);

        let upper = block.content.to_uppercase();
        let mut placed: Vec<(ShapedLine, Affine)> = Vec::new();
        for (idx, line) in upper.split('\n').rev().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let shaped = self
                .text
                .shape_line(line, &font_bytes, block.size_px as f32)?;
            let x = compose::line_x_offset(block.align, shaped.width);
            // Bottom-baseline anchoring: the layout box bottom lands on the
            // line's anchor row.
            let y = compose::line_offset_y(idx, block.size_px) - shaped.height;
            placed.push((shaped, block_tf * Affine::translate(Vec2::new(x, y))));
        }
        if placed.is_empty() {
            return Ok(());
        }

        // Drop shadow: the stroked silhouette of every line, faded and
        // blurred, beneath the crisp passes.
        let mut shadow = render_pass(w16, h16, |ctx| {
            set_text_stroke(ctx, stroke_width);
            ctx.set_paint(Rgba8::opaque(0, 0, 0).to_peniko());
            for (shaped, tf) in &placed {
                ctx.set_transform(affine_to_cpu(*tf));
                draw_glyphs(ctx, &font, shaped, GlyphPass::Stroke);
            }
            Ok(())
        })?;
        fx::tint_in_place(shadow.data_as_u8_slice_mut(), [0, 0, 0])?;
        fx::fade_in_place(
            shadow.data_as_u8_slice_mut(),
            f64::from(TEXT_SHADOW_COLOR.a) / 255.0,
        )?;
        let glow = compose::glow_params(block.shadow_blur);
        let blurred = fx::blur_rgba8_premul(
            shadow.data_as_u8_slice(),
            u32::from(w16),
            u32::from(h16),
            glow.radius,
            glow.sigma,
        )?;
        fx::over_in_place(frame.data_as_u8_slice_mut(), &blurred)?;

        render_onto(frame, w16, h16, |ctx| {
            set_text_stroke(ctx, stroke_width);
            for (shaped, tf) in &placed {
                ctx.set_transform(affine_to_cpu(*tf));
                ctx.set_paint(style.stroke.to_peniko());
                draw_glyphs(ctx, &font, shaped, GlyphPass::Stroke);
                ctx.set_paint(style.fill.to_peniko());
                draw_glyphs(ctx, &font, shaped, GlyphPass::Fill);
            }
            Ok(())
        })
    }
}

#[derive(Clone, Copy)]
enum GlyphPass {
    Fill,
    Stroke,
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    shaped: &ShapedLine,
    pass: GlyphPass,
) {
    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx.glyph_run(font).font_size(run.run().font_size());
            match pass {
                GlyphPass::Fill => builder.fill_glyphs(glyphs),
                GlyphPass::Stroke => builder.stroke_glyphs(glyphs),
            }
        }
    }
}

fn set_text_stroke(ctx: &mut vello_cpu::RenderContext, width: f64) {
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width).with_join(vello_cpu::kurbo::Join::Round));
}

fn fill_path(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Rgba8) {
    ctx.set_paint(color.to_peniko());
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &PreparedImage,
    transform: Affine,
) -> ThumbResult<()> {
    let paint = image_paint(img)?;
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(img.width),
        f64::from(img.height),
    ));
    Ok(())
}

fn image_paint(img: &PreparedImage) -> ThumbResult<vello_cpu::Image> {
    let pixmap = image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ThumbResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ThumbError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ThumbError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ThumbError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

const fn accent_rgb() -> [u8; 3] {
    [ACCENT_RED.r, ACCENT_RED.g, ACCENT_RED.b]
}

fn surface_dims(canvas: Canvas) -> ThumbResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| ThumbError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| ThumbError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

/// Run one vector pass into a fresh transparent pixmap.
fn render_pass<F>(w16: u16, h16: u16, draw: F) -> ThumbResult<vello_cpu::Pixmap>
where
    F: FnOnce(&mut vello_cpu::RenderContext) -> ThumbResult<()>,
{
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    draw(&mut ctx)?;
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap)
}

/// Run one vector pass compositing over the existing pixmap content.
/// `render_to_pixmap` rasterizes the whole buffer (uncovered pixels become
/// transparent), so the pass goes into a fresh pixmap and is blended over.
fn render_onto<F>(target: &mut vello_cpu::Pixmap, w16: u16, h16: u16, draw: F) -> ThumbResult<()>
where
    F: FnOnce(&mut vello_cpu::RenderContext) -> ThumbResult<()>,
{
    let pass = render_pass(w16, h16, draw)?;
    fx::over_in_place(target.data_as_u8_slice_mut(), pass.data_as_u8_slice())
}

/// Draw a pass, recolor its silhouette to the glow color, blur it and
/// composite it under whatever the caller draws next.
fn glow_onto<F>(
    frame: &mut vello_cpu::Pixmap,
    w16: u16,
    h16: u16,
    blur: f64,
    rgb: [u8; 3],
    draw: F,
) -> ThumbResult<()>
where
    F: FnOnce(&mut vello_cpu::RenderContext) -> ThumbResult<()>,
{
    let mut scratch = render_pass(w16, h16, draw)?;
    fx::tint_in_place(scratch.data_as_u8_slice_mut(), rgb)?;
    let glow = compose::glow_params(blur);
    let blurred = fx::blur_rgba8_premul(
        scratch.data_as_u8_slice(),
        u32::from(w16),
        u32::from(h16),
        glow.radius,
        glow.sigma,
    )?;
    fx::over_in_place(frame.data_as_u8_slice_mut(), &blurred)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
