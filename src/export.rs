//! Full-quality PNG export of the current composition.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;

use crate::{
    assets::AssetStore,
    error::ThumbResult,
    model::Scene,
    render::{Compositor, FrameRgba},
    service::Gate,
};

/// Generated download filename, unique per wall-clock millisecond.
pub fn export_filename() -> ThumbResult<String> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_millis();
    Ok(format!("THUMB_PRO_{millis}.png"))
}

/// Render the scene at full canvas resolution and write it as a PNG under
/// `out_dir`, returning the written path.
///
/// Guarded by `gate`: a second export while one is running fails fast with
/// a busy error rather than queueing.
#[tracing::instrument(skip_all, fields(out = %out_dir.display()))]
pub fn export_scene(
    compositor: &mut Compositor,
    gate: &Gate,
    scene: &Scene,
    assets: &AssetStore,
    out_dir: &Path,
) -> ThumbResult<PathBuf> {
    let _guard = gate.try_acquire()?;

    let frame = compositor.render(scene, assets)?;
    let path = out_dir.join(export_filename()?);
    write_png(&frame, &path)?;
    tracing::info!(path = %path.display(), "exported thumbnail");
    Ok(path)
}

/// Write one rendered frame as an RGBA8 PNG.
pub fn write_png(frame: &FrameRgba, path: &Path) -> ThumbResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
