use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context as _;

use crate::{
    error::{ThumbError, ThumbResult},
    model::Scene,
};

/// Decoded raster image in row-major premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode any browser-decodable image format into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ThumbResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in 0..3 {
            px[c] = ((u16::from(px[c]) * a + 127) / 255) as u8;
        }
    }
}

/// In-memory images and font bytes keyed by the scene's asset keys.
///
/// Keys are opaque strings; when a scene is loaded from disk they are file
/// paths relative to the scene file, but the standardize action installs
/// AI-produced images under the same keys without touching the filesystem.
#[derive(Default)]
pub struct AssetStore {
    images: HashMap<String, PreparedImage>,
    fonts: HashMap<String, Arc<Vec<u8>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load everything the scene references from files under `root`.
    pub fn prepare(scene: &Scene, root: &Path) -> ThumbResult<Self> {
        let mut store = Self::new();
        if let Some(base) = &scene.base {
            store.load_image_file(base, root)?;
        }
        if let Some(focus) = &scene.focus {
            store.load_image_file(&focus.image, root)?;
        }
        if !scene.text.content.trim().is_empty() {
            store.load_font_file(&scene.text.font_source, root)?;
        }
        Ok(store)
    }

    fn load_image_file(&mut self, key: &str, root: &Path) -> ThumbResult<()> {
        let path = root.join(key);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        self.insert_image_bytes(key, &bytes)
    }

    fn load_font_file(&mut self, key: &str, root: &Path) -> ThumbResult<()> {
        if key.trim().is_empty() {
            return Err(ThumbError::asset(
                "scene has text but no font_source is set",
            ));
        }
        let path = root.join(key);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
        self.insert_font_bytes(key, bytes);
        Ok(())
    }

    /// Decode and register image bytes under `key`, replacing any previous
    /// image with that key.
    pub fn insert_image_bytes(&mut self, key: &str, bytes: &[u8]) -> ThumbResult<()> {
        let prepared = decode_image(bytes)?;
        self.images.insert(key.to_string(), prepared);
        Ok(())
    }

    pub fn insert_image(&mut self, key: &str, image: PreparedImage) {
        self.images.insert(key.to_string(), image);
    }

    pub fn insert_font_bytes(&mut self, key: &str, bytes: Vec<u8>) {
        self.fonts.insert(key.to_string(), Arc::new(bytes));
    }

    pub fn image(&self, key: &str) -> ThumbResult<&PreparedImage> {
        self.images
            .get(key)
            .ok_or_else(|| ThumbError::asset(format!("missing image asset '{key}'")))
    }

    pub fn font(&self, key: &str) -> ThumbResult<Arc<Vec<u8>>> {
        self.fonts
            .get(key)
            .cloned()
            .ok_or_else(|| ThumbError::asset(format!("missing font asset '{key}'")))
    }
}
