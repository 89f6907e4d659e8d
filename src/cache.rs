use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::error::{DriftwallError, DriftwallResult};

/// Decoded raster in premultiplied RGBA8, row-major, tightly packed.
/// Immutable once decoded; shared between cache and compositor by `Arc`.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Bounded image store with strict least-recently-used eviction.
///
/// Playlists reference a small, slowly rotating working set (the current
/// still, or the two endpoints of the active transition), so a shallow LRU
/// keeps everything the compositor needs resident without unbounded growth.
/// Both reads and inserts count as use.
pub struct ImageCache {
    capacity: usize,
    images: HashMap<PathBuf, DecodedImage>,
    // Recency order, least recently used first. Small enough that a vector
    // beats anything cleverer.
    order: Vec<PathBuf>,
    decode_counts: HashMap<PathBuf, u64>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            images: HashMap::new(),
            order: Vec::new(),
            decode_counts: HashMap::new(),
        }
    }

    /// Return the decoded image for `path`, decoding on first reference.
    ///
    /// A hit only touches recency. A miss decodes, inserts as most recently
    /// used, and evicts exactly one LRU entry if the capacity is breached.
    /// A failed decode leaves the cache untouched so the caller keeps
    /// whatever was previously displayed.
    pub fn get_or_load(&mut self, path: &Path) -> DriftwallResult<DecodedImage> {
        if let Some(img) = self.images.get(path) {
            let img = img.clone();
            self.touch(path);
            return Ok(img);
        }

        let img = decode_image_file(path)?;
        *self.decode_counts.entry(path.to_path_buf()).or_insert(0) += 1;

        self.images.insert(path.to_path_buf(), img.clone());
        self.order.push(path.to_path_buf());
        if self.images.len() > self.capacity {
            let oldest = self.order.remove(0);
            self.images.remove(&oldest);
        }

        Ok(img)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.images.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// How many times `path` has been decoded since construction. Survives
    /// eviction; meant for tests and diagnostics.
    pub fn decode_count(&self, path: &Path) -> u64 {
        self.decode_counts.get(path).copied().unwrap_or(0)
    }

    fn touch(&mut self, path: &Path) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            let key = self.order.remove(pos);
            self.order.push(key);
        }
    }
}

/// Decode an image file to premultiplied RGBA8.
pub fn decode_image_file(path: &Path) -> DriftwallResult<DecodedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(|e| DriftwallError::image_load(format!("{e:#}")))?;
    decode_image(&bytes)
        .map_err(|e| DriftwallError::image_load(format!("decode '{}': {e}", path.display())))
}

fn decode_image(bytes: &[u8]) -> DriftwallResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| DriftwallError::image_load(e.to_string()))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
