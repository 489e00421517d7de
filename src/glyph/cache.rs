use super::{build_bitmap, AlphaPolicy, CacheKey, ContentBitmap, GlyphSource, TextStyle};
use std::rc::Rc;

/// Single-slot bitmap cache.
///
/// Holds the last built bitmap and rebuilds only when the key changes.
/// The rebuild counter lets callers observe cache hits.
#[derive(Debug, Default)]
pub struct BitmapCache {
    slot: Option<(CacheKey, Rc<ContentBitmap>)>,
    rebuilds: u64,
}

impl BitmapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        source: &dyn GlyphSource,
        text: &str,
        style: &TextStyle,
        policy: AlphaPolicy,
    ) -> Rc<ContentBitmap> {
        let key = CacheKey::new(text, style, policy);
        if let Some((cached, bitmap)) = &self.slot {
            if *cached == key {
                return Rc::clone(bitmap);
            }
        }

        let bitmap = Rc::new(build_bitmap(source, text, style, policy));
        self.rebuilds += 1;
        log::debug!(
            "built bitmap {}x{} for {text:?} (rebuild #{})",
            bitmap.width(),
            bitmap.height(),
            self.rebuilds
        );
        self.slot = Some((key, Rc::clone(&bitmap)));
        bitmap
    }

    /// Number of times a bitmap was actually built
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
