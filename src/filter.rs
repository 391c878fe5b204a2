//! Picks photo candidates out of a page's image paint operations.
//!
//! Rosters embed logos, banners and thin alpha masks next to the headshots.
//! Those are rejected by size and by aspect ratio (headshots are portrait or
//! close to square).

use crate::config::ExtractionConfig;
use crate::source::{ImageHandle, RasterImage, RosterDocument};

/// A resolved image that passed the geometric checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    /// Position of the paint operation among all image operations on the page.
    pub op_index: usize,
    pub image: RasterImage,
}

/// Size and aspect thresholds for photo candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub min_side: u32,
    pub max_aspect_ratio: f32,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl CandidateFilter {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_side: config.min_image_side,
            max_aspect_ratio: config.max_aspect_ratio,
        }
    }

    pub fn accepts(&self, width: u32, height: u32) -> bool {
        width >= self.min_side
            && height >= self.min_side
            && width as f32 <= self.max_aspect_ratio * height as f32
    }

    /// Keep the accepted images, preserving their order.
    pub fn retain(&self, images: Vec<(usize, RasterImage)>) -> Vec<ImageCandidate> {
        images
            .into_iter()
            .filter(|(op_index, image)| {
                let keep = self.accepts(image.width, image.height);
                if !keep {
                    log::debug!(
                        "image #{} rejected as decoy ({}x{})",
                        op_index,
                        image.width,
                        image.height
                    );
                }
                keep
            })
            .map(|(op_index, image)| ImageCandidate { op_index, image })
            .collect()
    }
}

/// Resolve a page's image operations in order and keep the photo candidates.
///
/// An image that fails to resolve is logged and skipped; the rest of the page
/// is still processed.
pub async fn collect_candidates<D: RosterDocument>(
    document: &D,
    page_index: usize,
    handles: &[ImageHandle],
    filter: &CandidateFilter,
) -> Vec<ImageCandidate> {
    let mut resolved = Vec::with_capacity(handles.len());
    for (op_index, handle) in handles.iter().enumerate() {
        match document.resolve_image(page_index, handle).await {
            Ok(image) => resolved.push((op_index, image)),
            Err(err) => log::warn!("page {}: skipping image {}: {}", page_index, handle, err),
        }
    }
    filter.retain(resolved)
}
