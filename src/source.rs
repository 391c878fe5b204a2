//! Collaborator contract between the pipeline and whatever decodes the document.
//!
//! The pipeline never touches PDF structure directly. It asks a
//! [`RosterDocument`] for positioned text runs and image handles page by page,
//! resolves handles into [`RasterImage`]s, and hands finished pixels to a
//! [`JpegCodec`].

use std::fmt;

use image::RgbaImage;

use crate::error::Result;

/// A chunk of text drawn on a page together with the cues used to find names.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTextRun {
    pub text: String,
    /// Effective font size of the run.
    pub emphasis: f32,
    /// Baseline position in page space.
    pub y: f32,
    pub page_index: usize,
}

impl PositionedTextRun {
    pub fn new(text: impl Into<String>, emphasis: f32, y: f32, page_index: usize) -> Self {
        Self {
            text: text.into(),
            emphasis,
            y,
            page_index,
        }
    }
}

/// Opaque reference to an image paint operation on a page.
///
/// `name` is the resource name used by the paint operator. Backends that can
/// address the image object directly also record its object number, which is
/// what lets images painted inside nested forms be resolved later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    name: String,
    object: Option<(u64, u64)>,
}

impl ImageHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object: None,
        }
    }

    /// Handle for the indirect object `id gen R`.
    pub fn with_object(name: impl Into<String>, id: u64, generation: u64) -> Self {
        Self {
            name: name.into(),
            object: Some((id, generation)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> Option<(u64, u64)> {
        self.object
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object {
            Some((id, generation)) => write!(f, "{} ({} {} R)", self.name, id, generation),
            None => f.write_str(&self.name),
        }
    }
}

/// Pixel payload of a decoded image.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelSource {
    /// Already decoded into RGBA, e.g. from an embedded JPEG stream.
    Bitmap(RgbaImage),
    /// Raw 8-bit samples with 1 (gray) or 3 (RGB) samples per pixel.
    Samples { data: Vec<u8>, channels: u8 },
}

/// An embedded raster image resolved from a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub source: PixelSource,
}

impl RasterImage {
    pub fn from_samples(width: u32, height: u32, data: Vec<u8>, channels: u8) -> Self {
        Self {
            width,
            height,
            source: PixelSource::Samples { data, channels },
        }
    }

    pub fn from_bitmap(bitmap: RgbaImage) -> Self {
        Self {
            width: bitmap.width(),
            height: bitmap.height(),
            source: PixelSource::Bitmap(bitmap),
        }
    }
}

/// Page-level access to a roster document.
///
/// Implementations may suspend on every call; the session awaits them strictly
/// in document order and never overlaps two calls.
#[allow(async_fn_in_trait)]
pub trait RosterDocument {
    /// Number of pages. A failure here means the document is unusable.
    async fn page_count(&self) -> Result<usize>;

    /// Text runs of a page in content-stream order.
    async fn page_text_runs(&self, page_index: usize) -> Result<Vec<PositionedTextRun>>;

    /// Image paint operations of a page in content-stream order.
    async fn page_image_operations(&self, page_index: usize) -> Result<Vec<ImageHandle>>;

    /// Decode one image. Fails with [`crate::ExtractError::ImageResolution`].
    async fn resolve_image(&self, page_index: usize, handle: &ImageHandle) -> Result<RasterImage>;
}

/// JPEG encoder used for the packaged headshots.
#[allow(async_fn_in_trait)]
pub trait JpegCodec {
    /// Encode a `width * height * 4` RGBA buffer. `quality` is in `0.0..=1.0`.
    async fn encode_jpeg(&self, rgba: &[u8], width: u32, height: u32, quality: f32)
    -> Result<Vec<u8>>;
}
