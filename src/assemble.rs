//! Turns paired (name, photo) tuples into student records and packaged JPEGs.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::archive::AssetArchive;
use crate::error::{ExtractError, Result};
use crate::filter::ImageCandidate;
use crate::segment::NameGroup;
use crate::source::{JpegCodec, PixelSource, RasterImage};

/// One extracted student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub name: String,
    #[serde(rename = "headshot")]
    pub headshot_id: String,
    #[serde(skip)]
    pub pixels: RgbaImage,
}

/// Everything a single run produces.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<StudentRecord>,
    pub archive: AssetArchive,
    pub previews: HashMap<String, Arc<[u8]>>,
}

impl RecordSet {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Filesystem-safe identifier for a name: lowercase ASCII letters and digits
/// separated by single hyphens.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let mut slug = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub fn headshot_id(name: &str) -> String {
    format!("{}.jpg", slugify(name))
}

fn expand(samples: &[u8], channels: usize, pixels: usize) -> Result<Vec<u8>> {
    if samples.len() < pixels * channels {
        return Err(ExtractError::ImageDecode(format!(
            "expected {} samples, got {}",
            pixels * channels,
            samples.len()
        )));
    }
    let mut rgba = Vec::with_capacity(pixels * 4);
    for px in samples.chunks_exact(channels).take(pixels) {
        match channels {
            1 => rgba.extend_from_slice(&[px[0], px[0], px[0], 255]),
            _ => rgba.extend_from_slice(&[px[0], px[1], px[2], 255]),
        }
    }
    Ok(rgba)
}

/// Decode a raster into an RGBA buffer of exactly `width * height * 4` bytes.
pub fn to_rgba(image: &RasterImage) -> Result<RgbaImage> {
    let (width, height) = (image.width, image.height);
    let pixels = width as usize * height as usize;
    let buffer = match &image.source {
        PixelSource::Bitmap(bitmap) => {
            if bitmap.dimensions() != (width, height) {
                return Err(ExtractError::ImageDecode(format!(
                    "bitmap is {:?}, expected {}x{}",
                    bitmap.dimensions(),
                    width,
                    height
                )));
            }
            return Ok(bitmap.clone());
        }
        PixelSource::Samples { data, .. } if data.len() == pixels * 4 => data.clone(),
        PixelSource::Samples { data, channels: 1 } => expand(data, 1, pixels)?,
        PixelSource::Samples { data, .. } => expand(data, 3, pixels)?,
    };
    RgbaImage::from_raw(width, height, buffer)
        .ok_or_else(|| ExtractError::ImageDecode("buffer does not match dimensions".into()))
}

/// JPEG codec backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageJpegCodec;

impl JpegCodec for ImageJpegCodec {
    async fn encode_jpeg(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        quality: f32,
    ) -> Result<Vec<u8>> {
        let bitmap = RgbaImage::from_raw(width, height, rgba.to_vec())
            .ok_or_else(|| ExtractError::Encode("buffer does not match dimensions".into()))?;
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgba8(bitmap).to_rgb8();
        let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, quality)
            .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| ExtractError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// Builds records for one run.
pub struct RecordAssembler<'a, C> {
    codec: &'a C,
    quality: f32,
}

impl<'a, C: JpegCodec> RecordAssembler<'a, C> {
    pub fn new(codec: &'a C, quality: f32) -> Self {
        Self { codec, quality }
    }

    /// Decode, encode and store one student. On error nothing is added to `output`.
    pub async fn assemble(
        &self,
        name: NameGroup,
        candidate: ImageCandidate,
        output: &mut RecordSet,
    ) -> Result<()> {
        let pixels = to_rgba(&candidate.image)?;
        let mut id = headshot_id(name.as_str());
        if id == ".jpg" {
            // Slugs never contain '_', so this cannot shadow a named student.
            id = format!("student_{}.jpg", output.records.len() + 1);
        }
        let encoded: Arc<[u8]> = self
            .codec
            .encode_jpeg(pixels.as_raw(), pixels.width(), pixels.height(), self.quality)
            .await?
            .into();

        if output.archive.insert(id.clone(), Arc::clone(&encoded)) {
            log::warn!("{} already extracted; replacing its photo", id);
        }
        output.previews.insert(id.clone(), encoded);
        output.records.push(StudentRecord {
            name: name.into_string(),
            headshot_id: id,
            pixels,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_diacritics() {
        assert_eq!(slugify("José Á. Pérez"), "jose-a-perez");
        assert_eq!(slugify("Zoë Ångström"), "zoe-angstrom");
    }

    #[test]
    fn slug_collapses_and_trims_separators() {
        assert_eq!(slugify("  A--B  "), "a-b");
        assert_eq!(slugify("O'Brien, Mary-Kate"), "o-brien-mary-kate");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn slug_is_idempotent() {
        for name in ["José Á. Pérez", "  A--B  ", "Nguyễn Văn An 3rd", "李 Lee"] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn headshot_id_appends_extension() {
        assert_eq!(headshot_id("Jane Doe"), "jane-doe.jpg");
    }

    #[test]
    fn rgb_samples_gain_opaque_alpha() {
        let (w, h) = (3, 2);
        let data: Vec<u8> = (0..(3 * w * h) as u8).collect();
        let rgba = to_rgba(&RasterImage::from_samples(w, h, data, 3)).unwrap();
        let raw = rgba.as_raw();
        assert_eq!(raw.len(), (4 * w * h) as usize);
        assert!(raw.iter().skip(3).step_by(4).all(|&a| a == 255));
        assert_eq!(&raw[..8], &[0, 1, 2, 255, 3, 4, 5, 255]);
    }

    #[test]
    fn gray_samples_are_replicated() {
        let rgba = to_rgba(&RasterImage::from_samples(2, 1, vec![10, 200], 1)).unwrap();
        assert_eq!(rgba.as_raw(), &vec![10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn rgba_sized_samples_are_copied_verbatim() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let rgba = to_rgba(&RasterImage::from_samples(2, 1, data.clone(), 3)).unwrap();
        assert_eq!(rgba.into_raw(), data);
    }

    #[test]
    fn short_buffers_fail_to_decode() {
        let err = to_rgba(&RasterImage::from_samples(4, 4, vec![0; 10], 3)).unwrap_err();
        assert!(matches!(err, ExtractError::ImageDecode(_)));
    }

    #[test]
    fn bitmaps_are_copied() {
        let bitmap = RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 6]));
        let rgba = to_rgba(&RasterImage::from_bitmap(bitmap.clone())).unwrap();
        assert_eq!(rgba, bitmap);
    }

    #[tokio::test]
    async fn codec_produces_jpeg() {
        let bitmap = RgbaImage::from_pixel(24, 24, image::Rgba([200, 100, 50, 255]));
        let bytes = ImageJpegCodec
            .encode_jpeg(bitmap.as_raw(), 24, 24, 0.95)
            .await
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 24));
    }

    #[tokio::test]
    async fn assemble_stores_record_archive_and_preview() {
        let codec = ImageJpegCodec;
        let assembler = RecordAssembler::new(&codec, 0.95);
        let mut output = RecordSet::default();
        let candidate = ImageCandidate {
            op_index: 1,
            image: RasterImage::from_samples(30, 30, vec![128; 30 * 30 * 3], 3),
        };
        let name = crate::segment::segment_names(
            &[
                crate::source::PositionedTextRun::new("José Pérez", 12.0, 0.0, 0),
                crate::source::PositionedTextRun::new("Classification", 10.0, 0.0, 0),
            ],
            &crate::config::ExtractionConfig::default(),
        )
        .remove(0);

        assembler.assemble(name, candidate, &mut output).await.unwrap();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].name, "José Pérez");
        assert_eq!(output.records[0].headshot_id, "jose-perez.jpg");
        assert_eq!(output.records[0].pixels.dimensions(), (30, 30));
        assert!(output.archive.get("jose-perez.jpg").is_some());
        assert!(output.previews.contains_key("jose-perez.jpg"));
    }

    fn name_group(name: &str) -> NameGroup {
        crate::segment::segment_names(
            &[
                crate::source::PositionedTextRun::new(name, 12.0, 0.0, 0),
                crate::source::PositionedTextRun::new("Classification", 10.0, 0.0, 0),
            ],
            &crate::config::ExtractionConfig::default(),
        )
        .remove(0)
    }

    #[tokio::test]
    async fn unsluggable_name_does_not_collide_with_named_student() {
        let codec = ImageJpegCodec;
        let assembler = RecordAssembler::new(&codec, 0.95);
        let mut output = RecordSet::default();
        let candidate = || ImageCandidate {
            op_index: 0,
            image: RasterImage::from_samples(30, 30, vec![64; 30 * 30 * 3], 3),
        };

        assembler
            .assemble(name_group("李明"), candidate(), &mut output)
            .await
            .unwrap();
        assembler
            .assemble(name_group("Student 1"), candidate(), &mut output)
            .await
            .unwrap();

        let ids: Vec<_> = output.records.iter().map(|r| r.headshot_id.as_str()).collect();
        assert_eq!(ids, vec!["student_1.jpg", "student-1.jpg"]);
        assert_eq!(output.archive.len(), 2);
        assert_eq!(output.previews.len(), 2);
    }

    #[test]
    fn record_serializes_with_headshot_key() {
        let record = StudentRecord {
            name: "Jane Doe".into(),
            headshot_id: "jane-doe.jpg".into(),
            pixels: RgbaImage::new(1, 1),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "Jane Doe", "headshot": "jane-doe.jpg" })
        );
    }
}
