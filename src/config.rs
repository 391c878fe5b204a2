/// Tunables for the extraction heuristics.
///
/// The defaults match the roster template the pipeline was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Substring (matched case-insensitively) that terminates a student's name block.
    pub marker: String,
    /// Emphasis used as the baseline when a page carries no marker run.
    pub default_baseline: f32,
    /// Multiplier applied to the baseline to obtain the name threshold.
    pub emphasis_ratio: f32,
    /// Minimum width and height, in pixels, of a photo candidate.
    pub min_image_side: u32,
    /// Maximum width / height ratio of a photo candidate.
    pub max_aspect_ratio: f32,
    /// JPEG quality in the `0.0..=1.0` range.
    pub jpeg_quality: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            marker: "classification".to_owned(),
            default_baseline: 10.0,
            emphasis_ratio: 1.1,
            min_image_side: 20,
            max_aspect_ratio: 1.5,
            jpeg_quality: 0.95,
        }
    }
}

impl ExtractionConfig {
    /// Lowercased marker, used for case-insensitive matching.
    pub fn marker_lowercase(&self) -> String {
        self.marker.to_lowercase()
    }

    /// JPEG quality mapped onto the encoder's `1..=100` scale.
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}
