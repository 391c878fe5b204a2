//! Drives the extraction pipeline over a whole document.
//!
//! An [`ExtractionSession`] owns everything a run produces. Each run starts by
//! discarding the previous run's records, archive and previews, then walks the
//! pages in order: segment names, collect photo candidates, pair them, and
//! assemble records. Only a document that cannot be opened or counted fails
//! the run; page and image problems are logged and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use crate::archive::AssetArchive;
use crate::assemble::{ImageJpegCodec, RecordAssembler, RecordSet, StudentRecord};
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};
use crate::filter::{CandidateFilter, collect_candidates};
use crate::pairing::select_photos;
use crate::pdf_source::PdfRoster;
use crate::segment::segment_names;
use crate::source::{JpegCodec, RosterDocument};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// `count` records were built for `expected` detected names.
    Succeeded { count: usize, expected: usize },
    Failed { reason: String },
}

impl ExtractionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionStatus::Succeeded { .. })
    }
}

/// Per-page tallies, used for the run summary.
#[derive(Debug, Default, Clone, Copy)]
struct PageReport {
    names: usize,
    records: usize,
}

/// Run-scoped extraction state plus the codec used to package photos.
pub struct ExtractionSession<C = ImageJpegCodec> {
    config: ExtractionConfig,
    codec: C,
    state: SessionState,
    output: RecordSet,
}

impl ExtractionSession<ImageJpegCodec> {
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_codec(config, ImageJpegCodec)
    }
}

impl Default for ExtractionSession<ImageJpegCodec> {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl<C: JpegCodec> ExtractionSession<C> {
    pub fn with_codec(config: ExtractionConfig, codec: C) -> Self {
        Self {
            config,
            codec,
            state: SessionState::Idle,
            output: RecordSet::default(),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Records of the last successful run, in document order.
    pub fn records(&self) -> &[StudentRecord] {
        &self.output.records
    }

    /// Encoded headshots of the last successful run.
    pub fn archive(&self) -> &AssetArchive {
        &self.output.archive
    }

    /// Encoded headshot for on-demand display.
    pub fn preview(&self, headshot_id: &str) -> Option<&[u8]> {
        self.output.previews.get(headshot_id).map(|data| data.as_ref())
    }

    pub fn previews(&self) -> &HashMap<String, Arc<[u8]>> {
        &self.output.previews
    }

    /// Drop all run-scoped state and return to `Idle`.
    pub fn reset(&mut self) {
        self.output.clear();
        self.state = SessionState::Idle;
    }

    fn begin(&mut self) {
        self.reset();
        self.state = SessionState::Running;
    }

    fn finish(&mut self, result: Result<(RecordSet, usize)>) -> ExtractionStatus {
        match result {
            Ok((output, expected)) => {
                let count = output.records.len();
                self.output = output;
                self.state = SessionState::Succeeded;
                log::info!("extracted {} of {} students", count, expected);
                ExtractionStatus::Succeeded { count, expected }
            }
            Err(err) => {
                self.output.clear();
                self.state = SessionState::Failed;
                log::error!("extraction failed: {}", err);
                ExtractionStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Parse `bytes` as a PDF and extract it.
    pub async fn extract_pdf(&mut self, bytes: Vec<u8>) -> ExtractionStatus {
        self.begin();
        let result = match PdfRoster::from_bytes(bytes) {
            Ok(document) => self.run(&document).await,
            Err(err) => Err(err),
        };
        self.finish(result)
    }

    /// Extract every page of `document`.
    pub async fn extract<D: RosterDocument>(&mut self, document: &D) -> ExtractionStatus {
        self.begin();
        let result = self.run(document).await;
        self.finish(result)
    }

    async fn run<D: RosterDocument>(&self, document: &D) -> Result<(RecordSet, usize)> {
        let pages = document
            .page_count()
            .await
            .map_err(|e| ExtractError::DocumentParse(e.to_string()))?;
        log::debug!("document has {} pages", pages);

        let mut output = RecordSet::default();
        let mut expected = 0;
        for page_index in 0..pages {
            match self.process_page(document, page_index, &mut output).await {
                Ok(report) => {
                    log::debug!(
                        "page {}: {} names, {} records",
                        page_index,
                        report.names,
                        report.records
                    );
                    expected += report.names;
                }
                Err(err) => log::warn!("skipping page {}: {}", page_index, err),
            }
        }
        Ok((output, expected))
    }

    async fn process_page<D: RosterDocument>(
        &self,
        document: &D,
        page_index: usize,
        output: &mut RecordSet,
    ) -> Result<PageReport> {
        let runs = document.page_text_runs(page_index).await?;
        let names = segment_names(&runs, &self.config);
        if names.is_empty() {
            return Ok(PageReport::default());
        }

        let handles = document.page_image_operations(page_index).await?;
        let filter = CandidateFilter::from_config(&self.config);
        let candidates = collect_candidates(document, page_index, &handles, &filter).await;
        let photos = select_photos(candidates, names.len());

        let assembler = RecordAssembler::new(&self.codec, self.config.jpeg_quality);
        let before = output.records.len();
        let mut report = PageReport {
            names: names.len(),
            records: 0,
        };
        for (name, photo) in names.into_iter().zip(photos) {
            let label = name.to_string();
            if let Err(err) = assembler.assemble(name, photo, output).await {
                log::warn!("page {}: no record for {}: {}", page_index, label, err);
            }
        }
        report.records = output.records.len() - before;
        Ok(report)
    }
}
