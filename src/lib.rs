//! Extract student names and headshots from roster PDFs.
//!
//! ```no_run
//! use rostercards::{ExtractionConfig, ExtractionSession};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let bytes = std::fs::read("roster.pdf")?;
//! let mut session = ExtractionSession::new(ExtractionConfig::default());
//! let status = session.extract_pdf(bytes).await;
//! println!("{status:?}: {} records", session.records().len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod assemble;
pub mod config;
pub mod error;
pub mod filter;
pub mod pairing;
pub mod pdf_source;
pub mod segment;
pub mod session;
pub mod source;

#[cfg(feature = "python")]
mod python;

pub use archive::AssetArchive;
pub use assemble::{ImageJpegCodec, StudentRecord, headshot_id, slugify};
pub use config::ExtractionConfig;
pub use error::{ExtractError, Result};
pub use pdf_source::PdfRoster;
pub use segment::NameGroup;
pub use session::{ExtractionSession, ExtractionStatus, SessionState};
pub use source::{
    ImageHandle, JpegCodec, PixelSource, PositionedTextRun, RasterImage, RosterDocument,
};
