//! Packaged headshots for bulk export.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

/// Encoded headshots keyed by headshot id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct AssetArchive {
    entries: Vec<(String, Arc<[u8]>)>,
}

impl AssetArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `name`, replacing an earlier entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, data: Arc<[u8]>) -> bool {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => {
                entry.1 = data;
                true
            }
            None => {
                self.entries.push((name, data));
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, data)| data.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Write every entry into a zip archive. JPEG data is stored uncompressed.
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        let mut writer = zip.finish()?;
        writer.flush()?;
        Ok(writer)
    }

    /// Write every entry as a loose file inside `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for (name, data) in &self.entries {
            fs::write(dir.join(name), data)?;
        }
        Ok(())
    }
}
