//! Binary payloads embedded in a deck (card audio and images)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// A payload extracted from a deck.
///
/// Decoding never touches the filesystem; the payload is only written when
/// [`Blob::write`] or [`Blob::write_to`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
    /// The 4 bytes between the length field and the payload. Meaning unknown.
    reserved: [u8; 4],
    filename: Option<PathBuf>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_reserved(data, [0; 4])
    }

    pub(crate) fn with_reserved(data: Vec<u8>, reserved: [u8; 4]) -> Self {
        Self {
            data,
            reserved,
            filename: None,
        }
    }

    /// Attach a default destination used by [`Blob::write`]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reserved(&self) -> [u8; 4] {
        self.reserved
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Write the payload to its attached filename.
    ///
    /// Returns `Ok(false)` without touching the filesystem when no filename
    /// is attached.
    pub fn write(&self) -> Result<bool> {
        match self.filename.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => {
                self.write_to(path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Write the payload to an explicit path
    pub fn write_to(&self, path: &Path) -> Result<()> {
        debug!("Writing {} byte blob to {}", self.data.len(), path.display());
        fs::write(path, &self.data)?;
        Ok(())
    }
}
