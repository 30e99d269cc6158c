//! File I/O
//!
//! Loads a complete G-code file into memory for analysis. The analyzer
//! needs the whole text up front, so there is no streaming reader here.
//! Files are expected to be UTF-8 or ASCII; invalid sequences are replaced
//! rather than rejected so one bad byte in a comment does not lose the
//! whole preview.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Size above which loading logs a warning (500 MB)
const LARGE_FILE_BYTES: u64 = 500 * 1024 * 1024;

/// Supported file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileEncoding {
    /// UTF-8 encoding
    Utf8,
    /// ASCII encoding (7-bit)
    Ascii,
    /// Neither; decoded with replacement characters
    Invalid,
}

impl FileEncoding {
    /// Detect encoding from file bytes
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&UTF8_BOM) {
            return FileEncoding::Utf8;
        }

        if data.is_ascii() {
            return FileEncoding::Ascii;
        }

        if std::str::from_utf8(data).is_ok() {
            return FileEncoding::Utf8;
        }

        FileEncoding::Invalid
    }
}

/// File read statistics
#[derive(Debug, Clone, Serialize)]
pub struct FileReadStats {
    /// Total bytes read
    pub bytes_read: u64,
    /// Detected encoding
    pub encoding: FileEncoding,
    /// Time taken to read (milliseconds)
    pub read_time_ms: u64,
}

/// G-code file reader
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Create a new G-code file reader
    ///
    /// # Errors
    /// Returns error if file does not exist or cannot be accessed
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {}", path.display()));
        }

        if !path.is_file() {
            return Err(anyhow!("Path is not a file: {}", path.display()));
        }

        let file_size = fs::metadata(&path)?.len();

        Ok(Self { path, file_size })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the entire file as text
    ///
    /// A UTF-8 byte order mark is dropped, which shifts byte offsets by
    /// three relative to the raw file.
    ///
    /// # Errors
    /// Returns error if file cannot be read
    pub fn read_all(&self) -> Result<(String, FileReadStats)> {
        if self.file_size > LARGE_FILE_BYTES {
            tracing::warn!(
                "Reading very large file ({}MB) into memory",
                self.file_size / (1024 * 1024)
            );
        }

        let started = Instant::now();
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let encoding = FileEncoding::detect(&bytes);
        let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(&bytes);

        let text = match encoding {
            FileEncoding::Invalid => {
                tracing::warn!(
                    "{} is not valid UTF-8; replacing invalid bytes",
                    self.path.display()
                );
                String::from_utf8_lossy(body).into_owned()
            }
            FileEncoding::Utf8 | FileEncoding::Ascii => String::from_utf8(body.to_vec())?,
        };

        let stats = FileReadStats {
            bytes_read: bytes.len() as u64,
            encoding,
            read_time_ms: started.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            "Read {} bytes from {} ({:?})",
            stats.bytes_read,
            self.path.display(),
            stats.encoding
        );

        Ok((text, stats))
    }
}
