//! The markup buffer every rendering stage rewrites, and the file load boundary.
use crate::error::LoadError;
use std::fs;
use std::io;
use std::path::Path;

const BOM: &str = "\u{FEFF}";

/// Owns the current markup text. No well-formedness checks happen here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupStore {
    text: String,
}

impl MarkupStore {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reads `path`, refusing files larger than `limit_kib`.
    pub fn load(path: &Path, limit_kib: u64) -> Result<Self, LoadError> {
        load_markup(path, limit_kib).map(Self::new)
    }

    pub fn get(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: String) {
        self.text = text;
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Replaces every occurrence of `marker` with `value` and returns how many were
    /// replaced. The match is literal.
    pub fn replace_all(&mut self, marker: &str, value: &str) -> usize {
        if marker.is_empty() {
            return 0;
        }
        let count = self.text.matches(marker).count();
        if count > 0 {
            self.text = self.text.replace(marker, value);
        }
        count
    }
}

/// Size in KiB, rounded half up (a 1.5 KiB file counts as 2).
pub fn rounded_kib(bytes: u64) -> u64 {
    bytes.saturating_add(512) / 1024
}

/// Reads a template file as text. Invalid UTF-8 is replaced with U+FFFD and a leading
/// byte order mark is dropped.
pub fn load_markup(path: &Path, limit_kib: u64) -> Result<String, LoadError> {
    let io_error = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    let metadata = fs::metadata(path).map_err(io_error)?;
    if !metadata.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let size_kib = rounded_kib(metadata.len());
    if size_kib > limit_kib {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size_kib,
            limit_kib,
        });
    }

    let bytes = fs::read(path).map_err(io_error)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!(
                target: "mirage.template",
                "template {path:?} is not valid UTF-8; replacing invalid bytes"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };
    log::debug!(target: "mirage.template", "loaded {path:?} ({size_kib} KiB)");
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
