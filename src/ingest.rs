//! Seed file handles for the upload path.
//!
//! A [`SeedFile`] is anything with a name and readable text. The workflow
//! checks the name before reading, so a rejected file is never opened.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Required (case-sensitive) suffix for uploaded seed files.
pub const JSON_SUFFIX: &str = ".json";

const UTF8_BOM: char = '\u{feff}';

/// A file offered as a seed configuration.
pub trait SeedFile {
    /// Display name, used for the suffix check and the upload indicator.
    fn name(&self) -> &str;

    /// Read the whole file as text.
    fn read_text(&self) -> io::Result<String>;
}

/// Whether `name` is acceptable as a seed file.
pub fn is_json_file_name(name: &str) -> bool {
    name.ends_with(JSON_SUFFIX)
}

/// A seed file on the local filesystem.
#[derive(Debug, Clone)]
pub struct PathSeedFile {
    path: PathBuf,
    name: String,
}

impl PathSeedFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeedFile for PathSeedFile {
    fn name(&self) -> &str {
        &self.name
    }

    /// A leading UTF-8 byte-order mark is dropped.
    fn read_text(&self) -> io::Result<String> {
        let text = fs::read_to_string(&self.path)?;
        Ok(match text.strip_prefix(UTF8_BOM) {
            Some(rest) => rest.to_string(),
            None => text,
        })
    }
}
