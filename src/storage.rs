//! Host file storage and document jobs
//!
//! In a clustered host the binary file may live on shared storage and has to
//! be materialised locally before it can be uploaded; [`FileStorage`] is that
//! collaborator. [`LocalFileStorage`] serves single-node hosts and the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TranslatorError, TranslatorResult};

/// A binary file attached to a content object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentJob {
    /// Name the file was uploaded with
    pub original_filename: String,
    /// Where the host keeps the file
    pub file_path: PathBuf,
}

impl DocumentJob {
    pub fn new(original_filename: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            original_filename: original_filename.into(),
            file_path: file_path.into(),
        }
    }

    /// Job for a local file, named after its file name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let file_path = path.into();
        let original_filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            original_filename,
            file_path,
        }
    }

    /// Deterministic location of the translated file
    ///
    /// `<temp_root>/<target>/<target>_<original_filename>`. The same job and
    /// target always land on the same path, which is what lets an existing
    /// output stand in for a finished translation.
    pub fn output_path(&self, temp_root: &Path, target_locale: &str) -> PathBuf {
        temp_root
            .join(target_locale)
            .join(format!("{}_{}", target_locale, self.original_filename))
    }
}

/// File access the document translation needs from the host
pub trait FileStorage: Send + Sync {
    /// Make the file available on the local filesystem
    fn fetch(&self, path: &Path) -> TranslatorResult<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Canonical path of an existing file, `None` if it does not exist
    fn realpath(&self, path: &Path) -> Option<PathBuf>;
}

/// Storage backed directly by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStorage;

impl FileStorage for LocalFileStorage {
    fn fetch(&self, path: &Path) -> TranslatorResult<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(TranslatorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn realpath(&self, path: &Path) -> Option<PathBuf> {
        fs::canonicalize(path).ok()
    }
}
