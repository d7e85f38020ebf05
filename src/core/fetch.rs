//! Index retrieval boundary.
//!
//! The pipeline never talks to object storage directly; it goes through
//! [`IndexFetcher`] so tests can substitute a deterministic fake. The
//! production implementation drives `gsutil` and `unzip` as external
//! processes rather than linking a storage SDK.

use crate::core::error::IndexGateError;
use crate::core::index::{FetchedIndex, INDEX_NAME, StorageLocation, load_index_file};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolves a storage location to a downloaded, decompressed index document.
/// A fetch failure is fatal to the run; no verdict is possible without an
/// index.
pub trait IndexFetcher {
    fn fetch(&self, location: &StorageLocation) -> Result<FetchedIndex, IndexGateError>;
}

/// Production fetcher: `gsutil cp` the archive out of the bucket, `unzip`
/// it into the extract path, then load `index/index.json`.
pub struct GsutilIndexFetcher {
    extract_path: PathBuf,
    service_account: PathBuf,
}

impl GsutilIndexFetcher {
    pub fn new(extract_path: PathBuf, service_account: PathBuf) -> Self {
        Self {
            extract_path,
            service_account,
        }
    }

    fn download(&self, location: &StorageLocation, archive_path: &Path) -> Result<(), IndexGateError> {
        let url = location.index_archive_url();
        let out = Command::new("gsutil")
            .env("GOOGLE_APPLICATION_CREDENTIALS", &self.service_account)
            .arg("cp")
            .arg(&url)
            .arg(archive_path)
            .output()?;
        if !out.status.success() {
            return Err(IndexGateError::FetchError(format!(
                "gsutil cp {} failed: {}",
                url,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }

    fn extract(&self, archive_path: &Path) -> Result<(), IndexGateError> {
        let out = Command::new("unzip")
            .arg("-o")
            .arg(archive_path)
            .arg("-d")
            .arg(&self.extract_path)
            .output()?;
        if !out.status.success() {
            return Err(IndexGateError::FetchError(format!(
                "unzip {} failed: {}",
                archive_path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl IndexFetcher for GsutilIndexFetcher {
    fn fetch(&self, location: &StorageLocation) -> Result<FetchedIndex, IndexGateError> {
        std::fs::create_dir_all(&self.extract_path)?;
        let archive_path = self.extract_path.join(format!("{}.zip", INDEX_NAME));

        self.download(location, &archive_path)?;
        self.extract(&archive_path)?;

        let index_file = self
            .extract_path
            .join(INDEX_NAME)
            .join(format!("{}.json", INDEX_NAME));
        if !index_file.is_file() {
            return Err(IndexGateError::PathError(format!(
                "{} missing after extraction",
                index_file.display()
            )));
        }

        let (document, digest) = load_index_file(&index_file)?;
        Ok(FetchedIndex {
            document,
            source_path: index_file,
            digest,
        })
    }
}
