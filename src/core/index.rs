//! Index artifact data model.
//!
//! The production index is a zipped `index.json` listing every published
//! pack plus the commit the index was built from. Only the fields the gate
//! inspects are modeled; the real artifact carries many more, which serde
//! ignores.

use crate::core::error::IndexGateError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Base name of the index artifact: `index.zip` in the bucket, extracted to
/// an `index/` folder holding `index.json`.
pub const INDEX_NAME: &str = "index";

/// One pack's record inside the index. Both fields are optional at the
/// serialization layer; validation decides what absence means.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PackEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// The root index document. `commit` is the hash the index was built from;
/// its absence is itself a validation failure, not a parse error.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IndexDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default)]
    pub packs: Vec<PackEntry>,
}

/// A fetched, decompressed index: the document, where it came from on disk,
/// and the content digest of the raw `index.json` for the audit trail.
#[derive(Debug, Clone)]
pub struct FetchedIndex {
    pub document: IndexDocument,
    pub source_path: PathBuf,
    pub digest: String,
}

/// Where the index artifact lives in object storage.
#[derive(Debug, Clone)]
pub struct StorageLocation {
    pub bucket: String,
    pub base_path: Option<String>,
}

impl StorageLocation {
    /// Object URL of the index archive inside the bucket.
    pub fn index_archive_url(&self) -> String {
        match &self.base_path {
            Some(base) => format!(
                "gs://{}/{}/{}.zip",
                self.bucket,
                base.trim_matches('/'),
                INDEX_NAME
            ),
            None => format!("gs://{}/{}.zip", self.bucket, INDEX_NAME),
        }
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text);
    format!("{:x}", hasher.finalize())
}

/// Read and deserialize an `index.json`, returning the document and the
/// sha256 digest of the raw bytes.
pub fn load_index_file(path: &Path) -> Result<(IndexDocument, String), IndexGateError> {
    let raw = std::fs::read_to_string(path)?;
    let document = serde_json::from_str(&raw)?;
    Ok((document, hash_text(&raw)))
}
