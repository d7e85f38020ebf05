//! Commit-history boundary.
//!
//! [`HistoryOracle`] answers one question: which commits are reachable from
//! a remote-tracking ref. The production implementation shells out to the
//! git CLI in the configured content checkout.

use crate::core::error::IndexGateError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

/// Returns the complete reachable-commit set for a ref of the form
/// `origin/<branch>`.
pub trait HistoryOracle {
    fn commits_reachable_from(&self, branch_ref: &str) -> Result<BTreeSet<String>, IndexGateError>;
}

/// Queries a local checkout with `git rev-list`.
pub struct GitCliOracle {
    repo_root: PathBuf,
}

impl GitCliOracle {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }
}

impl HistoryOracle for GitCliOracle {
    fn commits_reachable_from(&self, branch_ref: &str) -> Result<BTreeSet<String>, IndexGateError> {
        let out = Command::new("git")
            .args(["rev-list", branch_ref])
            .current_dir(&self.repo_root)
            .output()?;
        if !out.status.success() {
            return Err(IndexGateError::GitError(format!(
                "git rev-list {} failed in {}: {}",
                branch_ref,
                self.repo_root.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}
