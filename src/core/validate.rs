//! Index validation pipeline.
//!
//! Takes an in-memory index document plus a commit-history oracle and
//! produces a boolean verdict with itemized diagnostics. Checks never abort
//! the process; they fold into a [`Verdict`] and the coordinator decides
//! exit behavior.
//!
//! # Check semantics
//!
//! - The empty-pack-list check is the one short-circuit: there is nothing
//!   to validate per entry in an empty index.
//! - Per-entry validation is exhaustive, never stopping at the first bad
//!   entry, so one run surfaces every invalid pack and operators can fix a
//!   batch in a single remediation cycle.
//! - Structural and commit validation both always run; a single run reports
//!   both failure classes when both are present.

use crate::core::diag::{Diagnostic, DiagnosticSink, Level};
use crate::core::error::IndexGateError;
use crate::core::fetch::IndexFetcher;
use crate::core::history::HistoryOracle;
use crate::core::index::{IndexDocument, PackEntry, StorageLocation};
use std::path::Path;

/// Result of one validation stage: pass/fail plus the diagnostics the stage
/// produced, in emission order. Folded only by logical AND; never mutated
/// after the stage returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::new()
    }
}

impl Verdict {
    /// A fresh verdict passes until a check fails into it.
    pub fn new() -> Self {
        Self {
            passed: true,
            diagnostics: Vec::new(),
        }
    }

    /// Record one sub-check: an error diagnostic when `statement` is false,
    /// the optional success diagnostic when it holds. ANDs into the overall
    /// result and returns the statement so callers can branch on it.
    fn check(
        &mut self,
        statement: bool,
        error_message: impl Into<String>,
        success_message: Option<String>,
    ) -> bool {
        if !statement {
            self.passed = false;
            self.diagnostics
                .push(Diagnostic::new(Level::Error, error_message));
        } else if let Some(message) = success_message {
            self.diagnostics.push(Diagnostic::new(Level::Success, message));
        }
        statement
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.check(false, message, None);
    }

    /// Attach a non-folding diagnostic (info/debug context).
    fn note(&mut self, level: Level, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(level, message));
    }

    pub fn emit_into(&self, sink: &mut dyn DiagnosticSink) {
        for diagnostic in &self.diagnostics {
            sink.emit(diagnostic.level, &diagnostic.message);
        }
    }
}

/// Verify one pack entry: the id must be present and non-empty, the price
/// present and non-negative. An absent price is compared as -1, so absent
/// and negative fail identically. Both price outcomes are recorded, not
/// just failures.
pub fn verify_pack(pack: &PackEntry, verdict: &mut Verdict) -> bool {
    let id = pack.id.as_deref().unwrap_or("");
    // No id available to name in the message when this one fails.
    let id_exists = verdict.check(!id.is_empty(), "There is a missing pack id.", None);
    let price_is_valid = verdict.check(
        pack.price.unwrap_or(-1.0) >= 0.0,
        format!("The price on the pack {} is invalid.", id),
        Some(format!("The price on the pack {} is valid.", id)),
    );
    id_exists && price_is_valid
}

/// Structural validation of the whole document: non-empty pack list, then
/// every entry through [`verify_pack`] unconditionally.
pub fn check_index_data(index: &IndexDocument) -> Verdict {
    let mut verdict = Verdict::new();
    verdict.note(Level::Info, "Found index data in index file. Checking...");
    if let Ok(dump) = serde_json::to_string_pretty(index) {
        verdict.note(Level::Debug, format!("Index data is:\n{}", dump));
    }

    let packs_list_exists = verdict.check(
        !index.packs.is_empty(),
        "Found 0 packs in index file.\nAborting the rest of the check.",
        None,
    );
    if !packs_list_exists {
        return verdict;
    }

    for pack in &index.packs {
        verify_pack(pack, &mut verdict);
    }
    verdict
}

/// Verify the commit recorded by the index is reachable from
/// `origin/<branch>`. A missing commit field fails without consulting the
/// oracle; membership is exact full-hash equality, no short-hash matching.
pub fn check_commit_in_branch_history(
    index: &IndexDocument,
    circle_branch: &str,
    oracle: &dyn HistoryOracle,
) -> Result<Verdict, IndexGateError> {
    let mut verdict = Verdict::new();
    let Some(index_commit_hash) = index.commit.as_deref() else {
        verdict.fail("No commit field was found in the index.json");
        return Ok(verdict);
    };

    let branch_commits = oracle.commits_reachable_from(&format!("origin/{}", circle_branch))?;
    verdict.check(
        branch_commits.contains(index_commit_hash),
        format!(
            "Commit hash {} is not in {} history",
            index_commit_hash, circle_branch
        ),
        Some("Commit hash in index file is valid.".to_string()),
    );
    Ok(verdict)
}

/// The full gate: fetch the index, run structural and commit validation,
/// aggregate. Returns the aggregate verdict; fetch and oracle failures
/// propagate as fatal errors since no verdict is possible without them.
pub fn run_validation(
    location: &StorageLocation,
    circle_branch: &str,
    fetcher: &dyn IndexFetcher,
    oracle: &dyn HistoryOracle,
    sink: &mut dyn DiagnosticSink,
) -> Result<bool, IndexGateError> {
    sink.emit(
        Level::Info,
        "Downloading and extracting index.zip from the cloud",
    );
    let fetched = fetcher.fetch(location)?;
    sink.emit(Level::Info, "Retrieving the index file");
    sink.emit(
        Level::Info,
        &format!("Index content digest sha256={}", fetched.digest),
    );

    let structural = check_index_data(&fetched.document);
    structural.emit_into(sink);
    if structural.passed {
        sink.emit(
            Level::Success,
            &format!("{} file was found valid", fetched.source_path.display()),
        );
    } else {
        sink.emit(
            Level::Error,
            &format!(
                "The packs in the {} file were found invalid.",
                fetched.source_path.display()
            ),
        );
    }

    // Commit validation always runs, even after structural failure.
    let commit = check_commit_in_branch_history(&fetched.document, circle_branch, oracle)?;
    commit.emit_into(sink);

    let passed = structural.passed && commit.passed;
    if !passed {
        sink.emit(Level::Critical, "Index content is invalid. Aborting.");
    }
    Ok(passed)
}

/// Post-run credential scrub: when the gate failed, the service account key
/// must not be left behind in the workspace. Invoked once by the
/// coordinator with the aggregate verdict; a missing file is not an error.
pub fn scrub_credentials(service_account: &Path, gate_failed: bool) -> Result<bool, IndexGateError> {
    if gate_failed && service_account.exists() {
        std::fs::remove_file(service_account)?;
        return Ok(true);
    }
    Ok(false)
}
