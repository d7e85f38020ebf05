use indexgate::core::diag::{Level, MemorySink};
use indexgate::core::error::IndexGateError;
use indexgate::core::fetch::IndexFetcher;
use indexgate::core::history::{GitCliOracle, HistoryOracle};
use indexgate::core::index::{
    FetchedIndex, IndexDocument, PackEntry, StorageLocation, hash_text,
};
use indexgate::core::validate::{run_validation, scrub_credentials};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

struct FakeFetcher {
    document: IndexDocument,
}

impl IndexFetcher for FakeFetcher {
    fn fetch(&self, _location: &StorageLocation) -> Result<FetchedIndex, IndexGateError> {
        let raw = serde_json::to_string(&self.document)?;
        Ok(FetchedIndex {
            document: self.document.clone(),
            source_path: PathBuf::from("extract/index/index.json"),
            digest: hash_text(&raw),
        })
    }
}

struct FailingFetcher;

impl IndexFetcher for FailingFetcher {
    fn fetch(&self, location: &StorageLocation) -> Result<FetchedIndex, IndexGateError> {
        Err(IndexGateError::FetchError(format!(
            "bucket {} unreachable",
            location.bucket
        )))
    }
}

struct FakeOracle {
    commits: BTreeSet<String>,
}

impl FakeOracle {
    fn with_commits(commits: &[&str]) -> Self {
        Self {
            commits: commits.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl HistoryOracle for FakeOracle {
    fn commits_reachable_from(
        &self,
        _branch_ref: &str,
    ) -> Result<BTreeSet<String>, IndexGateError> {
        Ok(self.commits.clone())
    }
}

fn pack(id: &str, price: f64) -> PackEntry {
    PackEntry {
        id: Some(id.to_string()),
        price: Some(price),
    }
}

fn location() -> StorageLocation {
    StorageLocation {
        bucket: "marketplace-dist".to_string(),
        base_path: None,
    }
}

#[test]
fn valid_index_passes_the_gate() {
    let fetcher = FakeFetcher {
        document: IndexDocument {
            commit: Some("c1".to_string()),
            packs: vec![pack("p1", 5.0), pack("p2", 0.0)],
        },
    };
    let oracle = FakeOracle::with_commits(&["c1", "c0"]);
    let mut sink = MemorySink::new();

    let passed = run_validation(&location(), "master", &fetcher, &oracle, &mut sink)
        .expect("pipeline should not error");
    assert!(passed);
    assert!(sink.messages_at(Level::Critical).is_empty());
    assert!(sink.messages_at(Level::Error).is_empty());
    assert!(
        sink.messages_at(Level::Success)
            .iter()
            .any(|m| m.ends_with("file was found valid")),
        "structural summary success missing: {:?}",
        sink.diagnostics
    );
    assert!(
        sink.messages_at(Level::Success)
            .contains(&"Commit hash in index file is valid.")
    );
}

#[test]
fn mixed_failures_are_reported_together() {
    // Structural verdict false (missing id + negative price), commit verdict
    // true; the aggregate still fails and both entry failures surface.
    let fetcher = FakeFetcher {
        document: IndexDocument {
            commit: Some("c1".to_string()),
            packs: vec![pack("p1", 5.0), pack("", 2.0), pack("p3", -1.0)],
        },
    };
    let oracle = FakeOracle::with_commits(&["c1"]);
    let mut sink = MemorySink::new();

    let passed = run_validation(&location(), "master", &fetcher, &oracle, &mut sink)
        .expect("pipeline should not error");
    assert!(!passed);

    let errors = sink.messages_at(Level::Error);
    assert!(errors.contains(&"There is a missing pack id."));
    assert!(errors.contains(&"The price on the pack p3 is invalid."));
    assert!(
        errors
            .iter()
            .any(|m| m.ends_with("file were found invalid.")),
        "structural summary error missing: {:?}",
        errors
    );
    // Commit validation still ran and succeeded.
    assert!(
        sink.messages_at(Level::Success)
            .contains(&"Commit hash in index file is valid.")
    );
    assert_eq!(
        sink.messages_at(Level::Critical),
        vec!["Index content is invalid. Aborting."]
    );
}

#[test]
fn structural_and_commit_failures_surface_in_one_run() {
    let fetcher = FakeFetcher {
        document: IndexDocument {
            commit: Some("feed1".to_string()),
            packs: vec![],
        },
    };
    let oracle = FakeOracle::with_commits(&["other"]);
    let mut sink = MemorySink::new();

    let passed = run_validation(&location(), "release-2.4", &fetcher, &oracle, &mut sink)
        .expect("pipeline should not error");
    assert!(!passed);

    let errors = sink.messages_at(Level::Error);
    assert!(
        errors
            .iter()
            .any(|m| m.starts_with("Found 0 packs in index file."))
    );
    assert!(errors.contains(&"Commit hash feed1 is not in release-2.4 history"));
}

#[test]
fn fetch_failure_is_fatal_and_yields_no_verdict() {
    let oracle = FakeOracle::with_commits(&["c1"]);
    let mut sink = MemorySink::new();

    let result = run_validation(&location(), "master", &FailingFetcher, &oracle, &mut sink);
    match result {
        Err(IndexGateError::FetchError(message)) => {
            assert!(message.contains("marketplace-dist"));
        }
        other => panic!("expected fetch error, got {:?}", other.map(|_| ())),
    }
    // The pipeline never reached aggregation.
    assert!(sink.messages_at(Level::Critical).is_empty());
}

#[test]
fn scrub_removes_credential_only_on_failure_path() {
    let tmp = TempDir::new().expect("tmpdir");
    let credential = tmp.path().join("service_account.json");
    fs::write(&credential, "{}").expect("write credential");

    // Passing gate leaves the credential in place.
    assert!(!scrub_credentials(&credential, false).expect("scrub"));
    assert!(credential.exists());

    // Failing gate removes it.
    assert!(scrub_credentials(&credential, true).expect("scrub"));
    assert!(!credential.exists());

    // A missing file on the failure path is not an error.
    assert!(!scrub_credentials(&credential, true).expect("scrub"));
}

fn run_git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

#[test]
fn git_cli_oracle_reads_remote_branch_history() {
    let tmp = TempDir::new().expect("tmpdir");
    let dir = tmp.path();
    run_git(dir, &["init", "-b", "master"]);
    fs::write(dir.join("file.txt"), "one").expect("write");
    run_git(dir, &["add", "."]);
    run_git(
        dir,
        &[
            "-c",
            "user.name=gate",
            "-c",
            "user.email=gate@example.com",
            "commit",
            "-m",
            "one",
        ],
    );
    let head = run_git(dir, &["rev-parse", "HEAD"]);
    run_git(dir, &["update-ref", "refs/remotes/origin/master", "HEAD"]);

    let oracle = GitCliOracle::new(dir.to_path_buf());
    let commits = oracle
        .commits_reachable_from("origin/master")
        .expect("rev-list");
    assert!(commits.contains(&head));

    let missing = oracle.commits_reachable_from("origin/nonexistent");
    assert!(matches!(missing, Err(IndexGateError::GitError(_))));
}

#[test]
fn fatal_fetch_exits_2_and_keeps_the_credential() {
    let tmp = TempDir::new().expect("tmpdir");
    let credential = tmp.path().join("service_account.json");
    fs::write(&credential, "{}").expect("write credential");
    let extract = tmp.path().join("extract");

    // No such bucket (and possibly no gsutil at all): either way the fetch
    // is fatal, no verdict is produced, and the credential survives.
    let out = Command::new(env!("CARGO_BIN_EXE_indexgate"))
        .arg("--extract-path")
        .arg(&extract)
        .arg("--production-bucket-name")
        .arg("indexgate-test-bucket-does-not-exist")
        .arg("--service-account")
        .arg(&credential)
        .arg("--circle-branch")
        .arg("master")
        .arg("--content-root")
        .arg(tmp.path())
        .output()
        .expect("run indexgate");

    assert_eq!(out.status.code(), Some(2), "fatal errors must exit 2");
    assert!(credential.exists(), "fatal path must not scrub credentials");
}
