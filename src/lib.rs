//! Indexgate: release gate for the production marketplace index.
//!
//! Before a published index artifact is trusted as production, this tool
//! fetches it from the production bucket, validates every pack entry
//! structurally, and confirms the commit the index was built from is
//! reachable from the expected branch history. One linear pass, no retries:
//! fetch → structural validation → commit validation → aggregate verdict →
//! exit status.
//!
//! # Exit status
//!
//! - `0`: index is valid.
//! - `1`: validation failure (invalid packs, missing/unreachable commit).
//!   This path also deletes the service account file so a failed run's
//!   workspace does not leak the credential artifact.
//! - `2`: fatal error before a verdict was possible (storage or git
//!   unreachable, malformed archive).
//!
//! # Crate structure
//!
//! - [`core::validate`]: the decision logic (entry/index/commit checks,
//!   coordinator)
//! - [`core::fetch`], [`core::history`]: narrow collaborator boundaries
//! - [`core::diag`]: leveled diagnostic sink

pub mod core;

use crate::core::diag::{DiagnosticSink, Level, TerminalSink};
use crate::core::fetch::GsutilIndexFetcher;
use crate::core::history::GitCliOracle;
use crate::core::index::StorageLocation;
use crate::core::validate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

pub const EXIT_OK: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[clap(
    name = "indexgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run validation on the production index file"
)]
pub struct Cli {
    /// Full path of the folder to extract index.zip to.
    #[clap(short = 'e', long)]
    pub extract_path: PathBuf,
    /// Production bucket name.
    #[clap(long)]
    pub production_bucket_name: String,
    /// Storage base path of the directory the index was uploaded to.
    #[clap(long)]
    pub storage_base_path: Option<String>,
    /// Path to the service account credential file.
    #[clap(long)]
    pub service_account: PathBuf,
    /// CI branch whose history must contain the index commit.
    #[clap(short = 'c', long)]
    pub circle_branch: String,
    /// Content repository checkout the commit history is read from.
    #[clap(long, default_value = ".")]
    pub content_root: PathBuf,
}

/// Parse arguments, wire the production collaborators into the pipeline,
/// and map the outcome to an exit code. The credential scrub runs on the
/// validation-failure path only; fatal errors never produced a verdict and
/// leave the file alone.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let mut sink = TerminalSink::from_env();

    let location = StorageLocation {
        bucket: cli.production_bucket_name,
        base_path: cli.storage_base_path,
    };
    let fetcher = GsutilIndexFetcher::new(cli.extract_path, cli.service_account.clone());
    let oracle = GitCliOracle::new(cli.content_root);

    match validate::run_validation(
        &location,
        &cli.circle_branch,
        &fetcher,
        &oracle,
        &mut sink,
    ) {
        Ok(passed) => {
            match validate::scrub_credentials(&cli.service_account, !passed) {
                Ok(true) => sink.emit(
                    Level::Info,
                    &format!(
                        "Removed service account file {}",
                        cli.service_account.display()
                    ),
                ),
                Ok(false) => {}
                Err(err) => sink.emit(
                    Level::Error,
                    &format!("Failed to remove service account file: {}", err),
                ),
            }
            if passed {
                ExitCode::from(EXIT_OK)
            } else {
                ExitCode::from(EXIT_INVALID)
            }
        }
        Err(err) => {
            sink.emit(Level::Critical, &err.to_string());
            ExitCode::from(EXIT_FATAL)
        }
    }
}
