//! Source acquisition: download and unpack the bulk company-facts archive.
//!
//! The target directory moves through a fixed sequence of states:
//!
//! ```text
//! Absent ──reset──▶ Created ──download──▶ Downloaded ──extract──▶ Populated
//! ```
//!
//! The archive is held by a [`TempArchive`] guard for the whole sequence, so
//! it is deleted whether the run finishes, returns early, or fails.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::AsyncWriteExt;

use crate::config::{Config, SourceConfig};
use crate::error::AcquireError;
use crate::progress::{format_number, ProgressEvent, ProgressMode, ProgressReporter};

/// Report download progress every this many bytes.
const DOWNLOAD_REPORT_BYTES: u64 = 64 * 1024 * 1024;
/// Report extraction progress every this many entries.
const EXTRACT_REPORT_ENTRIES: u64 = 1000;

/// Where the target directory is in the fetch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Absent,
    Created,
    Downloaded { bytes: u64 },
    Populated { files: u64 },
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub bytes: u64,
    pub files: u64,
}

/// Owns the downloaded archive path and removes the file on drop.
pub struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        if self.path.exists() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => tracing::info!(path = %self.path.display(), "deleted temporary archive"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    "failed to delete temporary archive: {}",
                    e
                ),
            }
        }
    }
}

/// Archive location for a target directory: next to it, never inside it.
pub fn archive_path(target: &Path, archive_name: &str) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(archive_name),
        _ => PathBuf::from(archive_name),
    }
}

/// Delete `target` if present and create it empty.
pub fn reset_dir(target: &Path) -> Result<FetchState, AcquireError> {
    if target.exists() {
        std::fs::remove_dir_all(target).map_err(|e| AcquireError::io(target, e))?;
        tracing::info!(dir = %target.display(), "deleted existing folder");
    }
    std::fs::create_dir_all(target).map_err(|e| AcquireError::io(target, e))?;
    tracing::info!(dir = %target.display(), "created folder");
    Ok(FetchState::Created)
}

/// Run the whole fetch sequence into `target`.
pub async fn fetch_company_facts(
    source: &SourceConfig,
    target: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<FetchSummary, AcquireError> {
    let mut state = FetchState::Absent;
    tracing::debug!(?state, dir = %target.display(), "fetch starting");

    let archive = TempArchive::new(archive_path(target, &source.archive_name));
    state = reset_dir(target)?;
    tracing::debug!(?state, "fetch");

    let bytes = download(source, archive.path(), reporter).await?;
    state = FetchState::Downloaded { bytes };
    tracing::debug!(?state, "fetch");

    let files = extract_archive(archive.path(), target, reporter)?;
    state = FetchState::Populated { files };
    tracing::info!(?state, "fetch complete");

    Ok(FetchSummary { bytes, files })
}

/// Stream `source.url` into `dest`. Returns the number of bytes written.
pub async fn download(
    source: &SourceConfig,
    dest: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<u64, AcquireError> {
    let client = reqwest::Client::builder()
        .user_agent(source.user_agent.as_str())
        .timeout(Duration::from_secs(source.timeout_secs))
        .build()?;

    tracing::info!(url = %source.url, "downloading archive");
    let mut response = client.get(&source.url).send().await?.error_for_status()?;
    let total = response.content_length();

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AcquireError::io(dest, e))?;
    let mut written: u64 = 0;
    let mut next_report = DOWNLOAD_REPORT_BYTES;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| AcquireError::io(dest, e))?;
        written += chunk.len() as u64;
        if written >= next_report {
            reporter.report(ProgressEvent::Downloading {
                bytes: written,
                total,
            });
            next_report += DOWNLOAD_REPORT_BYTES;
        }
    }
    file.flush().await.map_err(|e| AcquireError::io(dest, e))?;
    reporter.report(ProgressEvent::Downloading {
        bytes: written,
        total,
    });

    Ok(written)
}

/// Extract the archive's `*.json` entries directly into `target`.
///
/// Directory components are dropped so every document lands at the top level
/// of `target`. Other entries are skipped. Entries whose names would escape
/// the archive root abort the extraction. Returns the number of files written.
pub fn extract_archive(
    archive_path: &Path,
    target: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<u64, AcquireError> {
    tracing::info!(dir = %target.display(), "extracting archive");
    let file = File::open(archive_path).map_err(|e| AcquireError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let total = archive.len() as u64;
    let mut json_files: u64 = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let n = i as u64 + 1;
        if n % EXTRACT_REPORT_ENTRIES == 0 || n == total {
            reporter.report(ProgressEvent::Extracting { n, total });
        }
        if entry.is_dir() {
            continue;
        }
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| AcquireError::UnsafeEntry(entry.name().to_string()))?;
        if !relative.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let Some(name) = relative.file_name() else {
            continue;
        };

        let out_path = target.join(name);
        let mut out = File::create(&out_path).map_err(|e| AcquireError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| AcquireError::io(&out_path, e))?;
        json_files += 1;
    }

    tracing::info!(files = json_files, "extracted files");
    Ok(json_files)
}

/// CLI entry point for `cfx fetch`.
pub async fn run_fetch(config: &Config, progress: ProgressMode) -> anyhow::Result<FetchSummary> {
    if config.source.user_agent.trim().is_empty() {
        bail!("source.user_agent must be set (SEC rejects anonymous requests)");
    }
    let target = &config.paths.company_facts;
    let summary = fetch_company_facts(&config.source, target, progress.reporter().as_ref())
        .await
        .with_context(|| format!("fetch from {} failed", config.source.url))?;

    println!("fetch {}", config.source.url);
    println!("  downloaded: {} bytes", format_number(summary.bytes));
    println!("  extracted: {} files", format_number(summary.files));
    println!("  into: {}", target.display());
    println!("ok");
    Ok(summary)
}
