//! Batch driver: transform every raw document in a directory.
//!
//! Files are processed one at a time in filename order. A failure in one
//! document is recorded and never stops the batch; only failing to list the
//! source directory or create the destination directory is fatal.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::TransformError;
use crate::progress::{should_report, ProgressEvent, ProgressMode, ProgressReporter};
use crate::transform::{transform_bytes, Outcome, TransformParams};

const DEFAULT_PATTERN: &str = "*.json";
const REPORT_EVERY: u64 = 500;

/// Why a document did not make it to the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Parsed fine but had too few surviving concepts. Not an error.
    EmptyAfterFilter { key_count: usize },
    /// Not a valid company-facts document.
    Malformed(String),
    /// Could not be read, or its output could not be written.
    Io(String),
}

impl SkipReason {
    pub fn is_error(&self) -> bool {
        !matches!(self, SkipReason::EmptyAfterFilter { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyAfterFilter { key_count } => {
                write!(f, "too few keys after filtering ({})", key_count)
            }
            SkipReason::Malformed(e) => write!(f, "{}", e),
            SkipReason::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<TransformError> for SkipReason {
    fn from(e: TransformError) -> Self {
        SkipReason::Malformed(e.to_string())
    }
}

/// A document that was skipped or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub file_name: String,
    pub reason: SkipReason,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: u64,
    pub kept: u64,
    pub skipped: u64,
    pub errored: u64,
    pub facts_written: u64,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    fn record(&mut self, file_name: &str, reason: SkipReason) {
        if reason.is_error() {
            tracing::error!(file = file_name, "error processing document: {}", reason);
            self.errored += 1;
        } else {
            tracing::debug!(file = file_name, "skipping document: {}", reason);
            self.skipped += 1;
        }
        self.entries.push(BatchEntry {
            file_name: file_name.to_string(),
            reason,
        });
    }
}

/// Inputs of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions<'a> {
    pub source_dir: &'a Path,
    pub dest_dir: &'a Path,
    /// Glob matched against file names. Defaults to `*.json`.
    pub file_filter: Option<&'a str>,
    /// Transform but do not write anything.
    pub dry_run: bool,
}

/// List the files in `source_dir` whose name matches the filter, sorted.
pub fn list_source_files(source_dir: &Path, file_filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        anyhow::bail!("source directory does not exist: {}", source_dir.display());
    }
    let matcher = build_matcher(file_filter.unwrap_or(DEFAULT_PATTERN))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    // Sort for deterministic ordering
    files.sort();
    Ok(files)
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    Ok(Glob::new(pattern)
        .with_context(|| format!("invalid file filter: '{}'", pattern))?
        .compile_matcher())
}

/// Transform every matching file from `source_dir` into `dest_dir`.
pub fn run_batch(
    opts: &BatchOptions<'_>,
    params: &TransformParams,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let files = list_source_files(opts.source_dir, opts.file_filter)?;
    if !opts.dry_run {
        std::fs::create_dir_all(opts.dest_dir).with_context(|| {
            format!(
                "Failed to create destination directory: {}",
                opts.dest_dir.display()
            )
        })?;
    }

    let total = files.len() as u64;
    tracing::info!(
        source = %opts.source_dir.display(),
        dest = %opts.dest_dir.display(),
        files = total,
        "transforming documents"
    );

    let mut report = BatchReport::default();
    for path in &files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match process_file(path, &opts.dest_dir.join(&file_name), params, opts.dry_run) {
            Ok(facts) => {
                report.kept += 1;
                report.facts_written += facts as u64;
            }
            Err(reason) => report.record(&file_name, reason),
        }
        report.processed += 1;

        if should_report(report.processed, total, REPORT_EVERY) {
            reporter.report(ProgressEvent::Transforming {
                n: report.processed,
                total,
            });
        }
    }

    tracing::info!(
        processed = report.processed,
        kept = report.kept,
        skipped = report.skipped,
        errored = report.errored,
        "transform finished"
    );
    Ok(report)
}

/// Transform one file. Returns the number of facts written.
fn process_file(
    source: &Path,
    dest: &Path,
    params: &TransformParams,
    dry_run: bool,
) -> Result<usize, SkipReason> {
    let bytes = std::fs::read(source).map_err(|e| SkipReason::Io(e.to_string()))?;
    match transform_bytes(&bytes, params)? {
        Outcome::Kept(doc) => {
            let facts = doc.fact_count();
            if !dry_run {
                let json = doc
                    .to_json()
                    .map_err(|e| SkipReason::Malformed(e.to_string()))?;
                std::fs::write(dest, json)
                    .map_err(|e| SkipReason::Io(format!("{}: {}", dest.display(), e)))?;
            }
            Ok(facts)
        }
        Outcome::Dropped { key_count, .. } => Err(SkipReason::EmptyAfterFilter { key_count }),
    }
}

/// CLI entry point for `cfx transform`.
pub fn run_transform(
    config: &Config,
    file_filter: Option<&str>,
    dry_run: bool,
    progress: ProgressMode,
) -> Result<BatchReport> {
    let params = config.transform_params()?;
    let opts = BatchOptions {
        source_dir: &config.paths.company_facts,
        dest_dir: &config.paths.modified_facts,
        file_filter,
        dry_run,
    };
    let report = run_batch(&opts, &params, progress.reporter().as_ref())?;

    if dry_run {
        println!("transform (dry-run)");
    } else {
        println!("transform");
    }
    println!("  source: {}", config.paths.company_facts.display());
    println!("  destination: {}", config.paths.modified_facts.display());
    println!("  processed: {}", report.processed);
    println!("  kept: {}", report.kept);
    println!("  skipped: {}", report.skipped);
    println!("  errors: {}", report.errored);
    println!("  facts written: {}", report.facts_written);
    for entry in report.entries.iter().filter(|e| e.reason.is_error()) {
        println!("  error {}: {}", entry.file_name, entry.reason);
    }
    println!("ok");

    Ok(report)
}
