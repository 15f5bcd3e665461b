//! Fetch and transform progress reporting.
//!
//! Progress is emitted on **stderr** so stdout stays parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// Archive download: bytes received so far, total if the server sent one.
    Downloading { bytes: u64, total: Option<u64> },
    /// Archive extraction: entries written so far out of the archive's total.
    Extracting { n: u64, total: u64 },
    /// Transform: n documents processed out of total.
    Transforming { n: u64, total: u64 },
}

/// Reports progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "transform  1,234 / 5,000 documents".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Downloading { bytes, total } => match total {
                Some(t) => format!(
                    "fetch  downloading  {} / {} bytes\n",
                    format_number(*bytes),
                    format_number(*t)
                ),
                None => format!("fetch  downloading  {} bytes\n", format_number(*bytes)),
            },
            ProgressEvent::Extracting { n, total } => format!(
                "fetch  extracting  {} / {} entries\n",
                format_number(*n),
                format_number(*total)
            ),
            ProgressEvent::Transforming { n, total } => format!(
                "transform  {} / {} documents\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Downloading { bytes, total } => serde_json::json!({
                "event": "progress",
                "phase": "downloading",
                "bytes": bytes,
                "total": total
            }),
            ProgressEvent::Extracting { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "extracting",
                "n": n,
                "total": total
            }),
            ProgressEvent::Transforming { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "transforming",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Emit a transform event only every `every` documents, and on the last one.
pub fn should_report(n: u64, total: u64, every: u64) -> bool {
    n == total || (every > 0 && n % every == 0)
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
