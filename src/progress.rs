//! Import progress reporting.
//!
//! Reports per-line progress during `intel import` so users see how far a
//! long file has got and how many lines failed so far. Progress is emitted
//! on **stderr** so stdout remains parseable for scripts.

use intel_harness_core::import::{ImportLogEntry, ImportSummary, LineStatus};
use std::io::Write;

/// A single progress event for an import run.
#[derive(Clone, Debug)]
pub enum ImportProgressEvent {
    /// The file was read and split; `total` lines are queued.
    Started { file: String, total: u64 },
    /// `n` of `total` queued lines have been processed.
    Line {
        n: u64,
        total: u64,
        entry: ImportLogEntry,
    },
    /// The queue is drained.
    Finished { summary: ImportSummary },
}

/// Reports import progress. Implementations write to stderr (human or JSON).
pub trait ImportProgressReporter: Send + Sync {
    fn report(&self, event: ImportProgressEvent);
}

/// Human-friendly progress on stderr: "import posts.csv  1,234 / 5,000 lines".
pub struct StderrProgress;

impl ImportProgressReporter for StderrProgress {
    fn report(&self, event: ImportProgressEvent) {
        let line = human_line(&event);
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

fn human_line(event: &ImportProgressEvent) -> String {
    match event {
        ImportProgressEvent::Started { file, total } => {
            format!("import {}  {} lines queued\n", file, format_number(*total))
        }
        ImportProgressEvent::Line { n, total, entry } => {
            let mut line = format!(
                "import  {} / {} lines",
                format_number(*n),
                format_number(*total)
            );
            if entry.status != LineStatus::Ok {
                line.push_str(&format!(
                    "  (line {}: {})",
                    entry.line_number, entry.message
                ));
            }
            line.push('\n');
            line
        }
        ImportProgressEvent::Finished { summary } => format!(
            "import done  {} imported, {} failed, {} cancelled\n",
            format_number(summary.imported as u64),
            format_number(summary.failed as u64),
            format_number(summary.cancelled as u64)
        ),
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ImportProgressReporter for JsonProgress {
    fn report(&self, event: ImportProgressEvent) {
        let obj = match &event {
            ImportProgressEvent::Started { file, total } => serde_json::json!({
                "event": "progress",
                "phase": "started",
                "file": file,
                "total": total
            }),
            ImportProgressEvent::Line { n, total, entry } => serde_json::json!({
                "event": "progress",
                "phase": "importing",
                "n": n,
                "total": total,
                "line_number": entry.line_number,
                "status": entry.status
            }),
            ImportProgressEvent::Finished { summary } => serde_json::json!({
                "event": "progress",
                "phase": "finished",
                "summary": summary
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

impl ImportProgressReporter for NoProgress {
    fn report(&self, _event: ImportProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
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

    pub fn reporter(&self) -> Box<dyn ImportProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn finished_line_reports_cancelled() {
        let summary = ImportSummary {
            imported: 1_200,
            failed: 3,
            cancelled: 1,
        };
        assert_eq!(
            human_line(&ImportProgressEvent::Finished { summary }),
            "import done  1,200 imported, 3 failed, 1 cancelled\n"
        );
    }
}
