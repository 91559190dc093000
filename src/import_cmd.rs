//! `intel import`: bulk-load forum posts from a CSV file.
//!
//! The file is read in one go; a read failure is the only error that ends
//! the command. Every line after that is best-effort: the full per-line log
//! is printed even when every line failed. Ctrl-C cancels the run between
//! lines.

use anyhow::{Context, Result};
use intel_harness_core::import::{
    CancelToken, ImportLogEntry, ImportOptions, ImportQueue, ImportSummary, LineNumbering,
    LineStatus,
};
use intel_harness_core::store::RecordStore;
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::http_store::HttpRecordStore;
use crate::progress::{ImportProgressEvent, ImportProgressReporter, ProgressMode};

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub log: Vec<ImportLogEntry>,
    pub summary: ImportSummary,
}

/// Drains an import queue over `text`, reporting after every line.
pub async fn import_text<S>(
    store: &S,
    text: &str,
    destination_id: &str,
    options: ImportOptions,
    cancel: CancelToken,
    label: &str,
    progress: &dyn ImportProgressReporter,
) -> ImportReport
where
    S: RecordStore + ?Sized,
{
    let mut queue = ImportQueue::new(text, destination_id, options).with_cancel(cancel);
    let total = queue.total() as u64;
    progress.report(ImportProgressEvent::Started {
        file: label.to_string(),
        total,
    });
    tracing::info!(destination = destination_id, lines = total, "import started");

    let mut log = Vec::with_capacity(queue.total());
    while let Some(entry) = queue.step(store).await {
        match entry.status {
            LineStatus::Ok => {}
            LineStatus::Error => {
                tracing::debug!(line = entry.line_number, message = %entry.message, "line failed")
            }
            LineStatus::Cancelled => {
                tracing::warn!(line = entry.line_number, "import cancelled")
            }
        }
        log.push(entry.clone());
        progress.report(ImportProgressEvent::Line {
            n: log.len() as u64,
            total,
            entry,
        });
    }

    let summary = ImportSummary::from_log(&log);
    progress.report(ImportProgressEvent::Finished { summary });
    tracing::info!(
        imported = summary.imported,
        failed = summary.failed,
        "import finished"
    );
    ImportReport { log, summary }
}

pub async fn run_import(
    config: &Config,
    file: &Path,
    forum_id: &str,
    numbering: Option<LineNumbering>,
    progress: ProgressMode,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;

    let store = HttpRecordStore::from_config(config)?;
    let options = ImportOptions {
        numbering: numbering.unwrap_or(config.import.line_numbering),
    };

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let reporter = progress.reporter();
    let report = import_text(
        &store,
        &text,
        forum_id,
        options,
        cancel,
        &file.display().to_string(),
        reporter.as_ref(),
    )
    .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for entry in &report.log {
        println!(
            "line {:>5}  {:<9} {}",
            entry.line_number,
            status_label(entry.status),
            entry.message
        );
    }
    println!();
    println!(
        "imported: {}  failed: {}  cancelled: {}",
        report.summary.imported, report.summary.failed, report.summary.cancelled
    );

    Ok(())
}

fn status_label(status: LineStatus) -> &'static str {
    match status {
        LineStatus::Ok => "ok",
        LineStatus::Error => "error",
        LineStatus::Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use intel_harness_core::store::memory::InMemoryStore;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<String>>);

    impl ImportProgressReporter for Recording {
        fn report(&self, event: ImportProgressEvent) {
            let tag = match event {
                ImportProgressEvent::Started { total, .. } => format!("start {total}"),
                ImportProgressEvent::Line { n, .. } => format!("line {n}"),
                ImportProgressEvent::Finished { summary } => format!("done {}", summary.imported),
            };
            self.0.lock().unwrap().push(tag);
        }
    }

    #[tokio::test]
    async fn reports_every_line() {
        let store = InMemoryStore::new();
        store.add_forum("f1", "Forum");
        let text = "u,t,a,c,cat,[],0,2024-01-01\nshort\nu,t2,a,c,cat,[],0,2024-01-02\n";
        let progress = Recording(Mutex::new(Vec::new()));

        let report = import_text(
            &store,
            text,
            "f1",
            ImportOptions::default(),
            CancelToken::new(),
            "posts.csv",
            &progress,
        )
        .await;

        assert_eq!(report.summary.imported, 2);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(
            *progress.0.lock().unwrap(),
            vec!["start 3", "line 1", "line 2", "line 3", "done 2"]
        );
    }

    #[tokio::test]
    async fn report_serializes_log_and_summary() {
        let store = InMemoryStore::new();
        let report = import_text(
            &store,
            "a,b",
            "f1",
            ImportOptions::default(),
            CancelToken::new(),
            "x.csv",
            &NoProgress,
        )
        .await;
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["log"][0]["status"], "error");
        assert_eq!(value["log"][0]["message"], "wrong field count");
        assert_eq!(value["summary"]["failed"], 1);
    }
}
