//! Best-effort sequential import of forum posts from CSV text.
//!
//! Lines are parsed and submitted strictly one at a time, in file order.
//! A line that fails to parse, or that the store rejects, is logged and the
//! import moves on; nothing is retried or rolled back. The result is an
//! ordered audit log with one entry per processed line.
//!
//! The pipeline is an explicit queue: [`ImportQueue::step`] handles exactly
//! one line and returns its log entry, so a host can render progress
//! between lines and never has more than one submission in flight.
//! [`run_import`] drains the queue in one call.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::csv_record::{parse_line, PostPayload};
use crate::store::{RecordStore, StoreError};

/// Outcome of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Ok,
    Error,
    Cancelled,
}

/// One entry of the import audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLogEntry {
    /// 1-based; see [`LineNumbering`] for what it counts.
    pub line_number: usize,
    pub status: LineStatus,
    pub message: String,
}

impl ImportLogEntry {
    fn ok(line_number: usize) -> Self {
        Self {
            line_number,
            status: LineStatus::Ok,
            message: "imported".to_string(),
        }
    }

    fn error(line_number: usize, message: impl Into<String>) -> Self {
        Self {
            line_number,
            status: LineStatus::Error,
            message: message.into(),
        }
    }
}

/// What log line numbers count.
///
/// Empty lines are always skipped without a log entry. `Compacted` numbers
/// the remaining lines consecutively, so "line N" is the N-th non-empty
/// line. `Physical` reports the line's position in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineNumbering {
    #[default]
    Compacted,
    Physical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub numbering: LineNumbering,
}

/// Cooperative cancellation flag, checked before each submission.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Totals over an import log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl ImportSummary {
    pub fn from_log(log: &[ImportLogEntry]) -> Self {
        log.iter().fold(Self::default(), |mut acc, entry| {
            match entry.status {
                LineStatus::Ok => acc.imported += 1,
                LineStatus::Error => acc.failed += 1,
                LineStatus::Cancelled => acc.cancelled += 1,
            }
            acc
        })
    }
}

/// Pending lines of one import run.
pub struct ImportQueue<'a> {
    destination_id: String,
    pending: VecDeque<(usize, &'a str)>,
    total: usize,
    cancel: Option<CancelToken>,
}

impl<'a> ImportQueue<'a> {
    /// Splits `text` into lines (LF or CRLF), dropping empty ones.
    pub fn new(text: &'a str, destination_id: &str, options: ImportOptions) -> Self {
        let pending: VecDeque<(usize, &str)> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .enumerate()
            .map(|(kept, (physical, line))| {
                let number = match options.numbering {
                    LineNumbering::Compacted => kept + 1,
                    LineNumbering::Physical => physical + 1,
                };
                (number, line)
            })
            .collect();
        let total = pending.len();
        Self {
            destination_id: destination_id.to_string(),
            pending,
            total,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of lines the queue started with.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Processes the next line and returns its log entry, or `None` once
    /// the queue is drained.
    ///
    /// When the cancel token is set, a single `cancelled` entry is returned
    /// for the next line and the rest of the queue is dropped.
    pub async fn step<S>(&mut self, store: &S) -> Option<ImportLogEntry>
    where
        S: RecordStore + ?Sized,
    {
        let (line_number, line) = self.pending.pop_front()?;

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            let skipped = self.pending.len() + 1;
            self.pending.clear();
            return Some(ImportLogEntry {
                line_number,
                status: LineStatus::Cancelled,
                message: format!("cancelled ({skipped} lines not processed)"),
            });
        }

        let payload = match parse_line(line, &self.destination_id) {
            Ok(payload) => payload,
            Err(e) => return Some(ImportLogEntry::error(line_number, e.to_string())),
        };

        Some(submit(store, line_number, &payload).await)
    }
}

async fn submit<S>(store: &S, line_number: usize, payload: &PostPayload) -> ImportLogEntry
where
    S: RecordStore + ?Sized,
{
    match store.create_post(payload).await {
        Ok(_) => ImportLogEntry::ok(line_number),
        Err(StoreError::Rejected { status, .. }) => {
            ImportLogEntry::error(line_number, format!("import failed (HTTP {status})"))
        }
        Err(StoreError::Transport(msg)) => {
            ImportLogEntry::error(line_number, format!("import failed: {msg}"))
        }
        Err(StoreError::Unexpected(msg)) => {
            ImportLogEntry::error(line_number, format!("unexpected error: {msg}"))
        }
    }
}

/// Imports every line of `text` into `destination_id`, returning the full
/// log. Never fails: every per-line problem becomes a log entry.
pub async fn run_import<S>(
    text: &str,
    destination_id: &str,
    store: &S,
    options: ImportOptions,
) -> Vec<ImportLogEntry>
where
    S: RecordStore + ?Sized,
{
    let mut queue = ImportQueue::new(text, destination_id, options);
    let mut log = Vec::with_capacity(queue.total());
    while let Some(entry) = queue.step(store).await {
        log.push(entry);
    }
    log
}
