use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use colored::Colorize;
use indicatif::ProgressBar;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};

use crate::prober::{ProbeOutcome, Title};
use crate::utils::{truncate_string, MAX_FIELD_LEN};

pub const NOT_FOUND: u16 = 404;

const SINK_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    Other,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::Other,
        }
    }

    fn paint(self, text: &str) -> String {
        match self {
            StatusClass::Success => text.green().to_string(),
            StatusClass::Redirect => text.blue().to_string(),
            StatusClass::ClientError => text.yellow().to_string(),
            StatusClass::Other => text.red().to_string(),
        }
    }
}

// a probe outcome that made it past the 404 filter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub url: String,
    pub status: u16,
    pub class: StatusClass,
    pub title: Option<Title>,
}

pub fn format_line(finding: &Finding, color: bool) -> String {
    let url = truncate_string(&finding.url, MAX_FIELD_LEN);
    let paint = |status: String| {
        if color {
            finding.class.paint(&status)
        } else {
            status
        }
    };
    // the status column is only padded when a title follows it
    match finding.title.as_ref() {
        Some(title) => format!(
            "{:<40} {} {}",
            url,
            paint(format!("{:<10}", finding.status)),
            truncate_string(title.as_str(), MAX_FIELD_LEN)
        ),
        None => format!("{:<40} {}", url, paint(finding.status.to_string())),
    }
}

#[derive(Debug, Default)]
struct SinkStats {
    accepted: AtomicUsize,
    failed: AtomicUsize,
    suppressed: AtomicUsize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkCounts {
    pub accepted: usize,
    pub failed: usize,
    pub suppressed: usize,
}

/// Producer side of the result stream. Cheap to clone, one per worker; every
/// surfaced line is handed to the single writer spawned by [`spawn_writer`].
#[derive(Clone, Debug)]
pub struct ResultSink {
    tx: mpsc::Sender<Finding>,
    stats: Arc<SinkStats>,
}

impl ResultSink {
    pub fn channel() -> (Self, mpsc::Receiver<Finding>) {
        let (tx, rx) = mpsc::channel::<Finding>(SINK_CAPACITY);
        let sink = Self {
            tx,
            stats: Arc::new(SinkStats::default()),
        };
        (sink, rx)
    }

    // returns true when the outcome was surfaced
    pub async fn accept(&self, outcome: ProbeOutcome) -> bool {
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
        let response = match outcome.result {
            Ok(response) => response,
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %outcome.url, error = %e, "probe failed");
                return false;
            }
        };
        if response.status == NOT_FOUND {
            self.stats.suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let finding = Finding {
            url: outcome.url,
            status: response.status,
            class: StatusClass::of(response.status),
            title: response.title,
        };
        if self.tx.send(finding).await.is_err() {
            tracing::warn!("result writer is gone, dropping finding");
            return false;
        }
        true
    }

    pub fn counts(&self) -> SinkCounts {
        SinkCounts {
            accepted: self.stats.accepted.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            suppressed: self.stats.suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Spawns the dedicated output thread. It owns `out` and writes one whole line
/// per finding, so concurrent workers never interleave partial lines. Returns
/// the writer and everything written once every [`ResultSink`] is dropped.
pub fn spawn_writer<W>(
    mut rx: mpsc::Receiver<Finding>,
    mut out: W,
    color: bool,
    pb: ProgressBar,
) -> JoinHandle<std::io::Result<(W, Vec<Finding>)>>
where
    W: Write + Send + 'static,
{
    task::spawn_blocking(move || {
        let mut written = Vec::new();
        while let Some(finding) = rx.blocking_recv() {
            let mut line = format_line(&finding, color);
            line.push('\n');
            if pb.is_hidden() {
                out.write_all(line.as_bytes())?;
                out.flush()?;
            } else {
                pb.suspend(|| -> std::io::Result<()> {
                    out.write_all(line.as_bytes())?;
                    out.flush()
                })?;
            }
            written.push(finding);
        }
        Ok((out, written))
    })
}
