use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;
use tokio::task;
use tokio::time::Instant;

use crate::bruteforcer::{self, CompletionTracker, WorkerContext};
use crate::output::{self, Finding, ResultSink};
use crate::prober::{self, ClientConfig};
use crate::utils::{self, ReadLinesError};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub enum WordlistSource {
    FilePath(String),
    Inline(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct Options {
    pub urls: Vec<String>,
    pub url_file: Option<String>,
    pub wordlist: Option<WordlistSource>,
    pub workers: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub fetch_title: bool,
    pub color: bool,
    pub progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            url_file: None,
            wordlist: None,
            workers: DEFAULT_WORKERS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: prober::DEFAULT_USER_AGENT.to_string(),
            fetch_title: true,
            color: true,
            progress: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no targets provided (urls and url_file are both empty)")]
    NoTargets,

    #[error("a wordlist is required")]
    MissingWordlist,

    #[error("invalid worker count {value}, expected at least 1")]
    InvalidWorkers { value: usize },

    #[error("invalid timeout {value}, expected at least 1 second")]
    InvalidTimeout { value: u64 },

    #[error("failed to open file for {kind}: {path}: {source}")]
    FileOpen {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read lines for {kind}: {path}: {source}")]
    FileRead {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write results: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    #[error("task join failed: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Clone, Debug)]
pub struct ScanResult {
    pub elapsed: Duration,
    pub targets: usize,
    pub paths: usize,
    pub probes_sent: usize,
    pub probes_failed: usize,
    pub findings: Vec<Finding>,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        let has_url_file = options
            .url_file
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false);
        if options.urls.iter().all(|u| u.trim().is_empty()) && !has_url_file {
            return Err(RunnerError::NoTargets);
        }
        if options.wordlist.is_none() {
            return Err(RunnerError::MissingWordlist);
        }
        if options.workers == 0 {
            return Err(RunnerError::InvalidWorkers {
                value: options.workers,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<ScanResult, RunnerError> {
        let (result, _) = self.run_with_output(std::io::stdout()).await?;
        Ok(result)
    }

    /// Runs the scan, writing one line per finding to `out`. Returns once every
    /// path has been probed against every target, handing `out` back.
    pub async fn run_with_output<W>(&self, out: W) -> Result<(ScanResult, W), RunnerError>
    where
        W: Write + Send + 'static,
    {
        let started_at = Instant::now();

        let targets = load_targets(&self.options.urls, self.options.url_file.as_deref()).await?;
        let paths = match self.options.wordlist.as_ref() {
            Some(source) => load_wordlist(source).await?,
            None => return Err(RunnerError::MissingWordlist),
        };

        let client_config = ClientConfig {
            timeout_seconds: self.options.timeout_seconds,
            user_agent: self.options.user_agent.clone(),
        };
        let mut clients = Vec::with_capacity(self.options.workers);
        for _ in 0..self.options.workers {
            let client = prober::build_client(&client_config)
                .map_err(|e| RunnerError::HttpClientBuild { source: e })?;
            clients.push(client);
        }

        let pb = progress_bar(self.options.progress, paths.len());
        let target_count = targets.len();
        let path_count = paths.len();
        tracing::info!(
            targets = target_count,
            paths = path_count,
            workers = self.options.workers,
            "starting scan"
        );

        let tracker = CompletionTracker::with_progress(path_count, pb.clone());
        let (sink, sink_rx) = ResultSink::channel();
        let writer_handle = output::spawn_writer(sink_rx, out, self.options.color, pb.clone());

        let (job_tx, queue) = bruteforcer::job_queue(self.options.workers);
        let ctx = WorkerContext {
            targets: Arc::new(targets),
            sink: sink.clone(),
            fetch_title: self.options.fetch_title,
        };
        let workers = bruteforcer::spawn_workers(clients, queue, ctx);

        let dispatch_handle = task::spawn(bruteforcer::send_paths(
            job_tx,
            paths,
            Arc::clone(&tracker),
        ));

        tracker.wait().await;

        dispatch_handle
            .await
            .map_err(|e| RunnerError::TaskJoin { source: e })?;
        for w in workers {
            w.await.map_err(|e| RunnerError::TaskJoin { source: e })?;
        }

        let counts = sink.counts();
        drop(sink);
        let (out, findings) = writer_handle
            .await
            .map_err(|e| RunnerError::TaskJoin { source: e })?
            .map_err(|e| RunnerError::Output { source: e })?;
        pb.finish_and_clear();

        let elapsed = started_at.elapsed();
        tracing::info!(
            findings = findings.len(),
            failed = counts.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan completed"
        );

        Ok((
            ScanResult {
                elapsed,
                targets: target_count,
                paths: path_count,
                probes_sent: counts.accepted,
                probes_failed: counts.failed,
                findings,
            },
            out,
        ))
    }
}

fn progress_bar(enabled: bool, len: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} paths")
    {
        pb.set_style(style);
    }
    pb
}

fn map_read_error(kind: &'static str, path: String, err: ReadLinesError) -> RunnerError {
    match err {
        ReadLinesError::Open(source) => RunnerError::FileOpen { kind, path, source },
        ReadLinesError::Read(source) => RunnerError::FileRead { kind, path, source },
    }
}

pub(crate) async fn load_targets(
    urls: &[String],
    url_file: Option<&str>,
) -> Result<Vec<String>, RunnerError> {
    let mut out = utils::clean_lines(urls);

    if let Some(path) = url_file.filter(|p| !p.trim().is_empty()) {
        let path = crate::config::expand_tilde_string(path);
        let lines = utils::read_lines(&path)
            .await
            .map_err(|e| map_read_error("url_file", path.clone(), e))?;
        out.extend(lines);
    }

    if out.is_empty() {
        return Err(RunnerError::NoTargets);
    }

    Ok(out)
}

pub(crate) async fn load_wordlist(source: &WordlistSource) -> Result<Vec<String>, RunnerError> {
    match source {
        WordlistSource::Inline(values) => Ok(utils::clean_lines(values)),
        WordlistSource::FilePath(path) => {
            let path = crate::config::expand_tilde_string(path.as_str());
            utils::read_lines(&path)
                .await
                .map_err(|e| map_read_error("wordlist", path.clone(), e))
        }
    }
}
