pub mod tracker;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{self, JoinHandle};

use crate::output::ResultSink;
use crate::prober::{self, ProbeError, ProbeOutcome};
use crate::utils;

pub use tracker::{CompletionTracker, WorkUnit};

// workers pull from a single bounded queue; the mutex turns the mpsc receiver
// into a multi-consumer one
pub type JobQueue = Arc<Mutex<mpsc::Receiver<WorkUnit>>>;

// the dispatcher may run at most two paths per worker ahead of consumption
pub fn job_queue(workers: usize) -> (mpsc::Sender<WorkUnit>, JobQueue) {
    let capacity = workers.max(1).saturating_mul(2);
    let (tx, rx) = mpsc::channel::<WorkUnit>(capacity);
    (tx, Arc::new(Mutex::new(rx)))
}

/// Feeds every path into the queue exactly once, waiting whenever the queue is
/// full. Dropping `tx` at the end closes the queue; paths already buffered stay
/// readable until a worker takes them. Returns the number of paths enqueued.
pub async fn send_paths(
    tx: mpsc::Sender<WorkUnit>,
    paths: Vec<String>,
    tracker: Arc<CompletionTracker>,
) -> usize {
    let total = paths.len();
    let mut sent = 0usize;
    for path in paths {
        let unit = tracker.unit(path);
        if tx.send(unit).await.is_err() {
            // every worker is gone; nobody will ever pick up the rest
            let lost = total - sent - 1;
            tracing::warn!(lost = lost + 1, "job queue closed before all paths were sent");
            tracker.forfeit(lost);
            break;
        }
        sent += 1;
    }
    tracing::debug!(sent, "all paths dispatched");
    sent
}

#[derive(Clone, Debug)]
pub struct WorkerContext {
    pub targets: Arc<Vec<String>>,
    pub sink: ResultSink,
    pub fetch_title: bool,
}

pub fn spawn_workers(
    clients: Vec<reqwest::Client>,
    queue: JobQueue,
    ctx: WorkerContext,
) -> Vec<JoinHandle<usize>> {
    clients
        .into_iter()
        .enumerate()
        .map(|(id, client)| {
            let queue = Arc::clone(&queue);
            let ctx = ctx.clone();
            task::spawn(async move { run_worker(id, client, queue, ctx).await })
        })
        .collect()
}

/// Drains the queue until it is closed and empty. Each dequeued path is probed
/// against every target in order, then its work unit is completed. Returns the
/// number of paths this worker handled.
pub async fn run_worker(
    id: usize,
    client: reqwest::Client,
    queue: JobQueue,
    ctx: WorkerContext,
) -> usize {
    tracing::debug!(worker = id, "worker started");
    let mut handled = 0usize;
    loop {
        let unit = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let unit = match unit {
            Some(unit) => unit,
            None => break,
        };
        process_unit(&client, &ctx, unit).await;
        handled += 1;
    }
    tracing::debug!(worker = id, handled, "worker finished");
    handled
}

async fn process_unit(client: &reqwest::Client, ctx: &WorkerContext, unit: WorkUnit) {
    for target in ctx.targets.iter() {
        let url = utils::format_url(target, unit.path());
        let outcome = guard_probe(
            url,
            prober::probe(client, target, unit.path(), ctx.fetch_title),
        )
        .await;
        ctx.sink.accept(outcome).await;
    }
    unit.complete();
}

/// Runs a single probe inside its own fault boundary. A panic turns into a
/// failed outcome for `url` instead of taking the whole worker down.
pub async fn guard_probe<F>(url: String, fut: F) -> ProbeOutcome
where
    F: Future<Output = ProbeOutcome>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(url = %url, %message, "probe panicked");
            ProbeOutcome::failed(url, ProbeError::Panicked { message })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = panic.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}
