use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::Notify;

/// Counts the paths that still have to be probed against every target and
/// releases [`CompletionTracker::wait`] once that count reaches zero.
pub struct CompletionTracker {
    remaining: AtomicUsize,
    notify: Notify,
    pb: ProgressBar,
}

impl CompletionTracker {
    pub fn new(outstanding: usize) -> Arc<Self> {
        Self::with_progress(outstanding, ProgressBar::hidden())
    }

    pub fn with_progress(outstanding: usize, pb: ProgressBar) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(outstanding),
            notify: Notify::new(),
            pb,
        })
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn unit(self: &Arc<Self>, path: String) -> WorkUnit {
        WorkUnit {
            path,
            tracker: Arc::clone(self),
            done: false,
        }
    }

    // accounts for paths that will never reach a worker
    pub fn forfeit(&self, count: usize) {
        for _ in 0..count {
            self.complete_one();
        }
    }

    fn complete_one(&self) {
        let prev = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match prev {
            Ok(1) => {
                self.pb.inc(1);
                self.notify.notify_waiters();
            }
            Ok(_) => self.pb.inc(1),
            Err(_) => tracing::warn!("work unit completed with nothing outstanding"),
        }
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for CompletionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTracker")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// One wordlist entry in flight. Completing it consumes the unit; a unit that
/// is dropped without an explicit `complete` (a worker unwinding mid-path)
/// still counts, so the tracker is never starved.
#[derive(Debug)]
pub struct WorkUnit {
    path: String,
    tracker: Arc<CompletionTracker>,
    done: bool,
}

impl WorkUnit {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn complete(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.tracker.complete_one();
        }
    }
}

impl Drop for WorkUnit {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn zero_outstanding_returns_immediately() {
        let tracker = CompletionTracker::new(0);
        tokio::time::timeout(Duration::from_secs(1), tracker.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_releases_after_last_unit() {
        let tracker = CompletionTracker::new(3);
        let units: Vec<WorkUnit> = ["a", "b", "c"]
            .iter()
            .map(|p| tracker.unit(p.to_string()))
            .collect();

        let waiter = tokio::spawn({
            let tracker = Arc::clone(&tracker);
            async move { tracker.wait().await }
        });

        let mut units = units.into_iter();
        units.next().unwrap().complete();
        units.next().unwrap().complete();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(tracker.remaining(), 1);

        units.next().unwrap().complete();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn dropped_unit_counts_once() {
        let tracker = CompletionTracker::new(2);
        let unit = tracker.unit("admin".to_string());
        drop(unit);
        assert_eq!(tracker.remaining(), 1);
        tracker.forfeit(1);
        assert_eq!(tracker.remaining(), 0);
        // extra completions never wrap the counter
        tracker.forfeit(1);
        assert_eq!(tracker.remaining(), 0);
    }
}
