use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use bundlewatch::engine::RuntimeEvent;
use bundlewatch::watch::{WatchBackend, WatchSubscription};

/// State of one subscription opened through the fake backend.
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    pub bundle: String,
    pub patterns: Vec<String>,
    pub cwd: PathBuf,
    pub closed: bool,
}

/// Shared log of every subscription the fake backend ever opened, in open
/// order. Tests inspect it to assert replace/close semantics.
pub type WatchLog = Arc<Mutex<Vec<SubscriptionState>>>;

/// A fake watch backend that records subscribe/close calls instead of
/// touching the filesystem.
pub struct FakeWatchBackend {
    log: WatchLog,
}

impl FakeWatchBackend {
    pub fn new() -> (Self, WatchLog) {
        let log: WatchLog = Arc::new(Mutex::new(Vec::new()));
        (Self { log: Arc::clone(&log) }, log)
    }
}

impl WatchBackend for FakeWatchBackend {
    fn subscribe(
        &self,
        bundle: &str,
        patterns: &[String],
        cwd: &Path,
        _events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> anyhow::Result<Box<dyn WatchSubscription>> {
        let mut log = self.log.lock().unwrap();
        let index = log.len();
        log.push(SubscriptionState {
            bundle: bundle.to_string(),
            patterns: patterns.to_vec(),
            cwd: cwd.to_path_buf(),
            closed: false,
        });

        Ok(Box::new(FakeSubscription {
            log: Arc::clone(&self.log),
            index,
        }))
    }
}

struct FakeSubscription {
    log: WatchLog,
    index: usize,
}

impl WatchSubscription for FakeSubscription {
    fn close(&mut self) {
        let mut log = self.log.lock().unwrap();
        log[self.index].closed = true;
    }
}

/// Convenience assertions over a [`WatchLog`].
pub fn live_subscriptions(log: &WatchLog) -> Vec<SubscriptionState> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|s| !s.closed)
        .cloned()
        .collect()
}

pub fn closed_count(log: &WatchLog) -> usize {
    log.lock().unwrap().iter().filter(|s| s.closed).count()
}

pub fn opened_count(log: &WatchLog) -> usize {
    log.lock().unwrap().len()
}
