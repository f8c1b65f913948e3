// src/watch/registry.rs

//! Per-bundle source watcher registry.
//!
//! The registry exclusively owns its subscriptions; no other component holds
//! references to them. Invariant: at most one live subscription per bundle
//! name at any time. Changing a descriptor's file list must fully
//! re-subscribe (replace, never incrementally diff), which
//! [`WatcherRegistry::ensure_watching`] enforces by closing the old
//! subscription before opening the new one.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::RuntimeEvent;
use crate::watch::backend::{WatchBackend, WatchSubscription};

pub struct WatcherRegistry {
    backend: Box<dyn WatchBackend>,
    active: HashMap<String, Box<dyn WatchSubscription>>,
}

impl WatcherRegistry {
    pub fn new(backend: Box<dyn WatchBackend>) -> Self {
        Self {
            backend,
            active: HashMap::new(),
        }
    }

    /// Open (or replace) the source watch for `bundle`.
    ///
    /// Any existing subscription is closed before the new one is opened. If
    /// opening fails, the old subscription stays closed and the bundle ends
    /// up unwatched; the error is returned for the caller to report.
    pub fn ensure_watching(
        &mut self,
        bundle: &str,
        patterns: &[String],
        cwd: &Path,
        events_tx: &mpsc::Sender<RuntimeEvent>,
    ) -> Result<()> {
        if let Some(mut old) = self.active.remove(bundle) {
            debug!(bundle = %bundle, "closing previous source watcher before replacing");
            old.close();
        }

        let subscription = self
            .backend
            .subscribe(bundle, patterns, cwd, events_tx.clone())?;
        self.active.insert(bundle.to_string(), subscription);
        Ok(())
    }

    /// Close and remove the subscription for `bundle`, if present.
    ///
    /// Calling this for an unknown bundle is a no-op.
    pub fn stop_watching(&mut self, bundle: &str) {
        if let Some(mut subscription) = self.active.remove(bundle) {
            debug!(bundle = %bundle, "closing source watcher");
            subscription.close();
        }
    }

    pub fn is_watching(&self, bundle: &str) -> bool {
        self.active.contains_key(bundle)
    }

    pub fn watched_count(&self) -> usize {
        self.active.len()
    }
}

impl Drop for WatcherRegistry {
    fn drop(&mut self) {
        for (_, mut subscription) in self.active.drain() {
            subscription.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct CountingBackend {
        counters: Arc<Counters>,
    }

    struct CountingSubscription {
        counters: Arc<Counters>,
        open: bool,
    }

    impl WatchSubscription for CountingSubscription {
        fn close(&mut self) {
            if self.open {
                self.open = false;
                self.counters.closed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl WatchBackend for CountingBackend {
        fn subscribe(
            &self,
            _bundle: &str,
            _patterns: &[String],
            _cwd: &Path,
            _events_tx: mpsc::Sender<RuntimeEvent>,
        ) -> Result<Box<dyn WatchSubscription>> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingSubscription {
                counters: Arc::clone(&self.counters),
                open: true,
            }))
        }
    }

    fn registry_with_counters() -> (WatcherRegistry, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let backend = CountingBackend {
            counters: Arc::clone(&counters),
        };
        (WatcherRegistry::new(Box::new(backend)), counters)
    }

    #[tokio::test]
    async fn repeated_ensure_watching_keeps_exactly_one_live_watcher() {
        let (mut registry, counters) = registry_with_counters();
        let (tx, _rx) = mpsc::channel(8);

        let n = 5;
        for _ in 0..n {
            registry
                .ensure_watching("app", &["*.js".to_string()], Path::new("."), &tx)
                .unwrap();
        }

        assert_eq!(registry.watched_count(), 1);
        assert!(registry.is_watching("app"));
        assert_eq!(counters.opened.load(Ordering::SeqCst), n);
        assert_eq!(counters.closed.load(Ordering::SeqCst), n - 1);
    }

    #[tokio::test]
    async fn stop_watching_twice_is_a_noop_the_second_time() {
        let (mut registry, counters) = registry_with_counters();
        let (tx, _rx) = mpsc::channel(8);

        registry
            .ensure_watching("app", &["*.js".to_string()], Path::new("."), &tx)
            .unwrap();

        registry.stop_watching("app");
        registry.stop_watching("app");

        assert!(!registry.is_watching("app"));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bundles_are_watched_independently() {
        let (mut registry, counters) = registry_with_counters();
        let (tx, _rx) = mpsc::channel(8);

        registry
            .ensure_watching("app", &["*.js".to_string()], Path::new("."), &tx)
            .unwrap();
        registry
            .ensure_watching("admin", &["*.js".to_string()], Path::new("."), &tx)
            .unwrap();

        registry.stop_watching("app");

        assert!(!registry.is_watching("app"));
        assert!(registry.is_watching("admin"));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }
}
