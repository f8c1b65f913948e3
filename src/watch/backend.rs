// src/watch/backend.rs

//! Pluggable watch backend abstraction.
//!
//! The [`WatcherRegistry`](crate::watch::registry::WatcherRegistry) talks to
//! a `WatchBackend` instead of `notify` directly. This makes it easy to swap
//! in a counting fake in tests while keeping the production `notify`-based
//! implementation here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::path_utils::relative_str;

/// A live source watch for one bundle.
///
/// Closing is idempotent; the registry closes old subscriptions before
/// replacing them and on bundle removal.
pub trait WatchSubscription: Send {
    fn close(&mut self);
}

/// Trait abstracting how per-bundle source watches are created.
///
/// Production code uses [`NotifyBackend`]; tests can provide their own
/// implementation that records subscribe/close calls.
pub trait WatchBackend: Send {
    /// Open a subscription covering `patterns` under `cwd` for `bundle`.
    ///
    /// Whenever a matching source file changes, the implementation sends
    /// `RuntimeEvent::SourceChanged { bundle }` into `events_tx`.
    fn subscribe(
        &self,
        bundle: &str,
        patterns: &[String],
        cwd: &Path,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Result<Box<dyn WatchSubscription>>;
}

/// Real watch backend built on `notify`.
pub struct NotifyBackend;

impl NotifyBackend {
    /// Probe whether the platform's watch backend can be initialised at all.
    ///
    /// Absence of a working backend means "one-shot build only", so callers
    /// degrade gracefully instead of failing startup.
    pub fn detect() -> Result<Self> {
        let probe = RecommendedWatcher::new(|_res: notify::Result<Event>| {}, Config::default());
        probe.context("initialising filesystem watch backend")?;
        Ok(Self)
    }
}

impl WatchBackend for NotifyBackend {
    fn subscribe(
        &self,
        bundle: &str,
        patterns: &[String],
        cwd: &Path,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Result<Box<dyn WatchSubscription>> {
        let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());

        // Relative entries match against the cwd-relative event path;
        // absolute entries match against the full event path and need their
        // own watch roots, since they may live outside cwd entirely.
        let (abs_patterns, rel_patterns): (Vec<String>, Vec<String>) = patterns
            .iter()
            .cloned()
            .partition(|p| Path::new(p).is_absolute());

        let rel_set = build_globset(&rel_patterns)
            .with_context(|| format!("building source globset for bundle {bundle}"))?;
        let abs_set = build_absolute_globset(&abs_patterns)
            .with_context(|| format!("building source globset for bundle {bundle}"))?;
        let rel_set = Arc::new(rel_set);
        let abs_set = Arc::new(abs_set);

        let mut roots: Vec<PathBuf> = Vec::new();
        if !rel_patterns.is_empty() {
            roots.push(cwd.clone());
        }
        for pattern in &abs_patterns {
            let root = absolute_watch_root(pattern);
            let root = root.canonicalize().unwrap_or(root);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        // Channel from the blocking notify callback into the async world.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    eprintln!("bundlewatch: source watch error: {err}");
                }
            },
            Config::default(),
        )?;

        for root in &roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("watching {:?} for bundle {bundle}", root))?;
        }

        info!(bundle = %bundle, roots = ?roots, "source watcher started");

        let bundle_name = bundle.to_string();
        let forward_cwd = cwd.clone();
        let forward_rel = Arc::clone(&rel_set);
        let forward_abs = Arc::clone(&abs_set);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if !is_mutation(&event) {
                    continue;
                }
                let matched = event.paths.iter().any(|path| {
                    if forward_abs.is_match(path) {
                        return true;
                    }
                    relative_str(&forward_cwd, path)
                        .map(|rel| forward_rel.is_match(&rel))
                        .unwrap_or(false)
                });
                if !matched {
                    continue;
                }
                debug!(bundle = %bundle_name, "source change detected");
                if let Err(err) = events_tx
                    .send(RuntimeEvent::SourceChanged {
                        bundle: bundle_name.clone(),
                    })
                    .await
                {
                    warn!(bundle = %bundle_name, "runtime channel closed: {err}");
                    return;
                }
            }
            debug!(bundle = %bundle_name, "source watcher loop ended");
        });

        Ok(Box::new(NotifySubscription {
            watcher: Some(watcher),
        }))
    }
}

/// Subscription wrapper keeping the underlying `notify` watcher alive.
///
/// Dropping the watcher stops file watching; the forwarding task then ends
/// because its event channel closes.
struct NotifySubscription {
    watcher: Option<RecommendedWatcher>,
}

impl WatchSubscription for NotifySubscription {
    fn close(&mut self) {
        self.watcher.take();
    }
}

/// Source patterns match both relative entries (via glob) and the literal
/// file names descriptors typically use.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Globset over absolute entries, matched against full event paths.
///
/// Literal entries also match under their canonical path; notify reports
/// canonicalized paths on some platforms.
fn build_absolute_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);

        if !pat.contains(['*', '?', '[', '{']) {
            if let Ok(canonical) = Path::new(pat).canonicalize() {
                let canonical = canonical.to_string_lossy();
                if canonical != pat.as_str() {
                    let glob = Glob::new(&canonical)
                        .with_context(|| format!("invalid glob pattern: {canonical}"))?;
                    builder.add(glob);
                }
            }
        }
    }
    Ok(builder.build()?)
}

/// The directory to watch for an absolute pattern: its longest literal
/// component prefix, or the parent directory for a plain file entry.
fn absolute_watch_root(pattern: &str) -> PathBuf {
    let path = Path::new(pattern);
    let mut root = PathBuf::new();
    for component in path.components() {
        let literal = component.as_os_str().to_string_lossy();
        if literal.contains(['*', '?', '[', '{']) {
            break;
        }
        root.push(component);
    }
    if root.as_path() == path {
        root.pop();
    }
    root
}

/// Only content mutations count as a change signal; reads and metadata
/// access events are ignored.
fn is_mutation(event: &Event) -> bool {
    use notify::EventKind;
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
