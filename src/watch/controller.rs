// src/watch/controller.rs

//! Descriptor directory watcher.
//!
//! Watches the descriptor base directory itself and maps filesystem events
//! on `*.json` files into descriptor lifecycle events for the runtime. On
//! startup it fires a synthetic add for every descriptor already present, so
//! build+watch setup for pre-existing bundles goes through the same code
//! path as newly added ones.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::descriptor::{self, DESCRIPTOR_EXT};
use crate::engine::RuntimeEvent;

/// Handle keeping the descriptor directory watcher alive.
///
/// Dropping this handle stops descriptor watching.
pub struct DescriptorWatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for DescriptorWatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorWatcherHandle").finish()
    }
}

/// Spawn the watcher over `base_dir` and seed the runtime with synthetic
/// add events for every descriptor currently present.
pub fn spawn_descriptor_watcher(
    base_dir: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<DescriptorWatcherHandle> {
    let base_dir = base_dir.into();
    let base_dir = base_dir.canonicalize().unwrap_or(base_dir);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => {
                eprintln!("bundlewatch: descriptor watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&base_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching descriptor directory {:?}", base_dir))?;

    info!(dir = ?base_dir, "descriptor watcher started");

    // Synthetic adds for descriptors that already exist, sent before any
    // live event can be consumed so startup ordering is deterministic.
    let initial = descriptor::list_descriptors(&base_dir)
        .with_context(|| format!("enumerating descriptors in {:?}", base_dir))?;

    let seed_tx = runtime_tx.clone();
    let forward_base = base_dir.clone();
    tokio::spawn(async move {
        for file_name in initial {
            let bundle = descriptor::bundle_name(&file_name);
            debug!(bundle = %bundle, "synthetic add for pre-existing descriptor");
            if seed_tx
                .send(RuntimeEvent::DescriptorAdded { bundle })
                .await
                .is_err()
            {
                return;
            }
        }

        while let Some(event) = event_rx.recv().await {
            for runtime_event in map_event(&forward_base, &event) {
                debug!(?runtime_event, "descriptor event");
                if let Err(err) = seed_tx.send(runtime_event).await {
                    warn!("runtime channel closed: {err}");
                    return;
                }
            }
        }

        debug!("descriptor watcher loop ended");
    });

    Ok(DescriptorWatcherHandle { _inner: watcher })
}

/// Map one raw notify event to descriptor lifecycle events.
///
/// Non-descriptor paths and non-mutation events produce nothing.
fn map_event(base_dir: &Path, event: &Event) -> Vec<RuntimeEvent> {
    let mut out = Vec::new();

    for path in &event.paths {
        let Some(bundle) = descriptor_bundle_name(base_dir, path) else {
            continue;
        };

        let mapped = match event.kind {
            EventKind::Create(_) => Some(RuntimeEvent::DescriptorAdded { bundle }),
            EventKind::Modify(_) => Some(RuntimeEvent::DescriptorChanged { bundle }),
            EventKind::Remove(_) => Some(RuntimeEvent::DescriptorRemoved { bundle }),
            _ => None,
        };

        if let Some(ev) = mapped {
            out.push(ev);
        }
    }

    out
}

/// Bundle name for a path iff it is a descriptor directly inside `base_dir`.
fn descriptor_bundle_name(base_dir: &Path, path: &Path) -> Option<String> {
    if path.parent() != Some(base_dir) {
        return None;
    }
    let file_name = path.file_name()?.to_string_lossy();
    if !file_name.ends_with(&format!(".{DESCRIPTOR_EXT}")) {
        return None;
    }
    Some(descriptor::bundle_name(&file_name))
}
