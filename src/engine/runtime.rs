// src/engine/runtime.rs

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::build::{
    artifact_name, build_bundle, effective_cwd, BuildContext, BundlePipeline, SOURCEMAP_EXT,
};
use crate::descriptor::{self, BundleDescriptor};
use crate::watch::WatcherRegistry;

/// Public type alias for bundle names throughout the engine.
pub type BundleName = String;

/// Events sent into the runtime from watchers or external signals.
///
/// The idea is that:
/// - the descriptor watcher sends `DescriptorAdded` / `DescriptorChanged` /
///   `DescriptorRemoved` (including synthetic adds at startup)
/// - per-bundle source subscriptions send `SourceChanged`
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    DescriptorAdded { bundle: BundleName },
    DescriptorChanged { bundle: BundleName },
    DescriptorRemoved { bundle: BundleName },
    SourceChanged { bundle: BundleName },
    ShutdownRequested,
}

/// The main orchestration runtime.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the descriptor watcher, source
///   subscriptions and the signal handler.
/// - Re-parse and rebuild bundles on descriptor events, keeping the last
///   good parse per bundle for source-triggered rebuilds.
/// - Drive the watcher registry so each bundle holds exactly one live
///   source subscription.
///
/// All builds run inline on this single event loop, so two builds never
/// execute concurrently and events for the same bundle are processed in
/// arrival order.
pub struct Runtime {
    develop: bool,
    process_root: PathBuf,
    base_dir: PathBuf,
    output_dir: PathBuf,
    pipeline: Arc<dyn BundlePipeline>,
    registry: WatcherRegistry,

    /// Last successfully parsed descriptor per bundle; source-change
    /// rebuilds use this without re-reading the descriptor file.
    descriptors: HashMap<BundleName, BundleDescriptor>,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Cloned into every source subscription the registry opens.
    events_tx: mpsc::Sender<RuntimeEvent>,
}

impl Runtime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        develop: bool,
        process_root: PathBuf,
        base_dir: PathBuf,
        output_dir: PathBuf,
        pipeline: Arc<dyn BundlePipeline>,
        registry: WatcherRegistry,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            develop,
            process_root,
            base_dir,
            output_dir,
            pipeline,
            registry,
            descriptors: HashMap::new(),
            events_rx,
            events_tx,
        }
    }

    /// Main event loop. Runs until the channel closes or shutdown is
    /// requested.
    pub async fn run(mut self) -> Result<()> {
        info!("bundlewatch runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");
            if !self.handle_event(event) {
                break;
            }
        }

        info!("bundlewatch runtime exiting");
        Ok(())
    }

    /// Process a single runtime event; returns false when the loop should
    /// stop. Public so tests and embedders can drive the runtime directly.
    pub fn handle_event(&mut self, event: RuntimeEvent) -> bool {
        match event {
            RuntimeEvent::DescriptorAdded { bundle }
            | RuntimeEvent::DescriptorChanged { bundle } => {
                self.handle_descriptor_upsert(&bundle);
                true
            }
            RuntimeEvent::DescriptorRemoved { bundle } => {
                self.handle_descriptor_removed(&bundle);
                true
            }
            RuntimeEvent::SourceChanged { bundle } => {
                self.handle_source_changed(&bundle);
                true
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested, stopping runtime");
                false
            }
        }
    }

    /// Number of bundles with a live source subscription.
    pub fn watched_count(&self) -> usize {
        self.registry.watched_count()
    }

    /// Whether `bundle` currently holds a live source subscription.
    pub fn is_watching(&self, bundle: &str) -> bool {
        self.registry.is_watching(bundle)
    }

    /// Descriptor add/change: re-parse, rebuild, re-subscribe.
    ///
    /// A malformed descriptor is logged and leaves the bundle's previous
    /// build/watch state untouched until the file is corrected. The
    /// registry's replacement semantics cover `files`/`cwd` changes.
    fn handle_descriptor_upsert(&mut self, bundle: &str) {
        let path = self.base_dir.join(descriptor::descriptor_file_name(bundle));

        let parsed = match descriptor::parse_descriptor(&path) {
            Ok(d) => d,
            Err(err) => {
                warn!(
                    bundle = %bundle,
                    error = %err,
                    "descriptor unusable; keeping previous build/watch state"
                );
                return;
            }
        };

        if let Err(err) = build_bundle(Some(&parsed), bundle, &self.build_context()) {
            warn!(bundle = %bundle, error = %err, "bundle build failed");
        }

        let cwd = effective_cwd(&parsed, &self.process_root, &self.base_dir);
        if let Err(err) =
            self.registry
                .ensure_watching(bundle, &parsed.files, &cwd, &self.events_tx)
        {
            warn!(bundle = %bundle, error = %err, "failed to watch bundle sources");
        }

        self.descriptors.insert(bundle.to_string(), parsed);
    }

    /// Descriptor unlink: stop watching, drop state, best-effort delete the
    /// bundle's artifact and sourcemap.
    fn handle_descriptor_removed(&mut self, bundle: &str) {
        self.registry.stop_watching(bundle);
        self.descriptors.remove(bundle);

        let name = artifact_name(bundle);
        for file_name in [name.clone(), format!("{name}.{SOURCEMAP_EXT}")] {
            let path = self.output_dir.join(&file_name);
            match fs::remove_file(&path) {
                Ok(()) => debug!(bundle = %bundle, file = %file_name, "removed artifact"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(bundle = %bundle, file = %file_name, error = %err, "failed to remove artifact");
                }
            }
        }
    }

    /// Source change: rebuild with the last-parsed descriptor. No re-parse,
    /// no re-subscribe.
    fn handle_source_changed(&mut self, bundle: &str) {
        let Some(descriptor) = self.descriptors.get(bundle) else {
            // Deletion race: the subscription fired after the descriptor
            // was removed.
            debug!(bundle = %bundle, "source change for unknown bundle; ignoring");
            return;
        };
        let descriptor = descriptor.clone();

        if let Err(err) = build_bundle(Some(&descriptor), bundle, &self.build_context()) {
            warn!(bundle = %bundle, error = %err, "bundle rebuild failed");
        }
    }

    fn build_context(&self) -> BuildContext<'_> {
        BuildContext {
            develop: self.develop,
            process_root: &self.process_root,
            base_dir: &self.base_dir,
            output_dir: &self.output_dir,
            pipeline: self.pipeline.as_ref(),
        }
    }
}
