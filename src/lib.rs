// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::build::{build_bundle, BuildContext, BuildOptions, BundlePipeline, ConcatPipeline};
use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::engine::{Runtime, RuntimeEvent};
use crate::watch::{spawn_descriptor_watcher, NotifyBackend, WatcherRegistry};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - one full build pass over all discovered descriptors (every mode)
/// - (development mode only) the descriptor watcher, per-bundle source
///   watchers and the runtime event loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let develop = args.development_mode();
    let process_root = std::env::current_dir().context("resolving process working directory")?;
    let base_dir = process_root.join(&cfg.bundles.cwd);
    let output_dir = process_root.join(&cfg.bundles.output);

    if args.dry_run {
        print_dry_run(&base_dir, develop)?;
        return Ok(());
    }

    let pipeline = ConcatPipeline;

    // One full build pass happens unconditionally, so a single invocation
    // without watching still produces correct artifacts.
    build_all(
        &base_dir,
        &output_dir,
        &process_root,
        develop,
        &pipeline,
    )?;

    if !develop || args.once {
        info!(develop, once = args.once, "one-shot build complete");
        return Ok(());
    }

    // Watching requires a working platform backend; without one we degrade
    // to the one-shot build that already ran.
    let backend = match NotifyBackend::detect() {
        Ok(backend) => backend,
        Err(err) => {
            warn!(error = %err, "watch backend unavailable; built once, not watching");
            return Ok(());
        }
    };

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Descriptor watcher; fires synthetic adds for pre-existing bundles so
    // their watch setup goes through the same path as newly added ones.
    let _descriptor_watcher = spawn_descriptor_watcher(&base_dir, rt_tx.clone())?;

    let registry = WatcherRegistry::new(Box::new(backend));
    let runtime = Runtime::new(
        develop,
        process_root,
        base_dir,
        output_dir,
        Arc::new(ConcatPipeline),
        registry,
        rt_rx,
        rt_tx,
    );
    runtime.run().await
}

/// Build every currently discovered bundle once.
///
/// Individual failures (malformed descriptor, pipeline error) are reported
/// and do not stop the pass; each bundle builds independently.
fn build_all(
    base_dir: &Path,
    output_dir: &Path,
    process_root: &Path,
    develop: bool,
    pipeline: &dyn BundlePipeline,
) -> Result<()> {
    let names = descriptor::list_descriptors(base_dir)
        .with_context(|| format!("enumerating descriptors in {:?}", base_dir))?;

    info!(bundles = names.len(), develop, "starting full build pass");

    let ctx = BuildContext {
        develop,
        process_root,
        base_dir,
        output_dir,
        pipeline,
    };

    for file_name in names {
        let bundle = descriptor::bundle_name(&file_name);
        let descriptor = match descriptor::parse_descriptor(&base_dir.join(&file_name)) {
            Ok(d) => d,
            Err(err) => {
                warn!(bundle = %bundle, error = %err, "skipping unparseable descriptor");
                continue;
            }
        };

        if let Err(err) = build_bundle(Some(&descriptor), &bundle, &ctx) {
            warn!(bundle = %bundle, error = %err, "bundle build failed");
        }
    }

    Ok(())
}

/// Simple dry-run output: print bundles, files and resolved options.
fn print_dry_run(base_dir: &Path, develop: bool) -> Result<()> {
    let names = descriptor::list_descriptors(base_dir)
        .with_context(|| format!("enumerating descriptors in {:?}", base_dir))?;

    println!("bundlewatch dry-run (develop = {develop})");
    println!("bundles ({}):", names.len());

    for file_name in names {
        let bundle = descriptor::bundle_name(&file_name);
        match descriptor::parse_descriptor(&base_dir.join(&file_name)) {
            Ok(d) => {
                let opts = BuildOptions::resolve(&d, develop);
                println!("  - {bundle}");
                println!("      files: {:?}", d.files);
                if let Some(ref cwd) = d.cwd {
                    println!("      cwd: {cwd}");
                }
                if d.skip {
                    println!("      skip: true");
                }
                println!(
                    "      resolved: minimize={}, sourcemaps={}",
                    opts.minimize, opts.sourcemaps
                );
            }
            Err(err) => {
                println!("  - {bundle} (malformed: {err})");
            }
        }
    }

    Ok(())
}
