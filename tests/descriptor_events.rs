//! Drives the runtime's event handling directly, with a fake watch backend,
//! to pin down the per-bundle lifecycle: add -> watching -> removed.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use bundlewatch::build::ConcatPipeline;
use bundlewatch::engine::{Runtime, RuntimeEvent};
use bundlewatch::watch::WatcherRegistry;
use bundlewatch_test_utils::builders::DescriptorBuilder;
use bundlewatch_test_utils::fake_watch::{
    closed_count, live_subscriptions, opened_count, FakeWatchBackend, WatchLog,
};
use bundlewatch_test_utils::init_tracing;

struct Fixture {
    _tmp: tempfile::TempDir,
    bundles: PathBuf,
    dist: PathBuf,
    runtime: Runtime,
    log: WatchLog,
}

fn fixture() -> Fixture {
    init_tracing();

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    let bundles = root.join("bundles");
    let dist = root.join("dist");
    fs::create_dir_all(&bundles).unwrap();

    let (backend, log) = FakeWatchBackend::new();
    let registry = WatcherRegistry::new(Box::new(backend));
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);

    let runtime = Runtime::new(
        true, // develop
        root,
        bundles.clone(),
        dist.clone(),
        Arc::new(ConcatPipeline),
        registry,
        rx,
        tx,
    );

    Fixture {
        _tmp: tmp,
        bundles,
        dist,
        runtime,
        log,
    }
}

fn added(bundle: &str) -> RuntimeEvent {
    RuntimeEvent::DescriptorAdded {
        bundle: bundle.to_string(),
    }
}

fn changed(bundle: &str) -> RuntimeEvent {
    RuntimeEvent::DescriptorChanged {
        bundle: bundle.to_string(),
    }
}

fn removed(bundle: &str) -> RuntimeEvent {
    RuntimeEvent::DescriptorRemoved {
        bundle: bundle.to_string(),
    }
}

fn source_changed(bundle: &str) -> RuntimeEvent {
    RuntimeEvent::SourceChanged {
        bundle: bundle.to_string(),
    }
}

#[test]
fn add_event_builds_and_starts_watching() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    DescriptorBuilder::new()
        .file("a.js")
        .minimize(false)
        .write_to(&f.bundles, "app");

    assert!(f.runtime.handle_event(added("app")));

    assert!(f.dist.join("app.js").is_file());
    assert!(f.dist.join("app.js.map").is_file());
    assert!(f.runtime.is_watching("app"));

    let live = live_subscriptions(&f.log);
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].bundle, "app");
    assert_eq!(live[0].patterns, vec!["a.js"]);
    assert_eq!(live[0].cwd, f.bundles);
}

#[test]
fn change_event_rebuilds_and_replaces_the_watcher() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    fs::write(f.bundles.join("b.js"), "var b = 2;\n").unwrap();
    DescriptorBuilder::new()
        .file("a.js")
        .file("b.js")
        .minimize(false)
        .write_to(&f.bundles, "app");

    f.runtime.handle_event(added("app"));
    assert!(fs::read_to_string(f.dist.join("app.js"))
        .unwrap()
        .contains("var b = 2;"));

    // Descriptor updated: b.js dropped from the file list.
    DescriptorBuilder::new()
        .file("a.js")
        .minimize(false)
        .write_to(&f.bundles, "app");

    f.runtime.handle_event(changed("app"));

    let bundled = fs::read_to_string(f.dist.join("app.js")).unwrap();
    assert!(bundled.contains("var a = 1;"));
    assert!(!bundled.contains("var b = 2;"));

    assert_eq!(opened_count(&f.log), 2);
    assert_eq!(closed_count(&f.log), 1);
    let live = live_subscriptions(&f.log);
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].patterns, vec!["a.js"]);
}

#[test]
fn remove_event_deletes_artifacts_and_stops_watching() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    DescriptorBuilder::new().file("a.js").write_to(&f.bundles, "app");

    f.runtime.handle_event(added("app"));
    assert!(f.dist.join("app.js").is_file());
    assert!(f.dist.join("app.js.map").is_file());

    f.runtime.handle_event(removed("app"));

    assert!(!f.dist.join("app.js").exists());
    assert!(!f.dist.join("app.js.map").exists());
    assert!(!f.runtime.is_watching("app"));
    assert_eq!(closed_count(&f.log), 1);
}

#[test]
fn remove_event_tolerates_missing_artifacts() {
    let mut f = fixture();

    // Never built, never watched; both deletions are no-ops.
    f.runtime.handle_event(removed("ghost"));
    assert_eq!(f.runtime.watched_count(), 0);
}

#[test]
fn source_change_rebuilds_without_resubscribing() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    DescriptorBuilder::new()
        .file("a.js")
        .minimize(false)
        .write_to(&f.bundles, "app");

    f.runtime.handle_event(added("app"));
    assert_eq!(opened_count(&f.log), 1);

    fs::write(f.bundles.join("a.js"), "var a = 42;\n").unwrap();
    f.runtime.handle_event(source_changed("app"));

    let bundled = fs::read_to_string(f.dist.join("app.js")).unwrap();
    assert!(bundled.contains("var a = 42;"));

    // Same subscription as before; no replacement happened.
    assert_eq!(opened_count(&f.log), 1);
    assert_eq!(closed_count(&f.log), 0);
}

#[test]
fn source_change_for_unknown_bundle_is_ignored() {
    let mut f = fixture();
    assert!(f.runtime.handle_event(source_changed("ghost")));
    assert!(!f.dist.join("ghost.js").exists());
}

#[test]
fn malformed_descriptor_keeps_previous_build_and_watch_state() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    DescriptorBuilder::new()
        .file("a.js")
        .minimize(false)
        .write_to(&f.bundles, "app");

    f.runtime.handle_event(added("app"));
    let before = fs::read_to_string(f.dist.join("app.js")).unwrap();

    fs::write(f.bundles.join("app.json"), "{ this is not json").unwrap();
    assert!(f.runtime.handle_event(changed("app")));

    let after = fs::read_to_string(f.dist.join("app.js")).unwrap();
    assert_eq!(before, after, "artifact untouched by malformed descriptor");
    assert!(f.runtime.is_watching("app"));
    assert_eq!(opened_count(&f.log), 1);
    assert_eq!(closed_count(&f.log), 0);

    // Correcting the descriptor resumes normal handling.
    DescriptorBuilder::new()
        .file("a.js")
        .minimize(false)
        .write_to(&f.bundles, "app");
    f.runtime.handle_event(changed("app"));
    assert_eq!(opened_count(&f.log), 2);
}

#[test]
fn bundles_are_independent() {
    let mut f = fixture();
    fs::write(f.bundles.join("a.js"), "var a = 1;\n").unwrap();
    fs::write(f.bundles.join("b.js"), "var b = 2;\n").unwrap();
    DescriptorBuilder::new().file("a.js").write_to(&f.bundles, "app");
    DescriptorBuilder::new().file("b.js").write_to(&f.bundles, "admin");

    f.runtime.handle_event(added("app"));
    f.runtime.handle_event(added("admin"));
    assert_eq!(f.runtime.watched_count(), 2);

    f.runtime.handle_event(removed("app"));

    assert!(!f.dist.join("app.js").exists());
    assert!(f.dist.join("admin.js").is_file());
    assert!(f.runtime.is_watching("admin"));
    assert!(!f.runtime.is_watching("app"));
}

#[test]
fn shutdown_event_stops_the_loop() {
    let mut f = fixture();
    assert!(!f.runtime.handle_event(RuntimeEvent::ShutdownRequested));
}
