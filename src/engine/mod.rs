// src/engine/mod.rs

//! Orchestration engine for bundlewatch.
//!
//! This module ties together:
//! - the descriptor store (parse on every descriptor event)
//! - the bundle builder
//! - the watcher registry (replace-not-merge source subscriptions)
//! - the main runtime event loop that reacts to:
//!   - descriptor add/change/unlink events
//!   - per-bundle source change events
//!   - shutdown signals

pub mod runtime;

pub use runtime::{BundleName, Runtime, RuntimeEvent};
