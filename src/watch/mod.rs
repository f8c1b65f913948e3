// src/watch/mod.rs

//! Filesystem watching: per-bundle source subscriptions and the descriptor
//! directory watcher.
//!
//! Two kinds of watches exist:
//! - one subscription per bundle covering its `files` patterns, owned
//!   exclusively by the [`WatcherRegistry`];
//! - one watcher on the descriptor directory itself, which turns descriptor
//!   add/change/unlink into [`crate::engine::RuntimeEvent`]s.

pub mod backend;
pub mod controller;
pub mod path_utils;
pub mod registry;

pub use backend::{NotifyBackend, WatchBackend, WatchSubscription};
pub use controller::{spawn_descriptor_watcher, DescriptorWatcherHandle};
pub use registry::WatcherRegistry;
