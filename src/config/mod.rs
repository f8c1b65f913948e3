// src/config/mod.rs

//! Host configuration for `bundlewatch`.
//!
//! The host config (`Bundlewatch.toml`) only locates things: where the JSON
//! bundle descriptors live and where artifacts are written. Per-bundle build
//! settings live in the descriptors themselves (see [`crate::descriptor`]).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{BundlesSection, ConfigFile};
