// src/descriptor/mod.rs

//! Bundle descriptor store.
//!
//! One JSON file per bundle, e.g. `app.json`:
//!
//! ```json
//! {
//!   "files": ["vendor/*.js", "src/app.js"],
//!   "cwd": "client",
//!   "sourcemaps": true,
//!   "minimize": false
//! }
//! ```
//!
//! The bundle name is the descriptor's file stem (`app`), which also names
//! the output artifact (`app.js`). The store is deliberately not a cache:
//! every enumeration and parse re-reads from disk, so the watch loop always
//! sees current content.

pub mod model;
pub mod store;

pub use model::BundleDescriptor;
pub use store::{bundle_name, descriptor_file_name, list_descriptors, parse_descriptor};

/// Extension identifying descriptor files inside the base directory.
pub const DESCRIPTOR_EXT: &str = "json";
