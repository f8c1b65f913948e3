// src/config/model.rs

use serde::Deserialize;

/// Top-level host configuration as read from `Bundlewatch.toml`.
///
/// ```toml
/// [bundles]
/// cwd = "bundles"
/// output = "dist"
/// ```
///
/// `cwd` is the descriptor base directory and `output` is where built
/// artifacts land; both are resolved relative to the process working
/// directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Bundle locations from `[bundles]`.
    pub bundles: BundlesSection,
}

/// `[bundles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BundlesSection {
    /// Directory containing the JSON bundle descriptors.
    pub cwd: String,

    /// Directory where built artifacts (and sourcemaps) are written.
    pub output: String,
}
