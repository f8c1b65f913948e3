// src/descriptor/model.rs

use serde::Deserialize;

/// A parsed bundle descriptor.
///
/// The descriptor declares *what* goes into a bundle; everything about *how*
/// it is built (effective minify/sourcemap flags) is derived per build in
/// [`crate::build::BuildOptions`] so a mode change takes effect on the next
/// build without re-parsing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BundleDescriptor {
    /// Ordered source path patterns, globs allowed.
    ///
    /// Relative patterns are resolved against the effective cwd; the declared
    /// order is the concatenation order of the artifact.
    pub files: Vec<String>,

    /// Override directory for resolving `files`, joined against the process
    /// working root. Defaults to the descriptor base directory.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Disables sourcemap generation and forces minification regardless of
    /// mode.
    #[serde(default)]
    pub skip: bool,

    /// Whether to request sourcemap output (default true).
    #[serde(default)]
    pub sourcemaps: Option<bool>,

    /// Whether to request minification (default true).
    #[serde(default)]
    pub minimize: Option<bool>,
}
