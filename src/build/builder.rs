// src/build/builder.rs

//! Orchestration of a single bundle build.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::build::options::BuildOptions;
use crate::build::pipeline::{ArtifactHandle, BundlePipeline, SCRIPT_EXT};
use crate::build::sources::resolve_sources;
use crate::descriptor::BundleDescriptor;
use crate::errors::{BundlewatchError, Result};

/// Everything a build needs beyond the descriptor itself.
///
/// The development-mode flag is resolved once at startup and threaded in
/// here, never re-read from ambient process state.
pub struct BuildContext<'a> {
    pub develop: bool,
    /// Process working root; descriptor `cwd` overrides are joined against it.
    pub process_root: &'a Path,
    /// Descriptor base directory; the default source cwd.
    pub base_dir: &'a Path,
    pub output_dir: &'a Path,
    pub pipeline: &'a dyn BundlePipeline,
}

/// Output artifact name for a bundle: `<bundle>.js`.
pub fn artifact_name(bundle: &str) -> String {
    format!("{bundle}.{SCRIPT_EXT}")
}

/// The directory a bundle's `files` resolve against.
///
/// A descriptor's own `cwd` overrides the base directory, for both building
/// and source watching.
pub fn effective_cwd(
    descriptor: &BundleDescriptor,
    process_root: &Path,
    base_dir: &Path,
) -> PathBuf {
    match &descriptor.cwd {
        Some(cwd) => process_root.join(cwd),
        None => base_dir.to_path_buf(),
    }
}

/// Build one bundle through the pipeline.
///
/// An absent descriptor (e.g. lost to a concurrent deletion race) is a
/// no-op, not an error. Source patterns that match nothing on disk are
/// dropped silently; the pipeline tolerates an empty list.
pub fn build_bundle(
    descriptor: Option<&BundleDescriptor>,
    bundle: &str,
    ctx: &BuildContext<'_>,
) -> Result<Option<ArtifactHandle>> {
    let Some(descriptor) = descriptor else {
        debug!(bundle = %bundle, "no descriptor for bundle; skipping build");
        return Ok(None);
    };

    let options = BuildOptions::resolve(descriptor, ctx.develop);
    let cwd = effective_cwd(descriptor, ctx.process_root, ctx.base_dir);
    let files = resolve_sources(&descriptor.files, &cwd).map_err(|source| {
        BundlewatchError::PipelineFailure {
            bundle: bundle.to_string(),
            source,
        }
    })?;

    info!(
        bundle = %bundle,
        sources = files.len(),
        minimize = options.minimize,
        sourcemaps = options.sourcemaps,
        "building bundle"
    );

    let handle = ctx
        .pipeline
        .run(&files, &artifact_name(bundle), options, &cwd, ctx.output_dir)
        .map_err(|source| BundlewatchError::PipelineFailure {
            bundle: bundle.to_string(),
            source,
        })?;

    Ok(Some(handle))
}
