// src/build/mod.rs

//! Building one bundle: option resolution, source resolution, and the
//! transform pipeline.
//!
//! The pipeline itself is behind the [`BundlePipeline`] trait so tests can
//! substitute a recording fake, the same way the executor backend works in
//! comparable watch tools.

pub mod builder;
pub mod options;
pub mod pipeline;
pub mod sources;

pub use builder::{artifact_name, build_bundle, effective_cwd, BuildContext};
pub use options::BuildOptions;
pub use pipeline::{ArtifactHandle, BundlePipeline, ConcatPipeline, SCRIPT_EXT, SOURCEMAP_EXT};
pub use sources::resolve_sources;
