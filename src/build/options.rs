// src/build/options.rs

use crate::descriptor::BundleDescriptor;

/// Effective sourcemap/minify flags for one build.
///
/// These are computed fresh on every build from the descriptor and the
/// current development-mode flag, never cached, so a mode change takes
/// effect on the next build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub sourcemaps: bool,
    pub minimize: bool,
}

impl BuildOptions {
    /// Resolve the effective options.
    ///
    /// - Sourcemaps are only ever produced in development mode, and `skip`
    ///   or an explicit `sourcemaps: false` turns them off.
    /// - Minification is on outside development mode no matter what the
    ///   descriptor says; inside development mode it follows the descriptor,
    ///   except that `skip: true` forces it on in both modes.
    pub fn resolve(descriptor: &BundleDescriptor, develop: bool) -> Self {
        let sourcemaps = !descriptor.skip && descriptor.sourcemaps.unwrap_or(true) && develop;
        let minimize = descriptor.skip || descriptor.minimize.unwrap_or(true) || !develop;
        Self {
            sourcemaps,
            minimize,
        }
    }
}
