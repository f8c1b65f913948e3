// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `bundlewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlewatch",
    version,
    about = "Build script bundles from JSON descriptors and rebuild them on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Bundlewatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Run in development mode: unminified output, sourcemaps, and
    /// watching of descriptors and their source files.
    ///
    /// Can also be enabled with `BUNDLEWATCH_ENV=develop`.
    #[arg(long)]
    pub develop: bool,

    /// Build all bundles once and exit, even in development mode.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Enumerate descriptors and print each bundle's resolved settings,
    /// but don't build anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Resolve the effective development-mode flag once, at startup.
    ///
    /// Priority: `--develop` flag, then `BUNDLEWATCH_ENV=develop`.
    pub fn development_mode(&self) -> bool {
        if self.develop {
            return true;
        }
        std::env::var("BUNDLEWATCH_ENV")
            .map(|v| v.trim().eq_ignore_ascii_case("develop"))
            .unwrap_or(false)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
