// src/build/pipeline.rs

//! The transform pipeline: sources in, one artifact (plus optional
//! sourcemap) out.
//!
//! The contract is fixed: input file order is preserved in the
//! concatenation, and an empty file list produces an empty artifact rather
//! than a failure. Production code uses [`ConcatPipeline`]; tests can
//! provide their own [`BundlePipeline`] that records invocations instead of
//! touching disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use crate::build::options::BuildOptions;

/// Extension of built artifacts.
pub const SCRIPT_EXT: &str = "js";

/// Extension appended to the artifact name for its sourcemap
/// (`app.js` -> `app.js.map`).
pub const SOURCEMAP_EXT: &str = "map";

/// Paths written by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub artifact: PathBuf,
    pub sourcemap: Option<PathBuf>,
}

/// Trait abstracting the transform pipeline.
pub trait BundlePipeline: Send + Sync {
    /// Build one artifact named `output_name` in `output_dir` from `files`,
    /// overwriting any prior artifact of the same name.
    ///
    /// `cwd` is the directory the sources were resolved against; it is used
    /// to relativise source paths in the sourcemap.
    fn run(
        &self,
        files: &[PathBuf],
        output_name: &str,
        options: BuildOptions,
        cwd: &Path,
        output_dir: &Path,
    ) -> Result<ArtifactHandle>;
}

/// Production pipeline: read each source in order, concatenate, optionally
/// strip comments/whitespace, optionally emit a version-3 sourcemap.
#[derive(Debug, Clone, Default)]
pub struct ConcatPipeline;

impl BundlePipeline for ConcatPipeline {
    fn run(
        &self,
        files: &[PathBuf],
        output_name: &str,
        options: BuildOptions,
        cwd: &Path,
        output_dir: &Path,
    ) -> Result<ArtifactHandle> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {:?}", output_dir))?;

        let mut pieces = Vec::with_capacity(files.len());
        for file in files {
            let contents = fs::read_to_string(file)
                .with_context(|| format!("reading source file {:?}", file))?;
            pieces.push(contents);
        }
        let mut bundled = pieces.join("\n");

        if options.minimize {
            bundled = minify(&bundled);
        }

        let artifact = output_dir.join(output_name);
        let sourcemap = if options.sourcemaps {
            let map_name = format!("{output_name}.{SOURCEMAP_EXT}");
            let map_path = output_dir.join(&map_name);
            let map = sourcemap_document(output_name, files, &pieces, cwd);
            fs::write(&map_path, serde_json::to_vec(&map)?)
                .with_context(|| format!("writing sourcemap {:?}", map_path))?;
            bundled.push_str(&format!("\n//# sourceMappingURL={map_name}\n"));
            Some(map_path)
        } else {
            None
        };

        fs::write(&artifact, bundled.as_bytes())
            .with_context(|| format!("writing artifact {:?}", artifact))?;

        debug!(
            artifact = ?artifact,
            sources = files.len(),
            minimized = options.minimize,
            sourcemap = sourcemap.is_some(),
            "pipeline wrote artifact"
        );

        Ok(ArtifactHandle { artifact, sourcemap })
    }
}

/// Version-3 sourcemap skeleton: file, sources and embedded source contents.
fn sourcemap_document(
    output_name: &str,
    files: &[PathBuf],
    contents: &[String],
    cwd: &Path,
) -> serde_json::Value {
    let sources: Vec<String> = files
        .iter()
        .map(|f| {
            f.strip_prefix(cwd)
                .unwrap_or(f)
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();

    json!({
        "version": 3,
        "file": output_name,
        "sources": sources,
        "sourcesContent": contents,
        "names": [],
        "mappings": "",
    })
}

/// Conservative minifier: strips line and block comments outside string
/// literals, then drops blank lines and per-line indentation.
///
/// Regex literals are not tracked, so a `//` inside one would be taken for a
/// comment; the sources this tool bundles are expected to be plain scripts
/// where this trade-off is acceptable.
fn minify(input: &str) -> String {
    let stripped = strip_comments(input);

    let mut out = String::with_capacity(stripped.len());
    for line in stripped.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }
    out
}

fn strip_comments(input: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Str(char),
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' | '\'' | '`' => {
                    state = State::Str(c);
                    out.push(c);
                }
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => out.push(c),
                },
                _ => out.push(c),
            },
            State::Str(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else if c == quote {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(minimize: bool, sourcemaps: bool) -> BuildOptions {
        BuildOptions {
            sourcemaps,
            minimize,
        }
    }

    #[test]
    fn concatenates_in_input_order() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = src.path().join("a.js");
        let b = src.path().join("b.js");
        fs::write(&a, "var a = 1;\n").unwrap();
        fs::write(&b, "var b = 2;\n").unwrap();

        let handle = ConcatPipeline
            .run(
                &[a, b],
                "app.js",
                options(false, false),
                src.path(),
                out.path(),
            )
            .unwrap();

        let bundled = fs::read_to_string(&handle.artifact).unwrap();
        let a_pos = bundled.find("var a").unwrap();
        let b_pos = bundled.find("var b").unwrap();
        assert!(a_pos < b_pos);
        assert!(handle.sourcemap.is_none());
    }

    #[test]
    fn empty_file_list_produces_empty_artifact() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let handle = ConcatPipeline
            .run(&[], "empty.js", options(true, false), src.path(), out.path())
            .unwrap();

        assert_eq!(fs::read_to_string(&handle.artifact).unwrap(), "");
    }

    #[test]
    fn sourcemap_written_alongside_artifact() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = src.path().join("a.js");
        fs::write(&a, "var a = 1;\n").unwrap();

        let handle = ConcatPipeline
            .run(&[a], "app.js", options(false, true), src.path(), out.path())
            .unwrap();

        let map_path = handle.sourcemap.expect("sourcemap expected");
        assert_eq!(map_path, out.path().join("app.js.map"));

        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"][0], "a.js");

        let bundled = fs::read_to_string(&handle.artifact).unwrap();
        assert!(bundled.contains("sourceMappingURL=app.js.map"));
    }

    #[test]
    fn minify_strips_comments_and_blank_lines() {
        let input = "// header\nvar a = 1; /* inline */\n\n  var b = \"//not a comment\";\n";
        let minified = minify(input);
        assert_eq!(minified, "var a = 1;\nvar b = \"//not a comment\";");
    }

    #[test]
    fn minify_keeps_escaped_quotes_in_strings() {
        let input = "var s = 'it\\'s // fine';";
        assert_eq!(minify(input), input);
    }

    #[test]
    fn overwrites_prior_artifact() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = src.path().join("a.js");

        fs::write(&a, "first\n").unwrap();
        ConcatPipeline
            .run(
                &[a.clone()],
                "app.js",
                options(false, false),
                src.path(),
                out.path(),
            )
            .unwrap();

        fs::write(&a, "second\n").unwrap();
        let handle = ConcatPipeline
            .run(&[a], "app.js", options(false, false), src.path(), out.path())
            .unwrap();

        assert_eq!(fs::read_to_string(&handle.artifact).unwrap(), "second\n");
    }
}
