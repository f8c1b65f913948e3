#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bundlewatch::descriptor::BundleDescriptor;

/// Builder for `BundleDescriptor` to simplify test setup.
///
/// Can produce either the in-memory struct or the JSON descriptor file the
/// store would parse it from.
pub struct DescriptorBuilder {
    descriptor: BundleDescriptor,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self {
            descriptor: BundleDescriptor {
                files: vec![],
                cwd: None,
                skip: false,
                sourcemaps: None,
                minimize: None,
            },
        }
    }

    pub fn file(mut self, pattern: &str) -> Self {
        self.descriptor.files.push(pattern.to_string());
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.descriptor.cwd = Some(cwd.to_string());
        self
    }

    pub fn skip(mut self, val: bool) -> Self {
        self.descriptor.skip = val;
        self
    }

    pub fn sourcemaps(mut self, val: bool) -> Self {
        self.descriptor.sourcemaps = Some(val);
        self
    }

    pub fn minimize(mut self, val: bool) -> Self {
        self.descriptor.minimize = Some(val);
        self
    }

    pub fn build(self) -> BundleDescriptor {
        self.descriptor
    }

    /// Serialize the descriptor as JSON.
    pub fn to_json(&self) -> String {
        let mut doc = serde_json::Map::new();
        doc.insert(
            "files".to_string(),
            serde_json::json!(self.descriptor.files),
        );
        if let Some(ref cwd) = self.descriptor.cwd {
            doc.insert("cwd".to_string(), serde_json::json!(cwd));
        }
        if self.descriptor.skip {
            doc.insert("skip".to_string(), serde_json::json!(true));
        }
        if let Some(val) = self.descriptor.sourcemaps {
            doc.insert("sourcemaps".to_string(), serde_json::json!(val));
        }
        if let Some(val) = self.descriptor.minimize {
            doc.insert("minimize".to_string(), serde_json::json!(val));
        }
        serde_json::Value::Object(doc).to_string()
    }

    /// Write the descriptor file `<bundle>.json` into `dir` and return its
    /// path.
    pub fn write_to(&self, dir: &Path, bundle: &str) -> PathBuf {
        let path = dir.join(format!("{bundle}.json"));
        fs::write(&path, self.to_json()).expect("writing descriptor file");
        path
    }
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
