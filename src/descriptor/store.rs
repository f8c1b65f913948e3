// src/descriptor/store.rs

use std::fs;
use std::path::Path;

use crate::descriptor::model::BundleDescriptor;
use crate::descriptor::DESCRIPTOR_EXT;
use crate::errors::{BundlewatchError, Result};

/// Enumerate descriptor file names (e.g. `app.json`) in `base_dir`.
///
/// Order is whatever the underlying storage yields; callers must not rely on
/// it being stable across platforms. Non-descriptor entries are skipped.
pub fn list_descriptors(base_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(base_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.ends_with(&format!(".{DESCRIPTOR_EXT}")) {
            names.push(name.into_owned());
        }
    }
    Ok(names)
}

/// Read and decode one descriptor file.
///
/// Fails with [`BundlewatchError::MalformedDescriptor`] when the content is
/// not valid JSON for the descriptor shape. Reading errors (missing file,
/// permissions) surface as IO errors. No side effects beyond reading.
pub fn parse_descriptor(path: &Path) -> Result<BundleDescriptor> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| BundlewatchError::MalformedDescriptor {
        path: path.to_path_buf(),
        source,
    })
}

/// Derive the bundle name from a descriptor file name: strip the extension.
///
/// `app.json` -> `app`. Names without the descriptor extension are returned
/// unchanged.
pub fn bundle_name(file_name: &str) -> String {
    file_name
        .strip_suffix(&format!(".{DESCRIPTOR_EXT}"))
        .unwrap_or(file_name)
        .to_string()
}

/// Inverse of [`bundle_name`]: the descriptor file name for a bundle.
pub fn descriptor_file_name(bundle: &str) -> String {
    format!("{bundle}.{DESCRIPTOR_EXT}")
}
