use std::fs;

use bundlewatch::config::{load_and_validate, load_from_path};
use bundlewatch::errors::BundlewatchError;

#[test]
fn loads_bundles_section_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bundlewatch.toml");
    fs::write(
        &path,
        r#"
[bundles]
cwd = "bundles"
output = "dist"
"#,
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.bundles.cwd, "bundles");
    assert_eq!(cfg.bundles.output, "dist");
}

#[test]
fn missing_bundles_section_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bundlewatch.toml");
    fs::write(&path, "# empty\n").unwrap();

    assert!(matches!(
        load_from_path(&path),
        Err(BundlewatchError::TomlError(_))
    ));
}

#[test]
fn empty_output_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bundlewatch.toml");
    fs::write(
        &path,
        r#"
[bundles]
cwd = "bundles"
output = ""
"#,
    )
    .unwrap();

    assert!(load_from_path(&path).is_ok());
    assert!(matches!(
        load_and_validate(&path),
        Err(BundlewatchError::ConfigError(_))
    ));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("nope.toml")),
        Err(BundlewatchError::ConfigError(_))
    ));
}
