//! Integration tests for loading the framework catalog from a directory.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use eaog_editor::application::services::FrameworkCatalog;
use eaog_editor::application::ApplicationError;
use eaog_editor::infrastructure::traits::{FileSystem, RealFileSystem};
use eaog_editor::util::testing::init_test_setup;

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write framework file");
}

fn fs() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

const SUPERVISED: &str = r#"{
    "type": "sand",
    "name": "supervised",
    "meta": {"framework": true},
    "children": [
        {"type": "instruction", "name": "监督：${action}"},
        {"type": "mount-point", "name": "action"}
    ]
}"#;

#[test]
fn given_directory_with_valid_and_invalid_files_when_loading_then_invalid_ones_rejected() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a_supervised.json", SUPERVISED);
    write(
        temp.path(),
        "b_no_marker.json",
        r#"{"type": "sand", "name": "plain", "children": [{"type": "mount-point", "name": "m"}]}"#,
    );
    write(temp.path(), "c_broken.json", "{ not json");
    write(temp.path(), "notes.txt", "ignored");

    let catalog = FrameworkCatalog::load_dir(&fs(), temp.path(), true).unwrap();

    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("supervised").is_some());
    let rejected: Vec<&str> = catalog
        .rejected()
        .iter()
        .map(|r| r.source.rsplit('/').next().unwrap())
        .collect();
    assert_eq!(rejected, vec!["b_no_marker.json", "c_broken.json"]);
}

#[test]
fn given_brief_definition_when_loading_with_brief_enabled_then_accepted() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "retry.json",
        r#"{"sand": "retry", "meta": {"framework": true}, "children": [{"mount-point": "body"}]}"#,
    );

    let with_brief = FrameworkCatalog::load_dir(&fs(), temp.path(), true).unwrap();
    let without_brief = FrameworkCatalog::load_dir(&fs(), temp.path(), false).unwrap();

    assert_eq!(with_brief.require("retry").unwrap().mount_point_names(), vec!["body"]);
    assert!(without_brief.is_empty());
    assert_eq!(without_brief.rejected().len(), 1);
}

#[test]
fn given_missing_directory_when_loading_then_empty_catalog() {
    init_test_setup();
    let temp = TempDir::new().unwrap();

    let catalog = FrameworkCatalog::load_dir(&fs(), &temp.path().join("absent"), true).unwrap();

    assert!(catalog.is_empty());
    assert!(catalog.rejected().is_empty());
}

#[test]
fn given_duplicate_names_when_building_from_definitions_then_first_wins() {
    init_test_setup();
    let definition: serde_json::Value = serde_json::from_str(SUPERVISED).unwrap();
    let mut renamed = definition.clone();
    renamed["description"] = json!("second copy");

    let catalog = FrameworkCatalog::from_definitions(&[definition, renamed], false);

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.require("supervised").unwrap().description(), None);
    assert_eq!(catalog.rejected().len(), 1);
    assert!(catalog.rejected()[0].reason.contains("duplicate"));
}

#[test]
fn given_unknown_name_when_requiring_then_framework_not_found() {
    let catalog = FrameworkCatalog::default();

    let err = catalog.require("nope").unwrap_err();

    assert!(matches!(err, ApplicationError::FrameworkNotFound(name) if name == "nope"));
}
