mod common;
use crate::common::builders::ScriptDir;
use crate::common::init_tracing;

use std::collections::{BTreeMap, HashMap};
use std::error::Error;

use proptest::prelude::*;
use serde_json::{Value, json};

use scriptrun::errors::ScriptrunError;
use scriptrun::staging::stage;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn staged_file_holds_the_parameters_as_json() -> TestResult {
    init_tracing();

    let dir = ScriptDir::new();
    let params = json!({"environmentImageBase64List": ["aGk="], "count": 3});
    let staged = stage(&params, &dir.staging_dir())?;

    assert!(staged.path().starts_with(dir.staging_dir()));
    let name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("params-") && name.ends_with(".json"), "{name}");

    let on_disk: Value = serde_json::from_slice(&std::fs::read(staged.path())?)?;
    assert_eq!(on_disk, params);

    Ok(())
}

#[test]
fn release_is_idempotent() -> TestResult {
    init_tracing();

    let dir = ScriptDir::new();
    let mut staged = stage(&json!({"x": 1}), &dir.staging_dir())?;
    let path = staged.path().to_path_buf();

    staged.release()?;
    assert!(!path.exists());
    assert!(staged.is_released());

    staged.release()?;
    drop(staged);
    assert!(dir.staged_files().is_empty());

    Ok(())
}

#[test]
fn release_tolerates_a_file_removed_behind_its_back() -> TestResult {
    init_tracing();

    let dir = ScriptDir::new();
    let mut staged = stage(&json!([1, 2, 3]), &dir.staging_dir())?;
    std::fs::remove_file(staged.path())?;

    staged.release()?;
    assert!(staged.is_released());

    Ok(())
}

#[test]
fn dropping_an_unreleased_file_removes_it() -> TestResult {
    init_tracing();

    let dir = ScriptDir::new();
    let staged = stage(&json!({}), &dir.staging_dir())?;
    let path = staged.path().to_path_buf();
    assert!(path.exists());

    drop(staged);
    assert!(!path.exists());

    Ok(())
}

#[test]
fn unserializable_parameters_leave_nothing_behind() {
    init_tracing();

    let dir = ScriptDir::new();
    // JSON object keys must be strings.
    let mut params = HashMap::new();
    params.insert((1, 2), "pair");

    match stage(&params, &dir.staging_dir()) {
        Err(ScriptrunError::Serialization(_)) => {}
        other => panic!("expected Serialization error, got {other:?}"),
    }
    assert!(dir.staged_files().is_empty());
}

#[test]
fn every_stage_gets_its_own_file() -> TestResult {
    init_tracing();

    let dir = ScriptDir::new();
    let a = stage(&json!({"who": "a"}), &dir.staging_dir())?;
    let b = stage(&json!({"who": "a"}), &dir.staging_dir())?;

    assert_ne!(a.path(), b.path());
    assert_eq!(dir.staged_files().len(), 2);

    Ok(())
}

#[test]
fn missing_staging_dir_is_an_io_error() {
    init_tracing();

    let dir = ScriptDir::new();
    let result = stage(&json!({}), &dir.staging_dir().join("does-not-exist"));
    assert!(matches!(result, Err(ScriptrunError::Io(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stage_then_release_leaves_the_directory_empty(
        params in prop::collection::btree_map("[a-zA-Z_]{1,12}", any::<i64>(), 0..8),
        release_explicitly in any::<bool>(),
    ) {
        let dir = ScriptDir::new();
        let mut staged = stage(&params, &dir.staging_dir()).unwrap();

        let on_disk: BTreeMap<String, i64> =
            serde_json::from_slice(&std::fs::read(staged.path()).unwrap()).unwrap();
        prop_assert_eq!(&on_disk, &params);

        if release_explicitly {
            staged.release().unwrap();
        }
        drop(staged);
        prop_assert!(dir.staged_files().is_empty());
    }
}
