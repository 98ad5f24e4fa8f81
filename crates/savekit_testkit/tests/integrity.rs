//! Checksum format and corruption detection.

use proptest::prelude::*;
use savekit_core::BackendId;
use savekit_storage::{checksum, Backend, JsonFileBackend, StorageError, CHECKSUM_SEPARATOR};
use savekit_testkit::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn record_file_layout_reproduces_hash() {
    let dir = TempSaveDir::new();
    let backend = JsonFileBackend::new(dir.config().saves_dir());

    backend.save("profile", &Profile::new("Test", 100)).unwrap();

    let contents = dir.read_record("profile");
    let (payload, stored) = contents.split_once(CHECKSUM_SEPARATOR).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(parsed["name"], "Test");
    assert_eq!(parsed["score"], 100);
    assert_eq!(stored, checksum(payload));
}

#[test]
fn tampered_payload_is_corrupted_not_absent() {
    init_tracing();
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<Profile>();
    registry.save("profile", &Profile::new("Test", 100));

    let contents = dir.read_record("profile");
    dir.write_raw("profile", &contents.replace("100", "999"));

    let err = registry
        .load_from(BackendId::JSON_FILE.as_str(), "profile")
        .unwrap_err();
    assert!(err.is_corrupted());

    // The corrupted member is left out, the others still answer
    let loaded = registry.load("profile");
    assert!(!loaded.contains("json-file"));
    assert_eq!(loaded.len(), 3);
    assert!(registry.exists_in("json-file", "profile"));
}

#[test]
fn file_without_separator_is_corrupted() {
    let dir = TempSaveDir::new();
    let backend = JsonFileBackend::<Profile>::new(dir.config().saves_dir());
    dir.write_raw("profile", r#"{"name":"Test","score":100}"#);

    assert!(matches!(
        backend.load("profile"),
        Err(StorageError::Corrupted { .. })
    ));
    assert_eq!(backend.verify("profile").unwrap(), Some(false));
}

#[test]
fn verified_but_wrong_shape_is_corrupted() {
    let dir = TempSaveDir::new();
    let backend = JsonFileBackend::<Profile>::new(dir.config().saves_dir());
    let payload = "[1, 2, 3]";
    dir.write_raw(
        "profile",
        &format!("{payload}{CHECKSUM_SEPARATOR}{}", checksum(payload)),
    );

    assert_eq!(backend.verify("profile").unwrap(), Some(true));
    assert!(backend.load("profile").unwrap_err().is_corrupted());
}

#[test]
fn tampered_ciphertext_is_not_returned() {
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<Profile>();
    registry.save("profile", &Profile::new("Test", 100));

    let path = dir.encrypted_record_path("profile");
    let contents = fs::read_to_string(&path).unwrap();
    let first = contents.chars().next().unwrap();
    let swapped = if first == 'A' { 'B' } else { 'A' };
    fs::write(&path, format!("{swapped}{}", &contents[first.len_utf8()..])).unwrap();

    let err = registry
        .load_from(BackendId::ENCRYPTED_FILE.as_str(), "profile")
        .unwrap_err();
    assert!(err.is_corrupted());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_flipped_byte_is_detected(
        profile in profile_strategy(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let dir = tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        backend.save("profile", &profile).unwrap();

        let path = backend.path_for("profile").unwrap();
        let mut bytes = fs::read(&path).unwrap();
        let index = position.index(bytes.len());
        bytes[index] ^= mask;
        fs::write(&path, &bytes).unwrap();

        let result: Result<Option<Profile>, _> = backend.load("profile");
        let is_corrupted = matches!(result, Err(StorageError::Corrupted { .. }));
        prop_assert!(is_corrupted);
    }
}
