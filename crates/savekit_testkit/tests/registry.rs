//! Fan-out behavior of the backend registry.

use savekit_core::{BackendId, BackendRegistry, RegistryBuilder};
use savekit_storage::{Backend, InMemoryBackend, InMemoryKeyValueStore, KeyValueStore};
use savekit_testkit::prelude::*;
use std::fs;
use std::sync::Arc;

#[test]
fn failing_backend_does_not_stop_the_others() {
    init_tracing();
    let dir = TempSaveDir::new();
    let failing = Arc::new(FailingBackend::always_failing(InMemoryBackend::<Profile>::new()));

    let registry = RegistryBuilder::<Profile>::new(dir.config())
        .json_file(BackendId::JSON_FILE)
        .backend("flaky", Arc::clone(&failing))
        .key_value(BackendId::KEY_VALUE, InMemoryKeyValueStore::new())
        .build()
        .unwrap();

    let outcomes = registry.save("profile", &Profile::new("Test", 100));
    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes.all_succeeded());

    let failed: Vec<_> = outcomes.failures().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["flaky"]);
    assert!(outcomes.get("flaky").unwrap().as_ref().unwrap_err().is_unavailable());

    // Backends after the failing one in identity order were still attempted
    assert!(outcomes.get("key-value").unwrap().is_ok());
    assert!(registry.exists_in("key-value", "profile"));

    let loaded = registry.load("profile");
    assert_eq!(
        loaded.ids().map(BackendId::as_str).collect::<Vec<_>>(),
        vec!["json-file", "key-value"]
    );
    assert!(failing.calls() >= 2);
}

#[test]
fn recovered_backend_rejoins() {
    let failing = Arc::new(FailingBackend::new(InMemoryBackend::<u32>::new()));
    let mut registry: BackendRegistry<u32> = BackendRegistry::new();
    registry.register(BackendId::new("flaky"), Arc::clone(&failing));
    registry.register(BackendId::new("memory"), InMemoryBackend::new());

    failing.set_fail_writes(true);
    assert!(!registry.save("level", &1).all_succeeded());
    assert!(!registry.load("level").contains("flaky"));

    failing.set_fail_writes(false);
    assert!(registry.save("level", &2).all_succeeded());
    assert_eq!(registry.load("level").get("flaky"), Some(&2));
}

#[test]
fn aggregate_is_addressed_by_identity() {
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<GameSettings>();
    registry.save("settings", &GameSettings::default());

    let loaded = registry.load("settings");
    assert_eq!(
        loaded.to_string(),
        "AggregateResult[encrypted-file, encrypted-key-value, json-file, key-value]"
    );
    assert_eq!(loaded.get("encrypted-key-value"), Some(&GameSettings::default()));
    assert!(loaded.get("cloud").is_none());
}

#[test]
fn delete_removes_from_every_backend() {
    let dir = TempSaveDir::new();
    let (registry, store) = dir.full_registry::<Profile>();
    registry.save("profile", &Profile::new("Test", 100));
    registry.save("other", &Profile::new("Other", 1));

    assert!(registry.delete("profile").all_succeeded());
    assert!(!registry.exists("profile"));
    assert!(registry.exists("other"));

    // Deleting again is a no-op, not an error
    assert!(registry.delete("profile").all_succeeded());

    assert!(registry.delete_all().all_succeeded());
    assert!(!registry.exists("other"));
    assert!(store.is_empty());
    assert!(!dir.record_path("other").exists());
}

#[test]
fn delete_all_leaves_foreign_entries() {
    let dir = TempSaveDir::new();
    let (registry, store) = dir.full_registry::<Profile>();
    store.set_string("unrelated.setting", "keep me").unwrap();
    registry.save("profile", &Profile::new("Test", 100));

    assert!(registry.delete_all().all_succeeded());
    assert_eq!(
        store.get_string("unrelated.setting").unwrap().as_deref(),
        Some("keep me")
    );
}

#[test]
fn single_backend_operations() {
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<Profile>();
    registry.save("profile", &Profile::new("Test", 100));

    registry.delete_from("json-file", "profile").unwrap();
    assert!(!registry.exists_in("json-file", "profile"));
    assert!(registry.exists_in("key-value", "profile"));

    // Unregistered identities are inert
    assert_eq!(registry.load_from("cloud", "profile").unwrap(), None);
    registry.delete_from("cloud", "profile").unwrap();
    assert!(!registry.exists_in("cloud", "profile"));
}

#[test]
fn empty_registry_is_vacuous() {
    let registry: BackendRegistry<Profile> = BackendRegistry::new();

    let outcomes = registry.save("profile", &Profile::new("Test", 100));
    assert!(outcomes.is_empty());
    assert!(outcomes.all_succeeded());
    assert!(registry.load("profile").is_empty());
    assert!(!registry.exists("profile"));
}

#[test]
fn registry_summary_lists_kinds() {
    let mut registry: BackendRegistry<u8> = BackendRegistry::new();
    registry.register(BackendId::new("mem"), InMemoryBackend::<u8>::new());
    let failing = FailingBackend::new(InMemoryBackend::<u8>::new());
    assert_eq!(Backend::<u8>::kind(&failing), "failing");
    registry.register(BackendId::new("flaky"), failing);

    assert!(registry.to_string().ends_with("[flaky (failing), mem (memory)]"));
}

#[test]
fn inaccessible_medium_is_unavailable_not_corrupted() {
    init_tracing();
    let dir = TempSaveDir::new();
    fs::write(dir.config().saves_dir(), "a file where the saves directory belongs").unwrap();

    let registry = RegistryBuilder::<Profile>::new(dir.config())
        .json_file(BackendId::JSON_FILE)
        .key_value(BackendId::KEY_VALUE, InMemoryKeyValueStore::new())
        .build()
        .unwrap();

    let outcomes = registry.save("profile", &Profile::new("Test", 100));
    let err = outcomes.get("json-file").unwrap().as_ref().unwrap_err();
    assert!(err.is_unavailable());
    assert!(!err.is_corrupted());
    assert!(outcomes.get("key-value").unwrap().is_ok());

    let err = registry
        .load_from(BackendId::JSON_FILE.as_str(), "profile")
        .unwrap_err();
    assert!(err.is_unavailable());
    assert!(!err.is_corrupted());

    // The healthy backend still answers
    let loaded = registry.load("profile");
    assert_eq!(
        loaded.ids().map(BackendId::as_str).collect::<Vec<_>>(),
        vec!["key-value"]
    );
}
