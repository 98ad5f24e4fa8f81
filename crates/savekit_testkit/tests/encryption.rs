//! Encryption at rest through the full stack.

use savekit_core::crypto::{lock_path, KeySource};
use savekit_core::{BackendId, EncryptionService, RegistryBuilder};
use savekit_storage::StorageError;
use savekit_testkit::prelude::*;
use std::fs;
use std::sync::Arc;
use std::thread;

#[test]
fn encrypted_media_never_hold_plaintext() {
    let dir = TempSaveDir::new();
    let (registry, store) = dir.full_registry::<Profile>();
    let profile = Profile::new("Plaintext Canary", 4242);

    assert!(registry.save("profile", &profile).all_succeeded());

    let raw_file = fs::read_to_string(dir.encrypted_record_path("profile")).unwrap();
    assert!(!raw_file.contains("Plaintext Canary"));
    assert!(!raw_file.contains("4242"));

    let snapshot = store.snapshot();
    let raw_entry = snapshot.get("encrypted/profile").unwrap();
    assert!(!raw_entry.contains("Plaintext Canary"));

    // The plain backends hold it in the clear
    assert!(dir.read_record("profile").contains("Plaintext Canary"));
    assert!(snapshot.get("profile").unwrap().contains("Plaintext Canary"));
}

#[test]
fn same_record_encrypts_differently_each_save() {
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<Profile>();
    let path = dir.encrypted_record_path("profile");

    registry.save("profile", &Profile::new("Test", 100));
    let first = fs::read_to_string(&path).unwrap();
    registry.save("profile", &Profile::new("Test", 100));
    let second = fs::read_to_string(&path).unwrap();

    assert_ne!(first, second);
}

#[test]
fn key_is_generated_once_and_reused() {
    let dir = TempSaveDir::new();
    let key_file = dir.config().key_file();

    {
        let (registry, _) = dir.full_registry::<Profile>();
        registry.save("profile", &Profile::new("Test", 100));
    }
    let key_contents = fs::read_to_string(&key_file).unwrap();
    assert!(lock_path(&key_file).exists());

    let (registry, _) = dir.full_registry::<Profile>();
    assert_eq!(fs::read_to_string(&key_file).unwrap(), key_contents);
    assert_eq!(
        registry
            .load_from(BackendId::ENCRYPTED_FILE.as_str(), "profile")
            .unwrap(),
        Some(Profile::new("Test", 100))
    );
}

#[test]
fn concurrent_first_use_shares_one_key() {
    let dir = TempSaveDir::new();
    let key_file = dir.config().key_file();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let key_file = key_file.clone();
            thread::spawn(move || {
                let service = EncryptionService::open(&key_file).unwrap();
                let text = format!("writer {i}");
                (text.clone(), service.encrypt(&text).unwrap(), service.key_source())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let generated = results
        .iter()
        .filter(|(_, _, source)| *source == KeySource::Generated)
        .count();
    assert_eq!(generated, 1);

    // Every writer's ciphertext opens with the key now on disk
    let service = EncryptionService::open(&key_file).unwrap();
    for (text, ciphertext, _) in results {
        assert_eq!(service.decrypt(&ciphertext).unwrap(), text);
    }
}

#[test]
fn foreign_key_cannot_read_records() {
    let dir = TempSaveDir::new();
    let (registry, _) = dir.full_registry::<Profile>();
    registry.save("profile", &Profile::new("Test", 100));

    // A different root holds a different key
    let other = TempSaveDir::new();
    let foreign = RegistryBuilder::<Profile>::new(dir.config().key_file_name("other.dat"))
        .encrypted_json_file(BackendId::ENCRYPTED_FILE)
        .encryption(Arc::new(EncryptionService::open(other.config().key_file()).unwrap()))
        .build()
        .unwrap();

    match foreign.load_from(BackendId::ENCRYPTED_FILE.as_str(), "profile") {
        Ok(value) => assert_ne!(value, Some(Profile::new("Test", 100))),
        Err(e) => assert!(e.is_corrupted()),
    }
}

#[test]
fn unusable_key_file_fails_the_build() {
    let dir = TempSaveDir::new();
    fs::create_dir_all(dir.path()).unwrap();
    fs::write(dir.config().key_file(), "tiny").unwrap();

    let result = RegistryBuilder::<Profile>::new(dir.config()).encryption_from_config();
    assert!(matches!(result, Err(StorageError::Configuration { .. })));
}
