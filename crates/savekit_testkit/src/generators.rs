//! Property-based test generators using proptest.

use crate::fixtures::{GameSettings, PlayerProgress, Profile};
use proptest::prelude::*;

/// Strategy for keys every backend accepts.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_-]{0,31}").expect("Invalid regex")
}

/// Strategy for display names, including non-ASCII text.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ]{0,16}|[äöüßéñ日本]{1,8}").expect("Invalid regex")
}

/// Strategy for profiles.
pub fn profile_strategy() -> impl Strategy<Value = Profile> {
    (name_strategy(), any::<u32>()).prop_map(|(name, score)| Profile { name, score })
}

/// Strategy for settings.
pub fn settings_strategy() -> impl Strategy<Value = GameSettings> {
    (0u8..=100, any::<bool>(), prop::sample::select(vec!["en", "de", "ja", "pt-BR"])).prop_map(
        |(volume, fullscreen, language)| GameSettings {
            volume,
            fullscreen,
            language: language.to_string(),
        },
    )
}

/// Strategy for progress records.
pub fn progress_strategy() -> impl Strategy<Value = PlayerProgress> {
    (
        key_strategy(),
        prop::collection::vec(name_strategy(), 0..8),
        any::<u64>(),
    )
        .prop_map(|(checkpoint, inventory, play_time_secs)| PlayerProgress {
            checkpoint,
            inventory,
            play_time_secs,
        })
}

/// Strategy for arbitrary text payloads.
pub fn text_strategy() -> impl Strategy<Value = String> {
    any::<String>()
}
