//! # SaveKit Testkit
//!
//! Test utilities for SaveKit.
//!
//! This crate provides:
//! - Scratch save directories and sample record types
//! - A backend that fails on demand, for fan-out tests
//! - Property-based test generators using proptest
//! - Test log output via `tracing-subscriber`
//!
//! ## Usage
//!
//! ```rust
//! use savekit_testkit::prelude::*;
//!
//! let dir = TempSaveDir::new();
//! let (registry, _store) = dir.full_registry::<Profile>();
//!
//! let outcomes = registry.save("profile", &Profile::new("Test", 100));
//! assert!(outcomes.all_succeeded());
//! assert_eq!(registry.load("profile").len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod failing;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::failing::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use failing::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
