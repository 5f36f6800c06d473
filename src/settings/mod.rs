//! Persisted settings document and the storage boundary.
//!
//! The dashboard layout is one field of a larger settings document that other
//! screens own. The document is always written back whole.

mod core;
pub mod store;

pub use core::{DashboardLayoutDoc, LegacySize, ReviewSettings, SavedWidget, Settings};
pub use store::{JsonFileStore, MemoryStore, SaveStatus, SettingsStore};
