//! Error types shared across the crate.

mod types;

pub use types::{DashboardError, Result};
