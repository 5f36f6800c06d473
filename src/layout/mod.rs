//! Layout module orchestrator.
//!
//! Widget placement data lives in the private `core` module; occupancy
//! queries, default layouts, reconciliation, and list-view edits each have
//! their own submodule. Downstream code imports everything from here.

mod core;
mod defaults;
pub mod grid;
pub mod list;
mod reconcile;

pub use core::{Layout, WidgetInstance};
pub use defaults::{DashboardFeatures, default_layout};
pub use grid::{CellConflict, OccupancyMap};
pub use reconcile::{Anomaly, Resolution, WidgetPatch, fit_to_grid, reconcile, resolve, sanitize};
