//! Grid layout engine for the study dashboard.
//!
//! Widgets sit on a small fixed grid. Layouts are resolved from the code
//! defaults plus whatever the user saved, edited through a state machine that
//! refuses overlapping or out-of-bounds placements, and written back as a full
//! settings document.

pub mod catalog;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod settings;

pub use catalog::{Footprint, WidgetMeta, WidgetType};
pub use editor::{
    CommitResult, EditController, EditorState, LayoutCommand, PressTracker, RejectReason,
    Selection, SelectionMode,
};
pub use error::{DashboardError, Result};
pub use geometry::{GridRect, GridSize};
pub use layout::{
    Anomaly, CellConflict, DashboardFeatures, Layout, OccupancyMap, Resolution, WidgetInstance,
    WidgetPatch, default_layout, reconcile, resolve,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{EditorMetrics, MetricSnapshot};
pub use runtime::{CellMapper, EditorRuntime, Outcome, RuntimeConfig, RuntimeEvent};
pub use settings::{JsonFileStore, MemoryStore, SaveStatus, Settings, SettingsStore};
