use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{KeyEvent, MouseEvent};
use serde_json::json;

use crate::catalog::WidgetType;
use crate::editor::{
    CommitResult, DEFAULT_LONG_PRESS, DEFAULT_MAX_SPAN, EditController, LayoutCommand,
    PressTracker, RejectReason, SelectionMode,
};
use crate::geometry::GridSize;
use crate::layout::{DashboardFeatures, Layout, OccupancyMap, default_layout, resolve};
use crate::logging::{
    TARGET_EDITOR, TARGET_METRICS, TARGET_RUNTIME, TARGET_SETTINGS, event_with_fields, json_kv,
    json_str,
};
use crate::settings::{SaveStatus, Settings, SettingsStore};
use crate::{EditorMetrics, LogLevel, Logger, Result};

pub mod input;

pub use input::CellMapper;

/// Configuration knobs for the editing runtime.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub grid: GridSize,
    /// Largest width or height a widget may span.
    pub max_span: u16,
    /// Hold time before a press on a widget starts a move.
    pub long_press: Duration,
    /// Feature switches for the default layout. `None` reads them from the
    /// loaded settings.
    pub features: Option<DashboardFeatures>,
    /// Terminal-to-grid mapping for `Key` and `Mouse` events.
    pub input: CellMapper,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<EditorMetrics>>>,
    /// Interval between metrics snapshot emissions on `Tick`. Zero disables
    /// snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::REFERENCE,
            max_span: DEFAULT_MAX_SPAN,
            long_press: DEFAULT_LONG_PRESS,
            features: None,
            input: CellMapper::default(),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(30),
            metrics_target: TARGET_METRICS.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = grid;
        self.input.grid = grid;
        self
    }

    pub fn with_max_span(mut self, max_span: u16) -> Self {
        self.max_span = max_span.max(1);
        self
    }

    pub fn with_long_press(mut self, threshold: Duration) -> Self {
        self.long_press = threshold;
        self
    }

    pub fn with_features(mut self, features: DashboardFeatures) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_input(mut self, input: CellMapper) -> Self {
        self.input = input;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(EditorMetrics::new())));
        }
    }

    /// Disable metrics collection and prevent further snapshots.
    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<EditorMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// UI events accepted by [`EditorRuntime::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Open the layout editor.
    EnterEdit,
    /// Close the layout editor, dropping any selection.
    Done,
    /// Cancel the selection if there is one, otherwise close the editor.
    Back,
    /// Palette pick of a widget type to place.
    Pick(WidgetType),
    /// Place the current selection at the first free slot.
    PlaceAnywhere,
    PressDown { x: u16, y: u16 },
    PressUp,
    PressLeave,
    /// Time passing; drives long-press detection and metrics snapshots.
    Tick,
    StepWidth(i16),
    StepHeight(i16),
    ApplySize,
    Remove,
    Cancel,
    Key(KeyEvent),
    Mouse(MouseEvent),
}

impl RuntimeEvent {
    fn describe(&self) -> &'static str {
        match self {
            RuntimeEvent::EnterEdit => "enter_edit",
            RuntimeEvent::Done => "done",
            RuntimeEvent::Back => "back",
            RuntimeEvent::Pick(_) => "pick",
            RuntimeEvent::PlaceAnywhere => "place_anywhere",
            RuntimeEvent::PressDown { .. } => "press_down",
            RuntimeEvent::PressUp => "press_up",
            RuntimeEvent::PressLeave => "press_leave",
            RuntimeEvent::Tick => "tick",
            RuntimeEvent::StepWidth(_) => "step_width",
            RuntimeEvent::StepHeight(_) => "step_height",
            RuntimeEvent::ApplySize => "apply_size",
            RuntimeEvent::Remove => "remove",
            RuntimeEvent::Cancel => "cancel",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Mouse(_) => "mouse",
        }
    }
}

/// What an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    /// Editor state changed; nothing was persisted.
    Updated,
    /// A new layout was committed and handed to the store.
    Committed,
    Rejected(RejectReason),
    /// A widget was tapped on the read-only dashboard.
    Activated(WidgetType),
}

/// Event-driven shell around the edit controller.
///
/// Holds the latest settings snapshot, the dashboard layout resolved from it,
/// and the edit session. Every commit is written through the store as a full
/// document and the dashboard layout is re-resolved from the result.
pub struct EditorRuntime<S: SettingsStore> {
    store: S,
    config: RuntimeConfig,
    settings: Settings,
    dashboard: Layout,
    editor: EditController,
    press: PressTracker,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl<S: SettingsStore> EditorRuntime<S> {
    pub fn new(store: S, config: RuntimeConfig) -> Result<Self> {
        let editor = EditController::new(config.grid).with_max_span(config.max_span);
        let press = PressTracker::new(config.long_press);
        let mut runtime = Self {
            store,
            config,
            settings: Settings::default(),
            dashboard: Layout::default(),
            editor,
            press,
            start_instant: None,
            last_metrics_emit: None,
        };
        runtime.reload()?;
        Ok(runtime)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read-only layout shown outside edit mode.
    pub fn dashboard_layout(&self) -> &Layout {
        &self.dashboard
    }

    pub fn editor(&self) -> &EditController {
        &self.editor
    }

    /// Pull the latest document from the store and re-resolve the dashboard.
    ///
    /// A document that cannot be read is logged and treated as empty. An edit
    /// session in progress keeps its own working layout.
    pub fn reload(&mut self) -> Result<()> {
        let settings = match self.store.load() {
            Ok(Some(settings)) => {
                self.log(
                    LogLevel::Info,
                    TARGET_SETTINGS,
                    "settings_loaded",
                    [json_kv("widgets", settings.saved_widgets().len())],
                );
                settings
            }
            Ok(None) => {
                self.log(LogLevel::Info, TARGET_SETTINGS, "settings_missing", std::iter::empty());
                Settings::default()
            }
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    TARGET_SETTINGS,
                    "settings_load_failed",
                    [json_str("error", err.to_string())],
                );
                Settings::default()
            }
        };
        self.settings = settings;
        self.refresh_dashboard()
    }

    fn defaults(&self) -> Layout {
        let features = self
            .config
            .features
            .unwrap_or_else(|| self.settings.features());
        default_layout(features)
    }

    fn refresh_dashboard(&mut self) -> Result<()> {
        let resolution = resolve(
            &self.defaults(),
            self.settings.saved_widgets(),
            self.config.grid,
            self.config.max_span,
        )?;
        for anomaly in &resolution.anomalies {
            self.log(
                LogLevel::Warn,
                TARGET_SETTINGS,
                "layout_anomaly",
                [
                    json_str("kind", anomaly.kind()),
                    json_str("widget", anomaly.widget()),
                    json_str("detail", anomaly.to_string()),
                ],
            );
        }
        self.with_metrics(|m| m.record_anomalies(resolution.anomalies.len()));
        self.dashboard = resolution.layout;
        Ok(())
    }

    /// Dispatch one UI event. `now` is the event's timestamp.
    ///
    /// Raw key and mouse events still drive long-press timing and metrics when
    /// they map to nothing.
    pub fn handle(&mut self, event: RuntimeEvent, now: Instant) -> Result<Outcome> {
        self.start_instant.get_or_insert(now);
        self.with_metrics(|m| m.record_event());
        self.log(
            LogLevel::Trace,
            TARGET_RUNTIME,
            "event",
            [json_str("kind", event.describe())],
        );

        // The long press fires before the event is looked at, so a release
        // arriving late finds the handle already cleared.
        let moved = self.poll_long_press(now);

        let mapped = match event {
            RuntimeEvent::Key(key) => self.config.input.map_key(&key),
            RuntimeEvent::Mouse(mouse) => self.config.input.map_mouse(&mouse),
            other => Some(other),
        };
        let outcome = match mapped {
            Some(event) => self.dispatch(event, now)?,
            None => Outcome::Ignored,
        };
        Ok(match outcome {
            Outcome::Ignored if moved => Outcome::Updated,
            other => other,
        })
    }

    /// Persist a layout command as a full settings document.
    pub fn apply(&mut self, command: LayoutCommand) -> Result<SaveStatus> {
        let LayoutCommand::UpdateLayout(layout) = command;
        self.settings.set_layout(&layout);
        let status = self.store.save(&self.settings)?;
        match status {
            SaveStatus::Written => self.log(
                LogLevel::Info,
                TARGET_SETTINGS,
                "settings_saved",
                [json_kv("widgets", layout.len())],
            ),
            SaveStatus::Unchanged => {
                self.log(LogLevel::Debug, TARGET_SETTINGS, "settings_save_skipped", std::iter::empty())
            }
        }
        self.with_metrics(|m| m.record_save(status == SaveStatus::Written));
        self.refresh_dashboard()?;
        Ok(status)
    }

    /// Emit a metrics snapshot to the logger regardless of the interval.
    pub fn emit_metrics(&mut self, now: Instant) {
        self.last_metrics_emit = Some(now);
        let uptime = self
            .start_instant
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let target = self.config.metrics_target.as_str();
                let snapshot_event = guard.snapshot(uptime).to_log_event(target);
                let _ = logger.log_event(snapshot_event);
            }
        }
    }

    fn dispatch(&mut self, event: RuntimeEvent, now: Instant) -> Result<Outcome> {
        let outcome = match event {
            RuntimeEvent::EnterEdit => {
                let entered = self.editor.enter_editing(self.dashboard.clone());
                if entered {
                    self.press.cancel();
                    self.log_mode("editing", None);
                }
                changed(entered)
            }
            RuntimeEvent::Done => self.finish_editing(),
            RuntimeEvent::Back => {
                if self.editor.selection().is_some() {
                    self.cancel_selection()
                } else {
                    self.finish_editing()
                }
            }
            RuntimeEvent::Cancel => self.cancel_selection(),
            RuntimeEvent::Pick(kind) => {
                // Types switched off by feature flags would vanish on the next load.
                let picked = self.defaults().contains(kind) && self.editor.select_new(kind);
                if picked {
                    self.log_mode(SelectionMode::NewPlacement.as_str(), Some(kind));
                }
                changed(picked)
            }
            RuntimeEvent::PressDown { x, y } => {
                self.press_down((x, y), now);
                Outcome::Ignored
            }
            RuntimeEvent::PressUp => match self.press.release() {
                Some(tap) => self.tap(tap.cell)?,
                None => Outcome::Ignored,
            },
            RuntimeEvent::PressLeave => {
                self.press.cancel();
                Outcome::Ignored
            }
            RuntimeEvent::Tick => {
                self.maybe_emit_metrics(now);
                Outcome::Ignored
            }
            RuntimeEvent::StepWidth(delta) => changed(self.editor.step_width(delta)),
            RuntimeEvent::StepHeight(delta) => changed(self.editor.step_height(delta)),
            RuntimeEvent::PlaceAnywhere => {
                let result = self.editor.place_anywhere();
                self.finish_commit(result)?
            }
            RuntimeEvent::ApplySize => {
                let result = self.editor.apply_size();
                self.finish_commit(result)?
            }
            RuntimeEvent::Remove => {
                let result = self.editor.remove();
                self.finish_commit(result)?
            }
            // Already translated in `handle`.
            RuntimeEvent::Key(_) | RuntimeEvent::Mouse(_) => Outcome::Ignored,
        };
        Ok(outcome)
    }

    fn press_down(&mut self, cell: (u16, u16), now: Instant) {
        // Long presses only start a move from an idle editor.
        let armed = self.editor.is_editing() && self.editor.selection().is_none();
        let target = if armed {
            self.occupant(cell.0, cell.1)
        } else {
            None
        };
        self.press.press_down(cell, target, now);
    }

    fn poll_long_press(&mut self, now: Instant) -> bool {
        let Some(long_press) = self.press.poll(now) else {
            return false;
        };
        let moved = self.editor.begin_move(long_press.target);
        if moved {
            self.log_mode(SelectionMode::Moving.as_str(), Some(long_press.target));
        }
        moved
    }

    fn tap(&mut self, cell: (u16, u16)) -> Result<Outcome> {
        let (x, y) = cell;
        if !self.editor.is_editing() {
            return Ok(match self.occupant(x, y) {
                Some(kind) => Outcome::Activated(kind),
                None => Outcome::Ignored,
            });
        }

        let mode = self.editor.selection().map(|s| s.mode);
        match mode {
            None => {
                let Some(kind) = self.occupant(x, y) else {
                    return Ok(Outcome::Ignored);
                };
                let selected = self.editor.select_existing(kind);
                if selected {
                    self.log_mode(SelectionMode::Resizing.as_str(), Some(kind));
                }
                Ok(changed(selected))
            }
            Some(SelectionMode::NewPlacement | SelectionMode::Moving) => {
                let result = self.editor.place_at(x, y);
                self.finish_commit(result)
            }
            Some(SelectionMode::Resizing) => Ok(Outcome::Ignored),
        }
    }

    fn occupant(&self, x: u16, y: u16) -> Option<WidgetType> {
        let layout = self.editor.layout().unwrap_or(&self.dashboard);
        OccupancyMap::build(layout.widgets(), self.config.grid, None).occupant(x, y)
    }

    fn finish_editing(&mut self) -> Outcome {
        let finished = self.editor.finish_editing();
        if finished {
            self.press.cancel();
            self.log_mode("normal", None);
        }
        changed(finished)
    }

    fn cancel_selection(&mut self) -> Outcome {
        let cancelled = self.editor.cancel();
        if cancelled {
            self.with_metrics(|m| m.record_cancel());
            self.log(LogLevel::Debug, TARGET_EDITOR, "selection_cancelled", std::iter::empty());
        }
        changed(cancelled)
    }

    fn finish_commit(&mut self, result: CommitResult) -> Result<Outcome> {
        match result {
            CommitResult::Committed(command) => {
                let LayoutCommand::UpdateLayout(layout) = &command;
                let visible = layout.visible().count();
                self.log(
                    LogLevel::Info,
                    TARGET_EDITOR,
                    "layout_committed",
                    [json_kv("visible", visible)],
                );
                self.with_metrics(|m| m.record_commit());
                self.apply(command)?;
                Ok(Outcome::Committed)
            }
            CommitResult::Rejected(reason) => {
                self.with_metrics(|m| m.record_rejection());
                self.log(
                    LogLevel::Debug,
                    TARGET_EDITOR,
                    "commit_rejected",
                    [json_str("reason", reason.as_str())],
                );
                Ok(Outcome::Rejected(reason))
            }
        }
    }

    fn maybe_emit_metrics(&mut self, now: Instant) {
        if self.config.metrics.is_none() || self.config.metrics_interval.is_zero() {
            return;
        }
        if let Some(last) = self.last_metrics_emit {
            if now.saturating_duration_since(last) < self.config.metrics_interval {
                return;
            }
        }
        self.emit_metrics(now);
    }

    fn log_mode(&self, mode: &str, widget: Option<WidgetType>) {
        let widget = widget.map_or(json!(null), |w| json!(w.as_str()));
        self.log(
            LogLevel::Debug,
            TARGET_EDITOR,
            "mode_changed",
            [json_str("mode", mode), json_kv("widget", widget)],
        );
    }

    fn log<I>(&self, level: LogLevel, target: &str, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, target, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn with_metrics(&self, record: impl FnOnce(&mut EditorMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }
}

fn changed(flag: bool) -> Outcome {
    if flag {
        Outcome::Updated
    } else {
        Outcome::Ignored
    }
}
