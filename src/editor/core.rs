use std::fmt;

use crate::catalog::WidgetType;
use crate::geometry::{GridRect, GridSize};
use crate::layout::{Layout, OccupancyMap, WidgetInstance};

/// Largest width or height a widget may span, in cells.
pub const DEFAULT_MAX_SPAN: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Picked from the palette; not on the grid yet.
    NewPlacement,
    /// Tapped on the grid; only the size can change.
    Resizing,
    /// Long-pressed on the grid; its own cells count as free.
    Moving,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::NewPlacement => "new_placement",
            SelectionMode::Resizing => "resizing",
            SelectionMode::Moving => "moving",
        }
    }
}

/// The widget currently being placed and the size it would take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub widget: WidgetType,
    pub width: u16,
    pub height: u16,
    pub mode: SelectionMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Normal,
    Editing {
        layout: Layout,
        selection: Option<Selection>,
    },
}

/// Outbound message for the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutCommand {
    /// Replace the persisted layout with this one in full.
    UpdateLayout(Layout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotEditing,
    NoSelection,
    /// The selection is in a mode that does not allow this commit.
    WrongMode,
    OutOfBounds,
    Overlap,
    /// No free anchor anywhere on the grid.
    NoRoom,
    NotInLayout,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotEditing => "not_editing",
            RejectReason::NoSelection => "no_selection",
            RejectReason::WrongMode => "wrong_mode",
            RejectReason::OutOfBounds => "out_of_bounds",
            RejectReason::Overlap => "overlap",
            RejectReason::NoRoom => "no_room",
            RejectReason::NotInLayout => "not_in_layout",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    Committed(LayoutCommand),
    /// Nothing changed; the selection is kept so the user can try again.
    Rejected(RejectReason),
}

impl CommitResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitResult::Committed(_))
    }
}

/// Edit-mode state machine.
///
/// Transition methods return `false` when called from a state that does not
/// allow them and leave the state untouched. Commit methods validate the
/// target rectangle against the grid and every other visible widget before
/// writing anything.
#[derive(Debug, Clone)]
pub struct EditController {
    grid: GridSize,
    max_span: u16,
    state: EditorState,
}

impl EditController {
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            max_span: DEFAULT_MAX_SPAN,
            state: EditorState::Normal,
        }
    }

    pub fn with_max_span(mut self, max_span: u16) -> Self {
        self.max_span = max_span.max(1);
        self
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditorState::Editing { .. })
    }

    /// Working layout while editing.
    pub fn layout(&self) -> Option<&Layout> {
        match &self.state {
            EditorState::Editing { layout, .. } => Some(layout),
            EditorState::Normal => None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.state {
            EditorState::Editing { selection, .. } => selection.as_ref(),
            EditorState::Normal => None,
        }
    }

    /// Start an edit session over a copy of the dashboard layout.
    pub fn enter_editing(&mut self, layout: Layout) -> bool {
        if self.is_editing() {
            return false;
        }
        self.state = EditorState::Editing {
            layout,
            selection: None,
        };
        true
    }

    /// Leave edit mode, dropping any selection in progress.
    pub fn finish_editing(&mut self) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.state = EditorState::Normal;
        true
    }

    /// Placeable widget types not currently shown on the grid.
    pub fn palette(&self) -> Vec<WidgetType> {
        let Some(layout) = self.layout() else {
            return Vec::new();
        };
        WidgetType::placeable()
            .filter(|kind| !layout.get(*kind).is_some_and(|w| w.visible))
            .collect()
    }

    /// Pick a palette entry for placement at its catalog footprint.
    pub fn select_new(&mut self, kind: WidgetType) -> bool {
        if !self.palette().contains(&kind) {
            return false;
        }
        let footprint = kind.meta().footprint;
        let width = self.clamp_width(footprint.width as i32);
        let height = self.clamp_height(footprint.height as i32);
        self.select(Selection {
            widget: kind,
            width,
            height,
            mode: SelectionMode::NewPlacement,
        })
    }

    /// Tap on a placed widget: resize it where it stands.
    pub fn select_existing(&mut self, kind: WidgetType) -> bool {
        self.select_placed(kind, SelectionMode::Resizing)
    }

    /// Long-press on a placed widget: pick it up to move it.
    pub fn begin_move(&mut self, kind: WidgetType) -> bool {
        self.select_placed(kind, SelectionMode::Moving)
    }

    fn select_placed(&mut self, kind: WidgetType, mode: SelectionMode) -> bool {
        let Some(widget) = self.layout().and_then(|l| l.get(kind)) else {
            return false;
        };
        if !widget.visible {
            return false;
        }
        let (width, height) = (widget.width, widget.height);
        self.select(Selection {
            widget: kind,
            width,
            height,
            mode,
        })
    }

    fn select(&mut self, next: Selection) -> bool {
        match &mut self.state {
            EditorState::Editing { selection, .. } if selection.is_none() => {
                *selection = Some(next);
                true
            }
            _ => false,
        }
    }

    /// Grow or shrink the selected width, clamped to `1..=max_span`.
    pub fn step_width(&mut self, delta: i16) -> bool {
        let Some(current) = self.selection().copied() else {
            return false;
        };
        let width = self.clamp_width(current.width as i32 + delta as i32);
        self.set_size(width, current.height)
    }

    /// Grow or shrink the selected height, clamped to `1..=max_span`.
    pub fn step_height(&mut self, delta: i16) -> bool {
        let Some(current) = self.selection().copied() else {
            return false;
        };
        let height = self.clamp_height(current.height as i32 + delta as i32);
        self.set_size(current.width, height)
    }

    /// Set the selected size. Placement validity is checked at commit time.
    pub fn set_size(&mut self, width: u16, height: u16) -> bool {
        let width = self.clamp_width(width as i32);
        let height = self.clamp_height(height as i32);
        match &mut self.state {
            EditorState::Editing {
                selection: Some(selection),
                ..
            } => {
                let changed = selection.width != width || selection.height != height;
                selection.width = width;
                selection.height = height;
                changed
            }
            _ => false,
        }
    }

    fn clamp_width(&self, value: i32) -> u16 {
        let cap = self.max_span.min(self.grid.cols).max(1);
        value.clamp(1, cap as i32) as u16
    }

    fn clamp_height(&self, value: i32) -> u16 {
        let cap = self.max_span.min(self.grid.rows).max(1);
        value.clamp(1, cap as i32) as u16
    }

    /// Occupancy of the working layout as the selection sees it.
    ///
    /// A widget being moved is left off the map so its own cells read free.
    pub fn occupancy(&self) -> Option<OccupancyMap> {
        let layout = self.layout()?;
        let exclude = self
            .selection()
            .filter(|s| s.mode == SelectionMode::Moving)
            .map(|s| s.widget);
        Some(OccupancyMap::build(layout.widgets(), self.grid, exclude))
    }

    /// Whether the selection would fit with its top-left cell at `(x, y)`.
    pub fn can_place_at(&self, x: u16, y: u16) -> bool {
        let (Some(selection), Some(map)) = (self.selection(), self.occupancy()) else {
            return false;
        };
        let rect = GridRect::new(x, y, selection.width, selection.height);
        map.can_place(rect, Some(selection.widget))
    }

    /// Every anchor cell the selection could be dropped on.
    pub fn available_anchors(&self) -> Vec<(u16, u16)> {
        let (Some(selection), Some(map)) = (self.selection(), self.occupancy()) else {
            return Vec::new();
        };
        map.anchors(selection.width, selection.height, Some(selection.widget))
    }

    /// Drop a new or moving selection with its top-left cell at `(x, y)`.
    pub fn place_at(&mut self, x: u16, y: u16) -> CommitResult {
        let selection = match self.placing_selection() {
            Ok(selection) => selection,
            Err(reason) => return CommitResult::Rejected(reason),
        };
        let rect = GridRect::new(x, y, selection.width, selection.height);
        if let Err(reason) = self.check_rect(rect, selection.widget) {
            return CommitResult::Rejected(reason);
        }
        self.commit_placement(selection, rect)
    }

    /// Drop a new or moving selection at the first anchor that fits.
    pub fn place_anywhere(&mut self) -> CommitResult {
        let selection = match self.placing_selection() {
            Ok(selection) => selection,
            Err(reason) => return CommitResult::Rejected(reason),
        };
        let anchor = self.occupancy().and_then(|map| {
            map.first_fit(selection.width, selection.height, Some(selection.widget))
        });
        match anchor {
            Some((x, y)) => {
                let rect = GridRect::new(x, y, selection.width, selection.height);
                self.commit_placement(selection, rect)
            }
            None => CommitResult::Rejected(RejectReason::NoRoom),
        }
    }

    /// Apply the resized footprint at the widget's current anchor.
    pub fn apply_size(&mut self) -> CommitResult {
        let selection = match self.current_selection() {
            Ok(selection) => selection,
            Err(reason) => return CommitResult::Rejected(reason),
        };
        if selection.mode != SelectionMode::Resizing {
            return CommitResult::Rejected(RejectReason::WrongMode);
        }
        let Some(existing) = self.layout().and_then(|l| l.get(selection.widget)) else {
            return CommitResult::Rejected(RejectReason::NotInLayout);
        };
        let rect = GridRect::new(
            existing.grid_x,
            existing.grid_y,
            selection.width,
            selection.height,
        );
        if let Err(reason) = self.check_rect(rect, selection.widget) {
            return CommitResult::Rejected(reason);
        }
        self.commit_placement(selection, rect)
    }

    /// Hide the selected widget, keeping its last geometry for later.
    pub fn remove(&mut self) -> CommitResult {
        let selection = match self.current_selection() {
            Ok(selection) => selection,
            Err(reason) => return CommitResult::Rejected(reason),
        };
        if selection.mode == SelectionMode::NewPlacement {
            return CommitResult::Rejected(RejectReason::WrongMode);
        }
        let EditorState::Editing {
            layout,
            selection: slot,
        } = &mut self.state
        else {
            return CommitResult::Rejected(RejectReason::NotEditing);
        };
        let Some(widget) = layout.get_mut(selection.widget) else {
            return CommitResult::Rejected(RejectReason::NotInLayout);
        };
        widget.visible = false;
        *slot = None;
        CommitResult::Committed(LayoutCommand::UpdateLayout(layout.clone()))
    }

    /// Drop the selection without touching the layout.
    pub fn cancel(&mut self) -> bool {
        match &mut self.state {
            EditorState::Editing { selection, .. } => selection.take().is_some(),
            EditorState::Normal => false,
        }
    }

    fn current_selection(&self) -> Result<Selection, RejectReason> {
        match &self.state {
            EditorState::Normal => Err(RejectReason::NotEditing),
            EditorState::Editing { selection, .. } => {
                selection.ok_or(RejectReason::NoSelection)
            }
        }
    }

    fn placing_selection(&self) -> Result<Selection, RejectReason> {
        let selection = self.current_selection()?;
        match selection.mode {
            SelectionMode::NewPlacement | SelectionMode::Moving => Ok(selection),
            SelectionMode::Resizing => Err(RejectReason::WrongMode),
        }
    }

    fn check_rect(&self, rect: GridRect, widget: WidgetType) -> Result<(), RejectReason> {
        if !rect.fits_within(self.grid) {
            return Err(RejectReason::OutOfBounds);
        }
        let map = self.occupancy().ok_or(RejectReason::NotEditing)?;
        if !map.can_place(rect, Some(widget)) {
            return Err(RejectReason::Overlap);
        }
        Ok(())
    }

    fn commit_placement(&mut self, selection: Selection, rect: GridRect) -> CommitResult {
        let EditorState::Editing {
            layout,
            selection: slot,
        } = &mut self.state
        else {
            return CommitResult::Rejected(RejectReason::NotEditing);
        };
        let order = layout
            .get(selection.widget)
            .map_or_else(|| layout.next_order(), |w| w.order);
        let placed =
            WidgetInstance::new(selection.widget, rect.x, rect.y, rect.width, rect.height)
                .with_order(order);
        layout.upsert(placed);
        *slot = None;
        CommitResult::Committed(LayoutCommand::UpdateLayout(layout.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DashboardFeatures, default_layout};

    fn editing(layout: Layout) -> EditController {
        let mut editor = EditController::new(GridSize::REFERENCE);
        assert!(editor.enter_editing(layout));
        editor
    }

    fn committed(result: CommitResult) -> Layout {
        match result {
            CommitResult::Committed(LayoutCommand::UpdateLayout(layout)) => layout,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn palette_lists_hidden_and_missing_placeable_types() {
        let layout = Layout::new(vec![
            WidgetInstance::new(WidgetType::StartTimer, 0, 0, 2, 1),
            WidgetInstance::new(WidgetType::Progress, 0, 1, 4, 1).hidden(),
        ]);
        let palette = editing(layout).palette();

        assert!(!palette.contains(&WidgetType::StartTimer));
        assert!(palette.contains(&WidgetType::Progress));
        assert!(palette.contains(&WidgetType::CategoryChart));
        assert!(!palette.contains(&WidgetType::Streak));
    }

    #[test]
    fn new_placement_uses_catalog_footprint() {
        let mut editor = editing(Layout::default());
        assert!(editor.select_new(WidgetType::CategoryChart));
        let selection = editor.selection().unwrap();
        assert_eq!((selection.width, selection.height), (4, 2));
        assert_eq!(selection.mode, SelectionMode::NewPlacement);
    }

    #[test]
    fn cannot_select_twice_without_commit_or_cancel() {
        let mut editor = editing(default_layout(DashboardFeatures::default()));
        assert!(editor.select_existing(WidgetType::Progress));
        assert!(!editor.begin_move(WidgetType::DailyGoal));
        assert!(editor.cancel());
        assert!(editor.begin_move(WidgetType::DailyGoal));
    }

    #[test]
    fn placement_rejects_overlap_and_accepts_free_cells() {
        let mut editor = editing(Layout::new(vec![WidgetInstance::new(
            WidgetType::StartTimer,
            0,
            0,
            2,
            1,
        )]));
        assert!(editor.select_new(WidgetType::PomodoroTimer));

        assert_eq!(
            editor.place_at(1, 0),
            CommitResult::Rejected(RejectReason::Overlap)
        );
        assert!(editor.selection().is_some());

        let layout = committed(editor.place_at(2, 0));
        let pomodoro = layout.get(WidgetType::PomodoroTimer).unwrap();
        assert_eq!(pomodoro.rect(), GridRect::new(2, 0, 2, 1));
        assert_eq!(pomodoro.order, 1);
        assert!(editor.selection().is_none());
    }

    #[test]
    fn placement_rejects_out_of_bounds() {
        let mut editor = editing(Layout::default());
        assert!(editor.select_new(WidgetType::Progress));
        assert_eq!(
            editor.place_at(1, 0),
            CommitResult::Rejected(RejectReason::OutOfBounds)
        );
        assert_eq!(
            editor.place_at(0, 8),
            CommitResult::Rejected(RejectReason::OutOfBounds)
        );
    }

    #[test]
    fn moving_widget_may_land_on_its_own_cells() {
        let mut editor = editing(Layout::new(vec![
            WidgetInstance::new(WidgetType::CategoryChart, 0, 0, 2, 2),
            WidgetInstance::new(WidgetType::DailyGoal, 2, 0, 2, 1),
        ]));
        assert!(editor.begin_move(WidgetType::CategoryChart));
        assert!(editor.can_place_at(0, 0));
        assert!(editor.can_place_at(0, 1));
        assert!(!editor.can_place_at(1, 0));

        let layout = committed(editor.place_at(0, 1));
        assert_eq!(
            layout.get(WidgetType::CategoryChart).unwrap().rect(),
            GridRect::new(0, 1, 2, 2)
        );
    }

    #[test]
    fn apply_size_keeps_anchor_and_checks_neighbours() {
        let mut editor = editing(Layout::new(vec![
            WidgetInstance::new(WidgetType::DailyGoal, 0, 0, 2, 1),
            WidgetInstance::new(WidgetType::TodayStudy, 2, 0, 2, 1),
        ]));
        assert!(editor.select_existing(WidgetType::DailyGoal));
        assert!(editor.step_width(1));
        assert_eq!(
            editor.apply_size(),
            CommitResult::Rejected(RejectReason::Overlap)
        );

        assert!(editor.set_size(2, 2));
        let layout = committed(editor.apply_size());
        assert_eq!(
            layout.get(WidgetType::DailyGoal).unwrap().rect(),
            GridRect::new(0, 0, 2, 2)
        );
    }

    #[test]
    fn apply_size_is_only_for_resizing() {
        let mut editor = editing(default_layout(DashboardFeatures::default()));
        assert_eq!(
            editor.apply_size(),
            CommitResult::Rejected(RejectReason::NoSelection)
        );
        assert!(editor.begin_move(WidgetType::Progress));
        assert_eq!(
            editor.apply_size(),
            CommitResult::Rejected(RejectReason::WrongMode)
        );
        assert!(editor.place_at(0, 1).is_committed());
    }

    #[test]
    fn steppers_clamp_to_span() {
        let mut editor = editing(default_layout(DashboardFeatures::default()));
        assert!(editor.select_existing(WidgetType::Progress));
        assert!(!editor.step_width(3));
        assert_eq!(editor.selection().unwrap().width, 4);
        assert!(!editor.step_height(-5));
        assert_eq!(editor.selection().unwrap().height, 1);
        assert!(editor.step_height(10));
        assert_eq!(editor.selection().unwrap().height, 4);
    }

    #[test]
    fn remove_hides_but_keeps_geometry() {
        let mut editor = editing(default_layout(DashboardFeatures::default()));
        assert!(editor.select_existing(WidgetType::TotalStudy));
        let layout = committed(editor.remove());
        let total = layout.get(WidgetType::TotalStudy).unwrap();
        assert!(!total.visible);
        assert_eq!(total.rect(), GridRect::new(0, 3, 2, 1));
        assert!(editor.palette().contains(&WidgetType::TotalStudy));
    }

    #[test]
    fn remove_refuses_new_placements() {
        let mut editor = editing(Layout::default());
        assert!(editor.select_new(WidgetType::Progress));
        assert_eq!(
            editor.remove(),
            CommitResult::Rejected(RejectReason::WrongMode)
        );
    }

    #[test]
    fn place_anywhere_uses_first_fit() {
        let mut editor = editing(Layout::new(vec![WidgetInstance::new(
            WidgetType::Progress,
            0,
            0,
            4,
            1,
        )]));
        assert!(editor.select_new(WidgetType::DailyGoal));
        let layout = committed(editor.place_anywhere());
        assert_eq!(
            layout.get(WidgetType::DailyGoal).unwrap().rect(),
            GridRect::new(0, 1, 2, 1)
        );
    }

    #[test]
    fn finishing_discards_selection_without_commit() {
        let mut editor = editing(default_layout(DashboardFeatures::default()));
        assert!(editor.begin_move(WidgetType::Progress));
        assert!(editor.finish_editing());
        assert_eq!(editor.state(), &EditorState::Normal);
        assert_eq!(
            editor.place_at(0, 0),
            CommitResult::Rejected(RejectReason::NotEditing)
        );
    }
}
