//! Grid occupancy model - dense cell map of which widget claims which cell
//!
//! The dashboard grid is small (32 cells in the reference sizing), so every
//! query scans the dense map directly instead of keeping an interval index.
//! Maps are cheap to rebuild and are never cached:
//! - Stamp every visible widget's rectangle, optionally excluding one widget
//! - Answer "can a W x H block go at (x, y)" with an optional self exception
//! - Report cells claimed twice (only possible with corrupted persisted data)
//!
//! # Example
//! ```
//! use studydash::{GridRect, GridSize, Layout, OccupancyMap, WidgetInstance, WidgetType};
//!
//! let layout = Layout::new(vec![WidgetInstance::new(WidgetType::StartTimer, 0, 0, 2, 1)]);
//! let map = OccupancyMap::build(layout.widgets(), GridSize::REFERENCE, None);
//!
//! assert!(!map.can_place(GridRect::new(1, 0, 2, 1), None));
//! assert!(map.can_place(GridRect::new(2, 0, 2, 1), None));
//! ```

use crate::catalog::WidgetType;
use crate::geometry::{GridRect, GridSize};
use crate::layout::WidgetInstance;

/// A cell stamped by two different widgets while building a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellConflict {
    pub x: u16,
    pub y: u16,
    /// Widget that held the cell before being overwritten.
    pub previous: WidgetType,
    /// Widget that now holds the cell (last write wins).
    pub current: WidgetType,
}

/// Dense `cols x rows` map of cell owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMap {
    grid: GridSize,
    cells: Vec<Option<WidgetType>>,
    conflicts: Vec<CellConflict>,
}

impl OccupancyMap {
    /// Empty map for `grid`.
    pub fn empty(grid: GridSize) -> Self {
        Self {
            grid,
            cells: vec![None; grid.cell_count()],
            conflicts: Vec::new(),
        }
    }

    /// Stamp every visible widget except `exclude` onto a fresh map.
    ///
    /// Cells outside the grid are ignored. Overlapping rectangles resolve
    /// last-write-wins and are recorded in [`OccupancyMap::conflicts`].
    pub fn build<'a, I>(widgets: I, grid: GridSize, exclude: Option<WidgetType>) -> Self
    where
        I: IntoIterator<Item = &'a WidgetInstance>,
    {
        let mut map = Self::empty(grid);
        for widget in widgets {
            if !widget.visible || Some(widget.id) == exclude {
                continue;
            }
            map.stamp(widget.id, widget.rect());
        }
        map
    }

    pub(crate) fn stamp(&mut self, id: WidgetType, rect: GridRect) {
        for (x, y) in rect.cells() {
            let Some(idx) = self.index(x, y) else {
                continue;
            };
            if let Some(previous) = self.cells[idx] {
                if previous != id {
                    self.conflicts.push(CellConflict {
                        x,
                        y,
                        previous,
                        current: id,
                    });
                }
            }
            self.cells[idx] = Some(id);
        }
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if self.grid.contains_cell(x, y) {
            Some(y as usize * self.grid.cols as usize + x as usize)
        } else {
            None
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Owner of a cell; `None` for free or out-of-grid cells.
    pub fn occupant(&self, x: u16, y: u16) -> Option<WidgetType> {
        self.index(x, y).and_then(|idx| self.cells[idx])
    }

    pub fn is_free(&self, x: u16, y: u16) -> bool {
        self.index(x, y).is_some_and(|idx| self.cells[idx].is_none())
    }

    /// True iff every cell of `rect` is inside the grid and is either free or
    /// owned by `except`.
    pub fn can_place(&self, rect: GridRect, except: Option<WidgetType>) -> bool {
        if !rect.fits_within(self.grid) {
            return false;
        }
        rect.cells().all(|(x, y)| match self.occupant(x, y) {
            None => true,
            Some(owner) => Some(owner) == except,
        })
    }

    /// Every free cell, row by row.
    pub fn free_cells(&self) -> Vec<(u16, u16)> {
        GridRect::new(0, 0, self.grid.cols, self.grid.rows)
            .cells()
            .filter(|&(x, y)| self.is_free(x, y))
            .collect()
    }

    /// Every anchor where a `width x height` block can be placed.
    pub fn anchors(&self, width: u16, height: u16, except: Option<WidgetType>) -> Vec<(u16, u16)> {
        GridRect::new(0, 0, self.grid.cols, self.grid.rows)
            .cells()
            .filter(|&(x, y)| self.can_place(GridRect::new(x, y, width, height), except))
            .collect()
    }

    /// First anchor (scanning rows top to bottom, then columns left to right)
    /// that accepts a `width x height` block.
    pub fn first_fit(&self, width: u16, height: u16, except: Option<WidgetType>) -> Option<(u16, u16)> {
        GridRect::new(0, 0, self.grid.cols, self.grid.rows)
            .cells()
            .find(|&(x, y)| self.can_place(GridRect::new(x, y, width, height), except))
    }

    /// Cells that were claimed by more than one widget during `build`.
    pub fn conflicts(&self) -> &[CellConflict] {
        &self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(id: WidgetType, x: u16, y: u16, w: u16, h: u16) -> WidgetInstance {
        WidgetInstance::new(id, x, y, w, h)
    }

    #[test]
    fn test_build_stamps_visible_rectangles() {
        let widgets = vec![
            widget(WidgetType::Progress, 0, 1, 4, 1),
            widget(WidgetType::DailyGoal, 0, 2, 2, 1).hidden(),
        ];
        let map = OccupancyMap::build(&widgets, GridSize::REFERENCE, None);

        for x in 0..4 {
            assert_eq!(map.occupant(x, 1), Some(WidgetType::Progress));
        }
        assert_eq!(map.occupant(0, 2), None);
        assert_eq!(map.free_cells().len(), 28);
        assert!(map.conflicts().is_empty());
    }

    #[test]
    fn test_exclude_omits_widget_entirely() {
        let widgets = vec![
            widget(WidgetType::StartTimer, 0, 0, 2, 2),
            widget(WidgetType::Streak, 2, 0, 2, 1),
        ];
        let map = OccupancyMap::build(&widgets, GridSize::REFERENCE, Some(WidgetType::StartTimer));

        assert!(map.is_free(0, 0));
        assert!(map.is_free(1, 1));
        assert_eq!(map.occupant(2, 0), Some(WidgetType::Streak));
    }

    #[test]
    fn test_can_place_bounds() {
        let map = OccupancyMap::empty(GridSize::new(4, 8));
        assert!(map.can_place(GridRect::new(0, 0, 4, 8), None));
        assert!(!map.can_place(GridRect::new(3, 0, 2, 1), None));
        assert!(!map.can_place(GridRect::new(0, 7, 1, 2), None));
        assert!(!map.can_place(GridRect::new(4, 0, 1, 1), None));
    }

    #[test]
    fn test_can_place_self_exception() {
        let widgets = vec![widget(WidgetType::TodayStudy, 1, 1, 2, 1)];
        let map = OccupancyMap::build(&widgets, GridSize::REFERENCE, None);

        let grown = GridRect::new(1, 1, 3, 1);
        assert!(!map.can_place(grown, None));
        assert!(!map.can_place(grown, Some(WidgetType::TotalStudy)));
        assert!(map.can_place(grown, Some(WidgetType::TodayStudy)));
    }

    #[test]
    fn test_corrupted_overlap_is_last_write_wins() {
        let widgets = vec![
            widget(WidgetType::Progress, 0, 0, 4, 1),
            widget(WidgetType::DailyGoal, 1, 0, 1, 1),
        ];
        let map = OccupancyMap::build(&widgets, GridSize::REFERENCE, None);

        assert_eq!(map.occupant(1, 0), Some(WidgetType::DailyGoal));
        assert_eq!(
            map.conflicts(),
            &[CellConflict {
                x: 1,
                y: 0,
                previous: WidgetType::Progress,
                current: WidgetType::DailyGoal,
            }]
        );
    }

    #[test]
    fn test_first_fit_scans_row_major() {
        let widgets = vec![
            widget(WidgetType::StartTimer, 0, 0, 2, 1),
            widget(WidgetType::PomodoroTimer, 3, 0, 1, 1),
        ];
        let map = OccupancyMap::build(&widgets, GridSize::REFERENCE, None);

        assert_eq!(map.first_fit(1, 1, None), Some((2, 0)));
        assert_eq!(map.first_fit(2, 1, None), Some((0, 1)));
        assert_eq!(map.first_fit(4, 8, None), None);
    }

    #[test]
    fn test_anchors_respect_block_size() {
        let map = OccupancyMap::empty(GridSize::new(4, 2));
        assert_eq!(map.anchors(4, 2, None), vec![(0, 0)]);
        assert_eq!(map.anchors(3, 1, None), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }
}
