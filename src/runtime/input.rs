//! Terminal input adapter.
//!
//! Translates crossterm mouse and key events into [`RuntimeEvent`]s, mapping
//! terminal coordinates onto dashboard grid cells.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::geometry::GridSize;

use super::RuntimeEvent;

/// Maps a block of terminal cells onto the dashboard grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMapper {
    /// Terminal (column, row) of the grid's top-left corner.
    pub origin: (u16, u16),
    /// Terminal columns per grid cell.
    pub cell_cols: u16,
    /// Terminal rows per grid cell.
    pub cell_rows: u16,
    pub grid: GridSize,
    pressed: Option<(u16, u16)>,
}

impl Default for CellMapper {
    fn default() -> Self {
        Self::new((0, 0), 12, 3, GridSize::REFERENCE)
    }
}

impl CellMapper {
    pub fn new(origin: (u16, u16), cell_cols: u16, cell_rows: u16, grid: GridSize) -> Self {
        Self {
            origin,
            cell_cols: cell_cols.max(1),
            cell_rows: cell_rows.max(1),
            grid,
            pressed: None,
        }
    }

    /// Grid cell under a terminal position, if any.
    pub fn cell_at(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let dx = column.checked_sub(self.origin.0)?;
        let dy = row.checked_sub(self.origin.1)?;
        let (x, y) = (dx / self.cell_cols, dy / self.cell_rows);
        self.grid.contains_cell(x, y).then_some((x, y))
    }

    pub fn map_mouse(&mut self, event: &MouseEvent) -> Option<RuntimeEvent> {
        let cell = self.cell_at(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let (x, y) = cell?;
                self.pressed = Some((x, y));
                Some(RuntimeEvent::PressDown { x, y })
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let origin = self.pressed?;
                if cell == Some(origin) {
                    return None;
                }
                self.pressed = None;
                Some(RuntimeEvent::PressLeave)
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pressed.take()?;
                Some(RuntimeEvent::PressUp)
            }
            _ => None,
        }
    }

    pub fn map_key(&self, event: &KeyEvent) -> Option<RuntimeEvent> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mapped = match event.code {
            KeyCode::Char('e') => RuntimeEvent::EnterEdit,
            KeyCode::Esc => RuntimeEvent::Back,
            KeyCode::Enter => RuntimeEvent::ApplySize,
            KeyCode::Delete | KeyCode::Char('x') => RuntimeEvent::Remove,
            KeyCode::Char('a') => RuntimeEvent::PlaceAnywhere,
            KeyCode::Char('+') | KeyCode::Char('=') => RuntimeEvent::StepWidth(1),
            KeyCode::Char('-') => RuntimeEvent::StepWidth(-1),
            KeyCode::Char(']') => RuntimeEvent::StepHeight(1),
            KeyCode::Char('[') => RuntimeEvent::StepHeight(-1),
            _ => return None,
        };
        Some(mapped)
    }
}
