//! List-view edits over the same layout.
//!
//! The settings screen shows widgets as a plain list sorted by `order` with
//! show/hide and up/down controls. Every operation returns a fresh layout in
//! list order with `order` renumbered `0..n`; callers commit it like any other
//! layout update.

use crate::catalog::WidgetType;
use crate::geometry::GridSize;
use crate::layout::{Layout, OccupancyMap, WidgetInstance};

fn renumbered(mut widgets: Vec<WidgetInstance>) -> Layout {
    for (idx, widget) in widgets.iter_mut().enumerate() {
        widget.order = idx as i32;
    }
    Layout::new(widgets)
}

fn list_order(layout: &Layout) -> Vec<WidgetInstance> {
    layout.sorted_for_list().into_iter().cloned().collect()
}

/// Flip a widget's visibility.
///
/// Hiding always succeeds. Showing keeps the last known geometry when those
/// cells are free, otherwise moves the widget to the first slot that fits.
/// Returns `None` when the widget is unknown or cannot be shown anywhere.
pub fn toggle_visibility(layout: &Layout, id: WidgetType, grid: GridSize) -> Option<Layout> {
    let mut widgets = list_order(layout);
    let map = OccupancyMap::build(&widgets, grid, Some(id));
    let widget = widgets.iter_mut().find(|w| w.id == id)?;

    if widget.visible {
        widget.visible = false;
    } else {
        if !map.can_place(widget.rect(), None) {
            let (x, y) = map.first_fit(widget.width, widget.height, None)?;
            widget.grid_x = x;
            widget.grid_y = y;
        }
        widget.visible = true;
    }

    Some(renumbered(widgets))
}

/// Swap a widget with its predecessor in list order.
pub fn move_up(layout: &Layout, id: WidgetType) -> Option<Layout> {
    let mut widgets = list_order(layout);
    let idx = widgets.iter().position(|w| w.id == id)?;
    if idx == 0 {
        return None;
    }
    widgets.swap(idx, idx - 1);
    Some(renumbered(widgets))
}

/// Swap a widget with its successor in list order.
pub fn move_down(layout: &Layout, id: WidgetType) -> Option<Layout> {
    let mut widgets = list_order(layout);
    let idx = widgets.iter().position(|w| w.id == id)?;
    if idx + 1 >= widgets.len() {
        return None;
    }
    widgets.swap(idx, idx + 1);
    Some(renumbered(widgets))
}
