use crate::catalog::WidgetType;
use crate::geometry::{GridRect, GridSize};

/// One placed (or hidden) widget in a dashboard layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInstance {
    pub id: WidgetType,
    pub visible: bool,
    /// Sort key for list-based rendering; need not be contiguous.
    pub order: i32,
    pub width: u16,
    pub height: u16,
    pub grid_x: u16,
    pub grid_y: u16,
}

impl WidgetInstance {
    /// Visible widget at `(grid_x, grid_y)` spanning `width` x `height` cells.
    pub fn new(id: WidgetType, grid_x: u16, grid_y: u16, width: u16, height: u16) -> Self {
        Self {
            id,
            visible: true,
            order: 0,
            width,
            height,
            grid_x,
            grid_y,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.grid_x, self.grid_y, self.width, self.height)
    }
}

/// Ordered collection of widget instances, at most one per [`WidgetType`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    widgets: Vec<WidgetInstance>,
}

impl Layout {
    /// Build a layout, keeping only the first instance of each widget type.
    pub fn new(widgets: Vec<WidgetInstance>) -> Self {
        let mut unique: Vec<WidgetInstance> = Vec::with_capacity(widgets.len());
        for widget in widgets {
            if !unique.iter().any(|w| w.id == widget.id) {
                unique.push(widget);
            }
        }
        Self { widgets: unique }
    }

    pub fn widgets(&self) -> &[WidgetInstance] {
        &self.widgets
    }

    pub fn into_widgets(self) -> Vec<WidgetInstance> {
        self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn get(&self, id: WidgetType) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: WidgetType) -> Option<&mut WidgetInstance> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    /// Replace the instance of `widget.id` in place, or append it.
    pub(crate) fn upsert(&mut self, widget: WidgetInstance) {
        match self.get_mut(widget.id) {
            Some(slot) => *slot = widget,
            None => self.widgets.push(widget),
        }
    }

    /// One past the largest `order`, for appending at the end of the list.
    pub fn next_order(&self) -> i32 {
        self.widgets
            .iter()
            .map(|w| w.order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    pub fn contains(&self, id: WidgetType) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = WidgetType> + '_ {
        self.widgets.iter().map(|w| w.id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.widgets.iter().filter(|w| w.visible)
    }

    /// Widgets in list-view order: ascending `order`, ties keep layout order.
    pub fn sorted_for_list(&self) -> Vec<&WidgetInstance> {
        let mut sorted: Vec<&WidgetInstance> = self.widgets.iter().collect();
        sorted.sort_by_key(|w| w.order);
        sorted
    }

    /// Pairs of visible widgets whose rectangles intersect.
    pub fn overlapping_pairs(&self) -> Vec<(WidgetType, WidgetType)> {
        let visible: Vec<&WidgetInstance> = self.visible().collect();
        let mut pairs = Vec::new();
        for (idx, a) in visible.iter().enumerate() {
            for b in &visible[idx + 1..] {
                if a.rect().intersects(&b.rect()) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }

    /// Visible widgets that spill outside `grid`.
    pub fn out_of_bounds(&self, grid: GridSize) -> Vec<WidgetType> {
        self.visible()
            .filter(|w| !w.rect().fits_within(grid))
            .map(|w| w.id)
            .collect()
    }
}

impl FromIterator<WidgetInstance> for Layout {
    fn from_iter<T: IntoIterator<Item = WidgetInstance>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
