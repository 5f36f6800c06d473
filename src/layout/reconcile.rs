//! Layout reconciliation.
//!
//! Persisted layouts may come from older releases: they can miss widget types
//! introduced later, miss geometry fields that did not exist yet, or carry
//! outright corrupted values. Everything that decides what a widget's final
//! geometry resolves to lives here.
//!
//! The load pipeline is [`resolve`]: [`sanitize`] the raw saved entries,
//! [`reconcile`] them over the defaults, [`fit_to_grid`], then separate any
//! rectangles that still collide.

use std::fmt;

use crate::catalog::WidgetType;
use crate::error::{DashboardError, Result};
use crate::geometry::{GridRect, GridSize};
use crate::layout::{Layout, OccupancyMap, WidgetInstance};
use crate::settings::SavedWidget;

/// Typed saved entry; every absent field falls back to the default widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetPatch {
    pub id: WidgetType,
    pub visible: Option<bool>,
    pub order: Option<i32>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub grid_x: Option<u16>,
    pub grid_y: Option<u16>,
}

impl WidgetPatch {
    pub fn new(id: WidgetType) -> Self {
        Self {
            id,
            visible: None,
            order: None,
            width: None,
            height: None,
            grid_x: None,
            grid_y: None,
        }
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn at(mut self, grid_x: u16, grid_y: u16) -> Self {
        self.grid_x = Some(grid_x);
        self.grid_y = Some(grid_y);
        self
    }

    /// Layer the present fields over `base`.
    pub fn apply_to(&self, base: &WidgetInstance) -> WidgetInstance {
        WidgetInstance {
            id: base.id,
            visible: self.visible.unwrap_or(base.visible),
            order: self.order.unwrap_or(base.order),
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            grid_x: self.grid_x.unwrap_or(base.grid_x),
            grid_y: self.grid_y.unwrap_or(base.grid_y),
        }
    }
}

impl From<&WidgetInstance> for WidgetPatch {
    fn from(widget: &WidgetInstance) -> Self {
        Self {
            id: widget.id,
            visible: Some(widget.visible),
            order: Some(widget.order),
            width: Some(widget.width),
            height: Some(widget.height),
            grid_x: Some(widget.grid_x),
            grid_y: Some(widget.grid_y),
        }
    }
}

/// Data-integrity findings made while loading a persisted layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Entry references a type this build does not know.
    UnknownWidget { id: String },
    /// Entry or field of the wrong shape. A field falls back to the default;
    /// an entry without an id is dropped.
    Malformed { id: String, field: &'static str },
    /// Second entry for a type already seen; dropped.
    DuplicateWidget { id: WidgetType },
    /// Numeric field outside its valid range.
    Clamped {
        id: WidgetType,
        field: &'static str,
        from: i64,
        to: u16,
    },
    /// Merged rectangle spilled outside the grid and was pulled back in.
    Refitted {
        id: WidgetType,
        from: GridRect,
        to: GridRect,
    },
    /// Rectangle collided with another visible widget and was moved.
    Relocated {
        id: WidgetType,
        from: GridRect,
        to: GridRect,
    },
    /// Rectangle collided and no free slot was left; widget hidden.
    Hidden { id: WidgetType },
}

impl Anomaly {
    pub fn kind(&self) -> &'static str {
        match self {
            Anomaly::UnknownWidget { .. } => "unknown_widget",
            Anomaly::Malformed { .. } => "malformed",
            Anomaly::DuplicateWidget { .. } => "duplicate_widget",
            Anomaly::Clamped { .. } => "clamped",
            Anomaly::Refitted { .. } => "refitted",
            Anomaly::Relocated { .. } => "relocated",
            Anomaly::Hidden { .. } => "hidden",
        }
    }

    /// Widget identifier the finding is about, as it appeared on the wire.
    pub fn widget(&self) -> &str {
        match self {
            Anomaly::UnknownWidget { id } | Anomaly::Malformed { id, .. } => id.as_str(),
            Anomaly::DuplicateWidget { id }
            | Anomaly::Clamped { id, .. }
            | Anomaly::Refitted { id, .. }
            | Anomaly::Relocated { id, .. }
            | Anomaly::Hidden { id } => id.as_str(),
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnknownWidget { id } => write!(f, "dropped unknown widget `{id}`"),
            Anomaly::Malformed { id, field } if id.is_empty() => {
                write!(f, "dropped entry without an id ({field})")
            }
            Anomaly::Malformed { id, field } => {
                write!(f, "ignored malformed `{id}`.{field}")
            }
            Anomaly::DuplicateWidget { id } => write!(f, "dropped duplicate entry for `{id}`"),
            Anomaly::Clamped {
                id,
                field,
                from,
                to,
            } => write!(f, "clamped `{id}`.{field} from {from} to {to}"),
            Anomaly::Refitted { id, from, to } | Anomaly::Relocated { id, from, to } => write!(
                f,
                "moved `{id}` from ({},{} {}x{}) to ({},{} {}x{})",
                from.x, from.y, from.width, from.height, to.x, to.y, to.width, to.height
            ),
            Anomaly::Hidden { id } => write!(f, "hid `{id}`: no free slot"),
        }
    }
}

/// Output of the load pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub layout: Layout,
    pub anomalies: Vec<Anomaly>,
}

/// Merge saved patches over the default layout.
///
/// Every default type yields exactly one entry: the matching patch layered
/// over the default, or the default verbatim. Patches for types missing from
/// `defaults` are dropped. The result is sorted by `order`, ties keeping the
/// default order.
pub fn reconcile(defaults: &Layout, saved: &[WidgetPatch]) -> Result<Layout> {
    if defaults.is_empty() {
        return Err(DashboardError::EmptyDefaultLayout);
    }

    let mut merged: Vec<WidgetInstance> = defaults
        .widgets()
        .iter()
        .map(|default| match saved.iter().find(|patch| patch.id == default.id) {
            Some(patch) => patch.apply_to(default),
            None => default.clone(),
        })
        .collect();
    merged.sort_by_key(|w| w.order);

    Ok(Layout::new(merged))
}

/// Turn raw persisted entries into typed patches.
///
/// Entries without an id, unknown types and repeated types are dropped (first
/// entry wins). Fields that failed to parse are reported and left to the
/// defaults. Sizes are
/// clamped to `[1, max_span]` within the grid and anchors to the grid. A legacy
/// `size` stands in for a missing `width`.
pub fn sanitize(
    saved: &[SavedWidget],
    grid: GridSize,
    max_span: u16,
) -> (Vec<WidgetPatch>, Vec<Anomaly>) {
    let mut patches: Vec<WidgetPatch> = Vec::with_capacity(saved.len());
    let mut anomalies = Vec::new();
    let max_width = max_span.min(grid.cols).max(1);
    let max_height = max_span.min(grid.rows).max(1);

    for entry in saved {
        if entry.id.is_empty() {
            anomalies.push(Anomaly::Malformed {
                id: String::new(),
                field: entry.malformed.first().copied().unwrap_or("id"),
            });
            continue;
        }
        let Ok(id) = entry.id.parse::<WidgetType>() else {
            anomalies.push(Anomaly::UnknownWidget {
                id: entry.id.clone(),
            });
            continue;
        };
        if patches.iter().any(|p| p.id == id) {
            anomalies.push(Anomaly::DuplicateWidget { id });
            continue;
        }
        anomalies.extend(entry.malformed.iter().map(|&field| Anomaly::Malformed {
            id: entry.id.clone(),
            field,
        }));

        let raw_width = entry
            .width
            .or_else(|| entry.size.map(|size| size.columns() as i64));
        let mut clamp = |field: &'static str, raw: Option<i64>, lo: u16, hi: u16| {
            raw.map(|value| {
                let clamped = value.clamp(lo as i64, hi as i64) as u16;
                if clamped as i64 != value {
                    anomalies.push(Anomaly::Clamped {
                        id,
                        field,
                        from: value,
                        to: clamped,
                    });
                }
                clamped
            })
        };

        let width = clamp("width", raw_width, 1, max_width);
        let height = clamp("height", entry.height, 1, max_height);
        let grid_x = clamp("gridX", entry.grid_x, 0, grid.cols.saturating_sub(1));
        let grid_y = clamp("gridY", entry.grid_y, 0, grid.rows.saturating_sub(1));

        patches.push(WidgetPatch {
            id,
            visible: entry.visible,
            order: entry.order,
            width,
            height,
            grid_x,
            grid_y,
        });
    }

    (patches, anomalies)
}

/// Pull every widget's rectangle back inside `grid`, keeping its size where
/// possible and shifting the anchor left/up.
pub fn fit_to_grid(layout: Layout, grid: GridSize) -> (Layout, Vec<Anomaly>) {
    let mut anomalies = Vec::new();
    let cols = grid.cols.max(1);
    let rows = grid.rows.max(1);

    let widgets = layout
        .into_widgets()
        .into_iter()
        .map(|mut widget| {
            let before = widget.rect();
            widget.width = widget.width.clamp(1, cols);
            widget.height = widget.height.clamp(1, rows);
            widget.grid_x = widget.grid_x.min(cols - widget.width);
            widget.grid_y = widget.grid_y.min(rows - widget.height);
            if widget.rect() != before {
                anomalies.push(Anomaly::Refitted {
                    id: widget.id,
                    from: before,
                    to: widget.rect(),
                });
            }
            widget
        })
        .collect();

    (Layout::new(widgets), anomalies)
}

/// Full load pipeline: sanitize, reconcile, fit, then separate collisions.
///
/// Widgets the user saved keep their cells; default-only newcomers that land
/// on an occupied cell move to the first free slot, or are hidden when the
/// grid has no room.
pub fn resolve(
    defaults: &Layout,
    saved: &[SavedWidget],
    grid: GridSize,
    max_span: u16,
) -> Result<Resolution> {
    let (patches, mut anomalies) = sanitize(saved, grid, max_span);
    let merged = reconcile(defaults, &patches)?;
    let (fitted, refits) = fit_to_grid(merged, grid);
    anomalies.extend(refits);

    let saved_ids: Vec<WidgetType> = patches.iter().map(|p| p.id).collect();
    let (layout, moves) = separate_overlaps(fitted, grid, &saved_ids);
    anomalies.extend(moves);

    Ok(Resolution { layout, anomalies })
}

fn separate_overlaps(
    layout: Layout,
    grid: GridSize,
    saved_ids: &[WidgetType],
) -> (Layout, Vec<Anomaly>) {
    let mut widgets = layout.into_widgets();
    let mut anomalies = Vec::new();

    let mut priority: Vec<usize> = (0..widgets.len()).filter(|&i| widgets[i].visible).collect();
    priority.sort_by_key(|&i| !saved_ids.contains(&widgets[i].id));

    let mut map = OccupancyMap::empty(grid);
    for idx in priority {
        let widget = &mut widgets[idx];
        let before = widget.rect();
        if !map.can_place(before, None) {
            match map.first_fit(widget.width, widget.height, None) {
                Some((x, y)) => {
                    widget.grid_x = x;
                    widget.grid_y = y;
                    anomalies.push(Anomaly::Relocated {
                        id: widget.id,
                        from: before,
                        to: widget.rect(),
                    });
                }
                None => {
                    widget.visible = false;
                    anomalies.push(Anomaly::Hidden { id: widget.id });
                    continue;
                }
            }
        }
        map.stamp(widget.id, widget.rect());
    }

    (Layout::new(widgets), anomalies)
}
