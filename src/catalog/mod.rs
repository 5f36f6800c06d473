//! Static widget catalog.
//!
//! Maps every [`WidgetType`] to its display metadata. The catalog is a lookup
//! table only; placement rules live in the layout and editor modules.

mod core;

pub use core::{Footprint, WidgetMeta, WidgetType, meta};
