use crate::catalog::WidgetType;
use crate::layout::{Layout, WidgetInstance};

/// Feature toggles that decide which widget types exist in the default layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardFeatures {
    /// Spaced-repetition review is switched on; adds the `today_review` tile.
    pub review_enabled: bool,
}

impl DashboardFeatures {
    pub fn with_review(mut self, enabled: bool) -> Self {
        self.review_enabled = enabled;
        self
    }
}

/// Code-defined default layout for the reference 4 x 8 grid.
///
/// Recomputed on every load; the set of widget types depends on `features`.
pub fn default_layout(features: DashboardFeatures) -> Layout {
    let mut widgets = vec![
        WidgetInstance::new(WidgetType::StartTimer, 0, 0, 2, 1),
        WidgetInstance::new(WidgetType::PomodoroTimer, 2, 0, 2, 1),
        WidgetInstance::new(WidgetType::Progress, 0, 1, 4, 1),
        WidgetInstance::new(WidgetType::DailyGoal, 0, 2, 2, 1),
        WidgetInstance::new(WidgetType::TodayStudy, 2, 2, 2, 1),
        WidgetInstance::new(WidgetType::TotalStudy, 0, 3, 2, 1),
        WidgetInstance::new(WidgetType::RemainingTime, 2, 3, 2, 1),
        WidgetInstance::new(WidgetType::CategoryChart, 0, 4, 4, 2),
    ];
    if features.review_enabled {
        widgets.push(WidgetInstance::new(WidgetType::TodayReview, 0, 6, 4, 1));
    }

    widgets
        .into_iter()
        .enumerate()
        .map(|(order, widget)| widget.with_order(order as i32))
        .collect()
}
