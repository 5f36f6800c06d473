use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Closed set of dashboard widget identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    StartTimer,
    PomodoroTimer,
    Progress,
    DailyGoal,
    TodayStudy,
    TotalStudy,
    RemainingTime,
    CategoryChart,
    TodayReview,
    SabotageMode,
    Streak,
}

impl WidgetType {
    pub const ALL: [WidgetType; 11] = [
        WidgetType::StartTimer,
        WidgetType::PomodoroTimer,
        WidgetType::Progress,
        WidgetType::DailyGoal,
        WidgetType::TodayStudy,
        WidgetType::TotalStudy,
        WidgetType::RemainingTime,
        WidgetType::CategoryChart,
        WidgetType::TodayReview,
        WidgetType::SabotageMode,
        WidgetType::Streak,
    ];

    /// Wire identifier, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::StartTimer => "start_timer",
            WidgetType::PomodoroTimer => "pomodoro_timer",
            WidgetType::Progress => "progress",
            WidgetType::DailyGoal => "daily_goal",
            WidgetType::TodayStudy => "today_study",
            WidgetType::TotalStudy => "total_study",
            WidgetType::RemainingTime => "remaining_time",
            WidgetType::CategoryChart => "category_chart",
            WidgetType::TodayReview => "today_review",
            WidgetType::SabotageMode => "sabotage_mode",
            WidgetType::Streak => "streak",
        }
    }

    pub fn meta(&self) -> &'static WidgetMeta {
        meta(*self)
    }

    /// Catalog-only types exist for display but cannot be put on the grid yet.
    pub fn is_placeable(&self) -> bool {
        self.meta().placeable
    }

    pub fn placeable() -> impl Iterator<Item = WidgetType> {
        Self::ALL.into_iter().filter(WidgetType::is_placeable)
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| DashboardError::UnknownWidget(s.to_string()))
    }
}

/// Default cell footprint of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub width: u16,
    pub height: u16,
}

impl Footprint {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Display metadata for a widget type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetMeta {
    pub kind: WidgetType,
    pub label: &'static str,
    /// Icon token understood by the renderer.
    pub icon: &'static str,
    pub footprint: Footprint,
    pub placeable: bool,
}

const fn entry(
    kind: WidgetType,
    label: &'static str,
    icon: &'static str,
    width: u16,
    height: u16,
    placeable: bool,
) -> WidgetMeta {
    WidgetMeta {
        kind,
        label,
        icon,
        footprint: Footprint::new(width, height),
        placeable,
    }
}

// Indexed in `WidgetType::ALL` order.
static CATALOG: [WidgetMeta; 11] = [
    entry(WidgetType::StartTimer, "Start timer", "play", 2, 1, true),
    entry(WidgetType::PomodoroTimer, "Pomodoro", "timer", 2, 1, true),
    entry(WidgetType::Progress, "Overall progress", "trending_up", 4, 1, true),
    entry(WidgetType::DailyGoal, "Daily goal", "target", 2, 1, true),
    entry(WidgetType::TodayStudy, "Studied today", "clock", 2, 1, true),
    entry(WidgetType::TotalStudy, "Total study time", "bar_chart", 2, 1, true),
    entry(WidgetType::RemainingTime, "Time remaining", "calendar", 2, 1, true),
    entry(WidgetType::CategoryChart, "Time by category", "pie_chart", 4, 2, true),
    entry(WidgetType::TodayReview, "Today's reviews", "repeat", 4, 1, true),
    entry(WidgetType::SabotageMode, "Sabotage mode", "skull", 2, 1, false),
    entry(WidgetType::Streak, "Study streak", "flame", 2, 1, false),
];

/// Look up catalog metadata for a widget type.
pub fn meta(kind: WidgetType) -> &'static WidgetMeta {
    // `CATALOG` mirrors the enum declaration order.
    &CATALOG[kind as usize]
}
