//! Long-press detection.
//!
//! A press arms a single pending handle. The handle is cleared by whichever
//! happens first: release (a tap), leaving the cell (nothing), or the
//! threshold elapsing (a long press). Once the long press has fired, the
//! matching release finds no handle and is ignored.

use std::time::{Duration, Instant};

use crate::catalog::WidgetType;

pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPress {
    cell: (u16, u16),
    target: Option<WidgetType>,
    started: Instant,
}

/// Press released before the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap {
    pub cell: (u16, u16),
    pub target: Option<WidgetType>,
}

/// Press held on a widget past the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPress {
    pub cell: (u16, u16),
    pub target: WidgetType,
    pub held: Duration,
}

#[derive(Debug, Clone)]
pub struct PressTracker {
    threshold: Duration,
    pending: Option<PendingPress>,
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS)
    }
}

impl PressTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pending: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a press on `cell`. Only presses with a `target` can turn into a
    /// long press. Any earlier pending press is dropped.
    pub fn press_down(&mut self, cell: (u16, u16), target: Option<WidgetType>, now: Instant) {
        self.pending = Some(PendingPress {
            cell,
            target,
            started: now,
        });
    }

    /// Fire the long press if the threshold has elapsed, clearing the handle.
    pub fn poll(&mut self, now: Instant) -> Option<LongPress> {
        let pending = self.pending?;
        let target = pending.target?;
        let held = now.saturating_duration_since(pending.started);
        if held < self.threshold {
            return None;
        }
        self.pending = None;
        Some(LongPress {
            cell: pending.cell,
            target,
            held,
        })
    }

    /// Finish the press. Returns a tap only if the handle was still armed.
    pub fn release(&mut self) -> Option<Tap> {
        self.pending.take().map(|p| Tap {
            cell: p.cell,
            target: p.target,
        })
    }

    /// Pointer left the cell or the gesture was aborted.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
