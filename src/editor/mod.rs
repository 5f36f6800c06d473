//! Interactive layout editing.
//!
//! [`EditController`] owns the working layout for the duration of an edit
//! session and hands finished layouts back as [`LayoutCommand`]s. Long-press
//! detection for entering move mode lives in [`press`].

mod core;
pub mod press;

pub use core::{
    CommitResult, DEFAULT_MAX_SPAN, EditController, EditorState, LayoutCommand, RejectReason,
    Selection, SelectionMode,
};
pub use press::{DEFAULT_LONG_PRESS, LongPress, PressTracker, Tap};
