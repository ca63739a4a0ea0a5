//! Core types for calgrid.
//!
//! This crate holds everything below the calendar UI:
//! - `Event` and the dialog-shaped `EventRecord` it is normalized from
//! - `recurrence` for expanding repeat rules into occurrences
//! - `moves` for drag-and-drop and edit commands
//! - `grid` for placing occurrences into month/week/day cells

pub mod date_range;
pub mod error;
pub mod event;
pub mod form;
pub mod grid;
pub mod moves;
pub mod overrides;
pub mod recurrence;

pub use error::{CalGridError, CalGridResult};
pub use event::*;
pub use form::{EventFile, EventRecord, LoadedEvents, RepeatEndType};
pub use moves::{Command, MoveOutcome, MoveScope, apply_move};
pub use overrides::{Override, OverrideTable};
pub use recurrence::{Occurrence, expand, expand_with_overrides, is_anchor, series_len};
