//! # ql-time
//!
//! Dates, day counters, calendars, and event timing for quantlib-reactive.
//!
//! Calendar arithmetic is delegated to `chrono`; everything else works on
//! serial numbers, as QuantLib does.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Business-day adjustment conventions.
pub mod business_day_convention;

/// Calendar trait and built-in implementations.
pub mod calendar;

/// `Date` type.
pub mod date;

/// `DayCounter` trait and built-in day-count conventions.
pub mod day_counter;

/// Whether a dated event has already happened.
pub mod event;

/// `Date`-typed evaluation-date accessors.
pub mod settings;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use business_day_convention::BusinessDayConvention;
pub use calendar::{Calendar, NullCalendar, WeekendsOnly};
pub use date::Date;
pub use day_counter::{Actual360, Actual36525, Actual365Fixed, DayCounter};
pub use event::has_occurred;
pub use settings::EvaluationDate;
