//! Event occurrence (translates the date logic of `ql/event.hpp`).
//!
//! An event is something that happens on a given date: an option expiry, a
//! cash-flow payment.  Whether it has already happened depends on the
//! reference date and, when the two coincide, on a policy flag.

use crate::date::Date;
use crate::settings::EvaluationDate;
use ql_core::settings::Settings;

/// Whether an event on `event_date` has occurred as of `reference`.
///
/// `reference` defaults to the evaluation date.  When the event falls on the
/// reference date, `include_reference_date` decides; `None` defers to
/// [`Settings::include_reference_date_events`].  An event included on its
/// reference date has *not* occurred yet.
pub fn has_occurred(
    event_date: Date,
    reference: Option<Date>,
    include_reference_date: Option<bool>,
) -> bool {
    let settings = Settings::instance();
    let reference = reference.unwrap_or_else(|| settings.evaluation_date());
    let include = include_reference_date.unwrap_or_else(|| settings.include_reference_date_events());
    if include {
        event_date < reference
    } else {
        event_date <= reference
    }
}
