//! `DayCounter` trait and the actual-day conventions (translates
//! `ql/time/daycounter.hpp` and `ql/time/daycounters/actual*.hpp`).
//!
//! A day counter turns a pair of dates into a year fraction; term
//! structures use it to map dates onto their time axis.

use crate::date::Date;
use ql_core::{Real, Time};

/// A convention for counting the fraction of a year between two dates.
///
/// Corresponds to `QuantLib::DayCounter`.
pub trait DayCounter: std::fmt::Debug {
    /// Human-readable name of this convention (e.g. `"Actual/365 (Fixed)"`).
    fn name(&self) -> &str;

    /// Number of days between `d1` and `d2` according to this convention.
    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        i64::from(d2 - d1)
    }

    /// Fraction of a year between `d1` and `d2` (negative if `d2 < d1`).
    fn year_fraction(&self, d1: Date, d2: Date) -> Time;
}

macro_rules! actual_over {
    ($(#[$doc:meta])* $name:ident, $label:literal, $basis:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl DayCounter for $name {
            fn name(&self) -> &str {
                $label
            }

            fn year_fraction(&self, d1: Date, d2: Date) -> Time {
                self.day_count(d1, d2) as Real / $basis
            }
        }
    };
}

actual_over!(
    /// Actual/365 (Fixed): actual days over 365.
    Actual365Fixed,
    "Actual/365 (Fixed)",
    365.0
);

actual_over!(
    /// Actual/360: actual days over 360.
    Actual360,
    "Actual/360",
    360.0
);

actual_over!(
    /// Actual/365.25: actual days over 365.25.
    Actual36525,
    "Actual/365.25",
    365.25
);
