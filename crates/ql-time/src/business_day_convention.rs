//! Business-day convention (translates `ql/time/businessdayconvention.hpp`).

use std::fmt;

/// How to adjust a date that falls on a non-business day.
///
/// Corresponds to `QuantLib::BusinessDayConvention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessDayConvention {
    /// First business day after the holiday.
    Following,
    /// Following, unless that crosses into the next month; then preceding.
    ModifiedFollowing,
    /// First business day before the holiday.
    Preceding,
    /// Preceding, unless that crosses into the previous month; then following.
    ModifiedPreceding,
    /// Keep the date as is.
    Unadjusted,
}

impl fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Following => "Following",
            Self::ModifiedFollowing => "Modified Following",
            Self::Preceding => "Preceding",
            Self::ModifiedPreceding => "Modified Preceding",
            Self::Unadjusted => "Unadjusted",
        })
    }
}
