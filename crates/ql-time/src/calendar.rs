//! `Calendar` trait and the two calendars the core needs.
//!
//! A calendar knows which dates are business days; settlement-offset term
//! structures use it to roll the evaluation date forward.

use crate::business_day_convention::BusinessDayConvention;
use crate::date::Date;
use chrono::Weekday;
use ql_core::errors::Result;

/// A financial calendar.
///
/// Corresponds to `QuantLib::Calendar`.
pub trait Calendar: std::fmt::Debug {
    /// Human-readable name (e.g. `"Weekends Only"`).
    fn name(&self) -> &str;

    /// Return `true` if `date` is a business day in this calendar.
    fn is_business_day(&self, date: Date) -> bool;

    /// Return `true` if `date` is not a business day.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Return `true` if `date` falls on a weekend for this calendar.
    fn is_weekend(&self, date: Date) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Adjust `date` according to `convention`.
    ///
    /// Fails only if the adjustment walks out of the valid date range.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Result<Date> {
        let roll = |mut d: Date, step: i32| -> Result<Date> {
            while self.is_holiday(d) {
                d = d.add_days(step)?;
            }
            Ok(d)
        };
        match convention {
            BusinessDayConvention::Unadjusted => Ok(date),
            BusinessDayConvention::Following => roll(date, 1),
            BusinessDayConvention::Preceding => roll(date, -1),
            BusinessDayConvention::ModifiedFollowing => {
                let d = roll(date, 1)?;
                if d.month() == date.month() {
                    Ok(d)
                } else {
                    roll(date, -1)
                }
            }
            BusinessDayConvention::ModifiedPreceding => {
                let d = roll(date, -1)?;
                if d.month() == date.month() {
                    Ok(d)
                } else {
                    roll(date, 1)
                }
            }
        }
    }

    /// Advance `date` by `n` business days.
    ///
    /// With `n == 0` the date is adjusted to the following business day.
    fn advance_business_days(&self, date: Date, n: i32) -> Result<Date> {
        if n == 0 {
            return self.adjust(date, BusinessDayConvention::Following);
        }
        let step = n.signum();
        let mut remaining = n.abs();
        let mut d = date;
        while remaining > 0 {
            d = d.add_days(step)?;
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        Ok(d)
    }

    /// Business days in `(from, to]`, negative if `to < from`.
    fn business_days_between(&self, from: Date, to: Date) -> i32 {
        let (start, end, sign) = if to >= from { (from, to, 1) } else { (to, from, -1) };
        let count = (start.serial() + 1..=end.serial())
            .filter_map(|s| Date::from_serial(s).ok())
            .filter(|d| self.is_business_day(*d))
            .count();
        sign * count as i32
    }
}

/// Every day is a business day.
///
/// Equivalent to `QuantLib::NullCalendar`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCalendar;

impl Calendar for NullCalendar {
    fn name(&self) -> &str {
        "Null"
    }

    fn is_business_day(&self, _date: Date) -> bool {
        true
    }

    fn is_weekend(&self, _date: Date) -> bool {
        false
    }
}

/// Saturdays and Sundays are holidays; nothing else is.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendsOnly;

impl Calendar for WeekendsOnly {
    fn name(&self) -> &str {
        "Weekends Only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !self.is_weekend(date)
    }
}
