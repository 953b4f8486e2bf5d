//! `Date` type (translates `ql/time/date.hpp`).
//!
//! Dates are serial numbers of days, with calendar conversions delegated to
//! `chrono::NaiveDate`.
//!
//! # Serial number convention
//! * Serial 0 (1899-12-30) is the epoch, so serial numbers agree with the
//!   spreadsheet convention for every valid date.
//! * The valid date range is 1901-01-01 (serial 367) to 2199-12-31
//!   (serial 109 574).

use chrono::{Datelike, Local, Months, NaiveDate, Weekday};
use ql_core::ensure;
use ql_core::errors::{Error, Result};
use std::fmt;

/// `NaiveDate::num_days_from_ce` of 1899-12-30.
const EPOCH_DAYS_FROM_CE: i32 = 693_594;

/// A calendar date represented as a serial number.
///
/// Corresponds to `QuantLib::Date`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct Date(i32);

impl Date {
    /// Minimum valid date: January 1, 1901.
    pub const MIN: Date = Date(367);

    /// Maximum valid date: December 31, 2199.
    pub const MAX: Date = Date(109_574);

    // ── Constructors ─────────────────────────────────────────────────────────

    /// Create a date from a serial number.
    pub fn from_serial(serial: i32) -> Result<Self> {
        let d = Date(serial);
        ensure!(
            (Self::MIN..=Self::MAX).contains(&d),
            Error::Date(format!(
                "serial {serial} outside [{}, {}]",
                Self::MIN.0,
                Self::MAX.0
            ))
        );
        Ok(d)
    }

    /// Create a date from year, month (1–12), and day-of-month (1–31).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        let naive = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            Error::Date(format!("{year}-{month:02}-{day:02} is not a valid date"))
        })?;
        Self::from_naive(naive)
    }

    /// Create a date from a `chrono` date.
    pub fn from_naive(date: NaiveDate) -> Result<Self> {
        Self::from_serial(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
    }

    /// Today's date according to the local system clock.
    pub fn today() -> Self {
        let serial = Local::now().date_naive().num_days_from_ce() - EPOCH_DAYS_FROM_CE;
        Date(serial.clamp(Self::MIN.0, Self::MAX.0))
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Return the serial number.
    pub fn serial(&self) -> i32 {
        self.0
    }

    /// The same date as a `chrono::NaiveDate`.
    pub fn to_naive(&self) -> NaiveDate {
        // every serial in [MIN, MAX] maps to a representable NaiveDate
        NaiveDate::from_num_days_from_ce_opt(self.0 + EPOCH_DAYS_FROM_CE).unwrap_or(NaiveDate::MIN)
    }

    /// Return the year.
    pub fn year(&self) -> i32 {
        self.to_naive().year()
    }

    /// Return the month (1–12).
    pub fn month(&self) -> u32 {
        self.to_naive().month()
    }

    /// Return the day of the month (1–31).
    pub fn day_of_month(&self) -> u32 {
        self.to_naive().day()
    }

    /// Return the weekday.
    pub fn weekday(&self) -> Weekday {
        self.to_naive().weekday()
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    /// Advance by `n` calendar days.
    pub fn add_days(self, n: i32) -> Result<Self> {
        Self::from_serial(self.0 + n)
            .map_err(|_| Error::Date(format!("{self} + {n} days is out of range")))
    }

    /// Advance by `n` months, clamping to the end of the target month.
    pub fn add_months(self, n: i32) -> Result<Self> {
        let naive = self.to_naive();
        let shifted = if n >= 0 {
            naive.checked_add_months(Months::new(n.unsigned_abs()))
        } else {
            naive.checked_sub_months(Months::new(n.unsigned_abs()))
        };
        let shifted =
            shifted.ok_or_else(|| Error::Date(format!("{self} + {n} months is out of range")))?;
        Self::from_naive(shifted)
    }

    /// Advance by `n` years (February 29 maps to February 28).
    pub fn add_years(self, n: i32) -> Result<Self> {
        self.add_months(n * 12)
    }

    /// Number of calendar days from `self` to `other` (positive if `other`
    /// is later).
    pub fn days_between(self, other: Date) -> i32 {
        other.0 - self.0
    }
}

impl std::ops::Sub<Date> for Date {
    type Output = i32;
    fn sub(self, rhs: Date) -> i32 {
        self.0 - rhs.0
    }
}

impl TryFrom<i32> for Date {
    type Error = Error;

    fn try_from(serial: i32) -> Result<Self> {
        Self::from_serial(serial)
    }
}

impl From<Date> for i32 {
    fn from(date: Date) -> i32 {
        date.0
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_naive().format("%B %-d, %Y"))
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({})", self.to_naive().format("%Y-%m-%d"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
