//! `Date`-typed access to the evaluation date held by [`Settings`].
//!
//! `ql-core` stores the evaluation date as a serial number so that it does
//! not depend on this crate; the [`EvaluationDate`] extension trait puts the
//! `Date` API back on top.

use crate::date::Date;
use ql_core::errors::Result;
use ql_core::settings::Settings;

/// `Date` accessors for the evaluation date.
pub trait EvaluationDate {
    /// The evaluation date; today's date if none was set.
    fn evaluation_date(&self) -> Date;

    /// Set the evaluation date, notifying its observers if it changes.
    fn set_evaluation_date(&self, date: Date) -> Result<()>;

    /// Pin an unset evaluation date to today, so that it no longer follows
    /// the system clock across midnight.
    fn anchor_evaluation_date(&self) -> Result<()>;
}

impl EvaluationDate for Settings {
    fn evaluation_date(&self) -> Date {
        self.evaluation_date_serial()
            .and_then(|serial| Date::from_serial(serial).ok())
            .unwrap_or_else(Date::today)
    }

    fn set_evaluation_date(&self, date: Date) -> Result<()> {
        self.set_evaluation_date_serial(Some(date.serial()))
    }

    fn anchor_evaluation_date(&self) -> Result<()> {
        if self.evaluation_date_serial().is_none() {
            self.set_evaluation_date(Date::today())?;
        }
        Ok(())
    }
}
