//! `YieldTermStructure`: interest-rate term structures
//! (translates `ql/termstructures/yieldtermstructure.hpp`).
//!
//! Concrete curves supply the discount function on their time axis; zero
//! and forward rates (continuously compounded) are derived from it.

use crate::term_structure::TermStructure;
use ql_core::errors::Result;
use ql_core::{DiscountFactor, Rate, Time};
use ql_time::Date;

/// Time step used where an instantaneous rate is approximated.
const DT: Time = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: TermStructure {
    /// Discount factor at time `t`; range checks are done by the callers.
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor>;

    // ── Discount factors ─────────────────────────────────────────────────

    /// Discount factor for a date.
    fn discount(&self, date: Date) -> Result<DiscountFactor> {
        self.check_range(date, false)?;
        self.discount_impl(self.time_from_reference(date)?)
    }

    /// Discount factor for a time, optionally extrapolating.
    fn discount_time(&self, t: Time, extrapolate: bool) -> Result<DiscountFactor> {
        self.check_range_time(t, extrapolate)?;
        self.discount_impl(t)
    }

    // ── Zero rates ───────────────────────────────────────────────────────

    /// Continuously-compounded zero rate to a date.
    fn zero_rate(&self, date: Date) -> Result<Rate> {
        self.check_range(date, false)?;
        self.zero_rate_time(self.time_from_reference(date)?, false)
    }

    /// Continuously-compounded zero rate to time `t`.
    fn zero_rate_time(&self, t: Time, extrapolate: bool) -> Result<Rate> {
        self.check_range_time(t, extrapolate)?;
        let t = if t == 0.0 { DT } else { t };
        Ok(-self.discount_impl(t)?.ln() / t)
    }

    // ── Forward rates ────────────────────────────────────────────────────

    /// Continuously-compounded forward rate between two times; the
    /// instantaneous forward if they coincide.
    fn forward_rate_time(&self, t1: Time, t2: Time, extrapolate: bool) -> Result<Rate> {
        let (t1, t2) = if t2 == t1 {
            ((t1 - DT / 2.0).max(0.0), t1 + DT / 2.0)
        } else {
            (t1, t2)
        };
        self.check_range_time(t1.min(t2), extrapolate)?;
        self.check_range_time(t1.max(t2), extrapolate)?;
        let df1 = self.discount_impl(t1)?;
        let df2 = self.discount_impl(t2)?;
        Ok((df1 / df2).ln() / (t2 - t1))
    }

    /// Continuously-compounded forward rate between two dates.
    fn forward_rate(&self, d1: Date, d2: Date) -> Result<Rate> {
        self.check_range(d1.min(d2), false)?;
        self.check_range(d1.max(d2), false)?;
        let t1 = self.time_from_reference(d1)?;
        let t2 = self.time_from_reference(d2)?;
        self.forward_rate_time(t1, t2, false)
    }
}
