//! `VolatilityTermStructure`: base trait for volatility term structures
//! (translates `ql/termstructures/voltermstructure.hpp`).
//!
//! Extends `TermStructure` with a business-day convention for option dates
//! and the strike range over which the structure is defined.

use crate::term_structure::TermStructure;
use ql_core::ensure;
use ql_core::errors::{Error, Result};
use ql_core::Real;
use ql_time::BusinessDayConvention;

/// Base trait for all volatility term structures.
///
/// Corresponds to `QuantLib::VolatilityTermStructure`.
pub trait VolatilityTermStructure: TermStructure {
    /// The business-day convention used for option-expiry adjustments.
    fn business_day_convention(&self) -> BusinessDayConvention {
        BusinessDayConvention::Following
    }

    /// The minimum strike for which the term structure is defined.
    fn min_strike(&self) -> Real;

    /// The maximum strike for which the term structure is defined.
    fn max_strike(&self) -> Real;

    /// Check that `strike` lies in the covered range, unless extrapolating.
    fn check_strike(&self, strike: Real, extrapolate: bool) -> Result<()> {
        if extrapolate || self.allows_extrapolation() {
            return Ok(());
        }
        let (lo, hi) = (self.min_strike(), self.max_strike());
        ensure!(
            (lo..=hi).contains(&strike),
            Error::OutOfRange(format!(
                "strike ({strike}) is outside the curve domain [{lo}, {hi}]"
            ))
        );
        Ok(())
    }
}
