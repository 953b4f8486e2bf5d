//! `BlackVolTermStructure`: Black-volatility term structures
//! (translates `ql/termstructures/volatility/equityfx/blackvoltermstructure.hpp`
//! and `blackconstantvol.hpp`).
//!
//! Provides the `BlackVolTermStructure` trait and `BlackConstantVol`, a flat
//! surface whose level is read from a quote handle.

use crate::term_structure::{ReferenceDate, TermStructure, TermStructureCore};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::errors::Result;
use ql_core::handle::Handle;
use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use ql_core::{Real, Time, Volatility};
use ql_quotes::{handle_value, Quote, SimpleQuote};
use ql_time::{Calendar, Date, DayCounter, NullCalendar};
use std::fmt;
use std::rc::{Rc, Weak};

/// A Black-volatility term structure.
///
/// Implementors provide [`black_vol_impl`](Self::black_vol_impl); the
/// variance `σ²·t` is derived from it unless overridden.
///
/// Corresponds to `QuantLib::BlackVolTermStructure`.
pub trait BlackVolTermStructure: VolatilityTermStructure {
    /// Black volatility at time `t` and `strike`; no range checks.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Result<Volatility>;

    /// Black variance at time `t` and `strike`; no range checks.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Result<Real> {
        let vol = self.black_vol_impl(t, strike)?;
        Ok(vol * vol * t)
    }

    /// Black volatility for an option date and strike.
    fn black_vol(&self, date: Date, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range(date, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_vol_impl(self.time_from_reference(date)?, strike)
    }

    /// Black variance for an option date and strike.
    fn black_variance(&self, date: Date, strike: Real, extrapolate: bool) -> Result<Real> {
        self.check_range(date, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_variance_impl(self.time_from_reference(date)?, strike)
    }

    /// Black volatility for a time and strike.
    fn black_vol_time(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range_time(t, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_vol_impl(t, strike)
    }

    /// Black variance for a time and strike.
    fn black_variance_time(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Real> {
        self.check_range_time(t, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_variance_impl(t, strike)
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// A flat Black volatility surface: `σ(t, K) = σ` for every expiry and strike.
///
/// Corresponds to `QuantLib::BlackConstantVol`.
pub struct BlackConstantVol {
    core: TermStructureCore,
    volatility: Handle<dyn Quote>,
}

impl BlackConstantVol {
    /// Create a surface reading its level from `volatility`.
    pub fn new(
        reference: ReferenceDate,
        calendar: impl Calendar + 'static,
        volatility: Handle<dyn Quote>,
        day_counter: impl DayCounter + 'static,
    ) -> Rc<Self> {
        let surface = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            BlackConstantVol {
                core: TermStructureCore::new(
                    this,
                    reference,
                    Rc::new(calendar),
                    Rc::new(day_counter),
                ),
                volatility,
            }
        });
        surface.register_with(surface.volatility.as_observable());
        surface
    }

    /// A surface with a fixed reference date and a constant level.
    pub fn fixed(
        reference_date: Date,
        volatility: Volatility,
        day_counter: impl DayCounter + 'static,
    ) -> Rc<Self> {
        Self::new(
            ReferenceDate::Fixed(reference_date),
            NullCalendar,
            Handle::<dyn Quote>::new(Rc::new(SimpleQuote::new(volatility))),
            day_counter,
        )
    }

    /// The current volatility level.
    pub fn volatility(&self) -> Result<Volatility> {
        handle_value(&self.volatility)
    }
}

impl Observable for BlackConstantVol {
    fn observable(&self) -> &ObservableImpl {
        self.core.observable()
    }
}

impl Observer for BlackConstantVol {
    fn observer(&self) -> &ObserverImpl {
        self.core.observer()
    }

    fn update(&self) -> Result<()> {
        self.core.refresh();
        self.notify_observers()
    }
}

impl TermStructure for BlackConstantVol {
    fn core(&self) -> &TermStructureCore {
        &self.core
    }

    fn max_date(&self) -> Date {
        Date::MAX
    }
}

impl VolatilityTermStructure for BlackConstantVol {
    fn min_strike(&self) -> Real {
        Real::MIN
    }

    fn max_strike(&self) -> Real {
        Real::MAX
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Result<Volatility> {
        self.volatility()
    }
}

impl fmt::Debug for BlackConstantVol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlackConstantVol")
            .field("core", &self.core)
            .field("volatility", &self.volatility)
            .finish()
    }
}
