//! `LocalVolTermStructure`: local-volatility term structures
//! (translates `ql/termstructures/volatility/equityfx/localvoltermstructure.hpp`
//! and `localconstantvol.hpp`).

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

/// A local-volatility term structure: `σ_local(t, S)`.
///
/// Corresponds to `QuantLib::LocalVolTermStructure`.
pub trait LocalVolTermStructure: VolatilityTermStructure {
    /// Local volatility at time `t` and underlying level; no range checks.
    fn local_vol_impl(&self, t: Time, underlying: Real) -> Result<Volatility>;

    /// Local volatility for a date and underlying level.
    fn local_vol(&self, date: Date, underlying: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range(date, extrapolate)?;
        self.check_strike(underlying, extrapolate)?;
        self.local_vol_impl(self.time_from_reference(date)?, underlying)
    }

    /// Local volatility for a time and underlying level.
    fn local_vol_time(&self, t: Time, underlying: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range_time(t, extrapolate)?;
        self.check_strike(underlying, extrapolate)?;
        self.local_vol_impl(t, underlying)
    }
}

// ── LocalConstantVol ──────────────────────────────────────────────────────────

/// A flat local-volatility surface.
///
/// Corresponds to `QuantLib::LocalConstantVol`.
pub struct LocalConstantVol {
    core: TermStructureCore,
    volatility: Handle<dyn Quote>,
}

impl LocalConstantVol {
    /// Create a surface reading its level from `volatility`.
    pub fn new(
        reference: ReferenceDate,
        volatility: Handle<dyn Quote>,
        day_counter: impl DayCounter + 'static,
    ) -> Rc<Self> {
        let surface = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            let calendar: Rc<dyn Calendar> = Rc::new(NullCalendar);
            LocalConstantVol {
                core: TermStructureCore::new(this, reference, calendar, Rc::new(day_counter)),
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
            Handle::<dyn Quote>::new(Rc::new(SimpleQuote::new(volatility))),
            day_counter,
        )
    }
}

impl Observable for LocalConstantVol {
    fn observable(&self) -> &ObservableImpl {
        self.core.observable()
    }
}

impl Observer for LocalConstantVol {
    fn observer(&self) -> &ObserverImpl {
        self.core.observer()
    }

    fn update(&self) -> Result<()> {
        self.core.refresh();
        self.notify_observers()
    }
}

impl TermStructure for LocalConstantVol {
    fn core(&self) -> &TermStructureCore {
        &self.core
    }

    fn max_date(&self) -> Date {
        Date::MAX
    }
}

impl VolatilityTermStructure for LocalConstantVol {
    fn min_strike(&self) -> Real {
        Real::MIN
    }

    fn max_strike(&self) -> Real {
        Real::MAX
    }
}

impl LocalVolTermStructure for LocalConstantVol {
    fn local_vol_impl(&self, _t: Time, _underlying: Real) -> Result<Volatility> {
        handle_value(&self.volatility)
    }
}

impl fmt::Debug for LocalConstantVol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalConstantVol")
            .field("core", &self.core)
            .field("volatility", &self.volatility)
            .finish()
    }
}
