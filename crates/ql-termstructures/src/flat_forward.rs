//! `FlatForward`: a yield term structure with a constant forward rate
//! (translates `ql/termstructures/yield/flatforward.hpp`).
//!
//! The rate is read from a quote handle, so the curve moves whenever the
//! quote (or the handle's link) changes.  The rate is continuously
//! compounded: `P(t) = exp(-r·t)`.

use crate::term_structure::{ReferenceDate, TermStructure, TermStructureCore};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::errors::Result;
use ql_core::handle::Handle;
use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use ql_core::{DiscountFactor, Rate, Time};
use ql_quotes::{handle_value, Quote, SimpleQuote};
use ql_time::{Calendar, Date, DayCounter, NullCalendar};
use std::fmt;
use std::rc::{Rc, Weak};

/// A flat (constant) forward-rate yield curve.
///
/// Corresponds to `QuantLib::FlatForward`.
pub struct FlatForward {
    core: TermStructureCore,
    forward: Handle<dyn Quote>,
}

impl FlatForward {
    /// Create a curve on `forward`, observing both the quote and, for moving
    /// reference dates, the evaluation date.
    pub fn new(
        reference: ReferenceDate,
        calendar: impl Calendar + 'static,
        forward: Handle<dyn Quote>,
        day_counter: impl DayCounter + 'static,
    ) -> Rc<Self> {
        let curve = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            FlatForward {
                core: TermStructureCore::new(
                    this,
                    reference,
                    Rc::new(calendar),
                    Rc::new(day_counter),
                ),
                forward,
            }
        });
        curve.register_with(curve.forward.as_observable());
        curve
    }

    /// A curve with a fixed reference date and a constant rate.
    pub fn fixed(
        reference_date: Date,
        rate: Rate,
        day_counter: impl DayCounter + 'static,
    ) -> Rc<Self> {
        Self::new(
            ReferenceDate::Fixed(reference_date),
            NullCalendar,
            Handle::<dyn Quote>::new(Rc::new(SimpleQuote::new(rate))),
            day_counter,
        )
    }

    /// A curve whose reference date is always the evaluation date.
    pub fn moving(forward: Handle<dyn Quote>, day_counter: impl DayCounter + 'static) -> Rc<Self> {
        Self::new(
            ReferenceDate::FollowEvaluationDate,
            NullCalendar,
            forward,
            day_counter,
        )
    }

    /// The current continuously-compounded rate.
    pub fn rate(&self) -> Result<Rate> {
        handle_value(&self.forward)
    }
}

impl Observable for FlatForward {
    fn observable(&self) -> &ObservableImpl {
        self.core.observable()
    }
}

impl Observer for FlatForward {
    fn observer(&self) -> &ObserverImpl {
        self.core.observer()
    }

    fn update(&self) -> Result<()> {
        self.core.refresh();
        self.notify_observers()
    }
}

impl TermStructure for FlatForward {
    fn core(&self) -> &TermStructureCore {
        &self.core
    }

    fn max_date(&self) -> Date {
        Date::MAX
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        Ok((-self.rate()? * t).exp())
    }
}

impl fmt::Debug for FlatForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatForward")
            .field("core", &self.core)
            .field("forward", &self.forward)
            .finish()
    }
}
