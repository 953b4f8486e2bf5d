//! Options on a single underlying.
//!
//! Translates `ql/instruments/oneassetoption.hpp` and
//! `ql/instruments/vanillaoption.hpp`.

use crate::exercise::Exercise;
use crate::instrument::{
    provided, Instrument, InstrumentCore, PricingArguments, PricingEngine, PricingResults,
};
use crate::payoff::{OptionType, PlainVanillaPayoff, StrikedPayoff};
use ql_core::ensure;
use ql_core::errors::{Error, Result};
use ql_core::patterns::lazy_object::{LazyObject, LazyState};
use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use ql_core::Real;
use ql_time::{has_occurred, Date};
use std::fmt;
use std::rc::{Rc, Weak};

/// Arguments handed to vanilla-option engines.
#[derive(Debug, Clone, PartialEq)]
pub struct VanillaOptionArguments {
    /// The payoff.
    pub payoff: PlainVanillaPayoff,
    /// The exercise specification.
    pub exercise: Exercise,
}

impl PricingArguments for VanillaOptionArguments {
    fn validate(&self) -> Result<()> {
        let strike = self.payoff.strike();
        ensure!(
            strike >= 0.0,
            Error::InvalidArgument(format!("strike ({strike}) must be non-negative"))
        );
        Ok(())
    }
}

/// Sensitivity accessors of options on a single underlying.
///
/// Corresponds to `QuantLib::OneAssetOption`.
pub trait OneAssetOption: Instrument {
    /// ∂V/∂S.
    fn delta(&self) -> Result<Real> {
        provided(self.results()?.greeks.delta, "delta")
    }

    /// ∂²V/∂S².
    fn gamma(&self) -> Result<Real> {
        provided(self.results()?.greeks.gamma, "gamma")
    }

    /// ∂V/∂t, per year.
    fn theta(&self) -> Result<Real> {
        provided(self.results()?.greeks.theta, "theta")
    }

    /// ∂V/∂t, per calendar day.
    fn theta_per_day(&self) -> Result<Real> {
        Ok(self.theta()? / 365.0)
    }

    /// ∂V/∂σ.
    fn vega(&self) -> Result<Real> {
        provided(self.results()?.greeks.vega, "vega")
    }

    /// ∂V/∂r.
    fn rho(&self) -> Result<Real> {
        provided(self.results()?.greeks.rho, "rho")
    }

    /// ∂V/∂q.
    fn dividend_rho(&self) -> Result<Real> {
        provided(self.results()?.greeks.dividend_rho, "dividend rho")
    }

    /// In-the-money probability under the cash measure.
    fn itm_cash_probability(&self) -> Result<Real> {
        provided(
            self.results()?.greeks.itm_cash_probability,
            "in-the-money cash probability",
        )
    }

    /// ∂V/∂K.
    fn strike_sensitivity(&self) -> Result<Real> {
        provided(self.results()?.greeks.strike_sensitivity, "strike sensitivity")
    }
}

/// A plain vanilla option on a single underlying asset.
///
/// Corresponds to `QuantLib::VanillaOption` / `QuantLib::EuropeanOption`.
pub struct VanillaOption {
    core: InstrumentCore<VanillaOptionArguments>,
    payoff: PlainVanillaPayoff,
    exercise: Exercise,
}

impl VanillaOption {
    /// Create a new vanilla option; no engine is set.
    pub fn new(payoff: PlainVanillaPayoff, exercise: Exercise) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| VanillaOption {
            core: InstrumentCore::new(this.clone()),
            payoff,
            exercise,
        })
    }

    /// A European call or put.
    pub fn european(option_type: OptionType, strike: Real, expiry: Date) -> Rc<Self> {
        Self::new(
            PlainVanillaPayoff::new(option_type, strike),
            Exercise::european(expiry),
        )
    }

    /// Create the option and attach `engine`.
    pub fn with_engine(
        payoff: PlainVanillaPayoff,
        exercise: Exercise,
        engine: Rc<dyn PricingEngine<VanillaOptionArguments>>,
    ) -> Result<Rc<Self>> {
        let option = Self::new(payoff, exercise);
        option.set_pricing_engine(Some(engine))?;
        Ok(option)
    }

    /// The strike price.
    pub fn strike(&self) -> Real {
        self.payoff.strike()
    }

    /// The option type (call/put).
    pub fn option_type(&self) -> OptionType {
        self.payoff.option_type()
    }

    /// The payoff.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// The exercise.
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }
}

impl Observable for VanillaOption {
    fn observable(&self) -> &ObservableImpl {
        self.core.observable()
    }
}

impl Observer for VanillaOption {
    fn observer(&self) -> &ObserverImpl {
        self.core.observer()
    }

    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for VanillaOption {
    type Results = PricingResults;

    fn lazy_state(&self) -> &LazyState<PricingResults> {
        self.core.lazy_state()
    }

    fn perform_calculations(&self) -> Result<PricingResults> {
        self.price_with_engine()
    }
}

impl Instrument for VanillaOption {
    type Arguments = VanillaOptionArguments;

    fn instrument_core(&self) -> &InstrumentCore<VanillaOptionArguments> {
        &self.core
    }

    fn is_expired(&self) -> Result<bool> {
        Ok(has_occurred(self.exercise.last_date(), None, None))
    }

    fn setup_arguments(&self) -> Result<VanillaOptionArguments> {
        Ok(VanillaOptionArguments {
            payoff: self.payoff,
            exercise: self.exercise.clone(),
        })
    }
}

impl OneAssetOption for VanillaOption {}

impl fmt::Debug for VanillaOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VanillaOption")
            .field("payoff", &self.payoff)
            .field("exercise", &self.exercise)
            .field("core", &self.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Greeks;
    use ql_core::patterns::observable::AsObservable;
    use ql_core::settings::{SavedSettings, Settings};
    use ql_time::EvaluationDate;
    use std::cell::{Cell, RefCell};

    /// Reports intrinsic value at a fixed spot and records what it was given.
    #[derive(Debug)]
    struct IntrinsicEngine {
        spot: Real,
        seen: RefCell<Option<VanillaOptionArguments>>,
        calls: Cell<u32>,
        observable: ObservableImpl,
    }

    impl IntrinsicEngine {
        fn new(spot: Real) -> Rc<Self> {
            Rc::new(IntrinsicEngine {
                spot,
                seen: RefCell::new(None),
                calls: Cell::new(0),
                observable: ObservableImpl::new(),
            })
        }
    }

    impl Observable for IntrinsicEngine {
        fn observable(&self) -> &ObservableImpl {
            &self.observable
        }
    }

    impl PricingEngine<VanillaOptionArguments> for IntrinsicEngine {
        fn calculate(&self, arguments: &VanillaOptionArguments) -> Result<PricingResults> {
            use crate::payoff::Payoff;
            self.calls.set(self.calls.get() + 1);
            self.seen.replace(Some(arguments.clone()));
            let mut results = PricingResults::from_npv(arguments.payoff.value(self.spot));
            results.greeks = Greeks {
                delta: Some(arguments.payoff.option_type().sign()),
                ..Greeks::default()
            };
            Ok(results)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn arguments_carry_the_terms() {
        let _saved = SavedSettings::new();
        Settings::instance().set_evaluation_date(date(2025, 1, 2)).unwrap();
        let engine = IntrinsicEngine::new(110.0);
        let option = VanillaOption::european(OptionType::Call, 100.0, date(2026, 1, 2));
        option.set_pricing_engine(Some(engine.clone())).unwrap();

        assert_eq!(option.npv().unwrap(), 10.0);
        assert_eq!(option.delta().unwrap(), 1.0);
        let seen = engine.seen.borrow().clone().unwrap();
        assert_eq!(seen.payoff, PlainVanillaPayoff::new(OptionType::Call, 100.0));
        assert_eq!(seen.exercise.last_date(), date(2026, 1, 2));
        assert!(option.is_registered_with(&*engine.as_observable()));
    }

    #[test]
    fn unprovided_greeks_fail() {
        let _saved = SavedSettings::new();
        Settings::instance().set_evaluation_date(date(2025, 1, 2)).unwrap();
        let option = VanillaOption::with_engine(
            PlainVanillaPayoff::new(OptionType::Put, 100.0),
            Exercise::european(date(2026, 1, 2)),
            IntrinsicEngine::new(90.0),
        )
        .unwrap();
        assert_eq!(option.npv().unwrap(), 10.0);
        assert_eq!(option.delta().unwrap(), -1.0);
        assert_eq!(
            option.gamma().unwrap_err(),
            Error::Runtime("gamma not provided".into())
        );
        assert!(option.theta_per_day().is_err());
    }

    #[test]
    fn negative_strike_is_rejected() {
        let _saved = SavedSettings::new();
        Settings::instance().set_evaluation_date(date(2025, 1, 2)).unwrap();
        let engine = IntrinsicEngine::new(100.0);
        let option = VanillaOption::european(OptionType::Call, -5.0, date(2026, 1, 2));
        option.set_pricing_engine(Some(engine.clone())).unwrap();
        assert!(matches!(option.npv(), Err(Error::InvalidArgument(_))));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn expiry_follows_the_evaluation_date() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        let expiry = date(2026, 1, 2);
        let engine = IntrinsicEngine::new(120.0);
        let option = VanillaOption::european(OptionType::Call, 100.0, expiry);
        option.set_pricing_engine(Some(engine.clone())).unwrap();

        settings.set_evaluation_date(date(2025, 1, 2)).unwrap();
        assert!(!option.is_expired().unwrap());
        assert_eq!(option.npv().unwrap(), 20.0);

        settings.set_evaluation_date(expiry).unwrap();
        assert!(option.is_expired().unwrap());
        assert_eq!(option.npv().unwrap(), 0.0);
        assert_eq!(option.vega().unwrap(), 0.0);

        settings.set_include_reference_date_events(true);
        assert!(!option.is_expired().unwrap());
        assert_eq!(engine.calls.get(), 1);
    }
}
