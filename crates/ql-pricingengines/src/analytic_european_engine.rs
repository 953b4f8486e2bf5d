//! Analytic European option engine (Black-Scholes-Merton).
//!
//! Translates `ql/pricingengines/vanilla/analyticeuropeanengine.hpp` and the
//! parts of `ql/pricingengines/blackcalculator.hpp` it relies on.
//!
//! The engine observes its process, so any change of spot, curves or
//! volatility reaches every option priced by it.

use ql_core::errors::{Error, Result};
use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use ql_core::{ensure, ensure_post, DiscountFactor, Real, Time};
use ql_instruments::{
    ExerciseType, Greeks, OptionType, PricingEngine, PricingResults, StrikedPayoff,
    VanillaOptionArguments,
};
use ql_math::distributions::{normal_cdf, normal_pdf};
use ql_processes::{GeneralizedBlackScholesProcess, StochasticProcess1D};
use std::fmt;
use std::rc::{Rc, Weak};

/// Black formula for a discounted European payoff on a forward.
///
/// `φ·D·(F·N(φ·d₁) − K·N(φ·d₂))` with `d₁,₂ = ln(F/K)/s ± s/2`, where `s` is
/// the standard deviation of `ln F` to expiry.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: DiscountFactor,
) -> Real {
    BlackCalculator::new(option_type, strike, forward, std_dev, discount).value()
}

/// Black-formula building blocks shared by the price and its Greeks.
#[derive(Debug, Clone, Copy)]
struct BlackCalculator {
    phi: Real,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: DiscountFactor,
    d1: Real,
    d2: Real,
}

impl BlackCalculator {
    fn new(
        option_type: OptionType,
        strike: Real,
        forward: Real,
        std_dev: Real,
        discount: DiscountFactor,
    ) -> Self {
        let (d1, d2) = if std_dev > 0.0 && strike > 0.0 {
            let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
            (d1, d1 - std_dev)
        } else if forward > strike {
            (Real::INFINITY, Real::INFINITY)
        } else {
            (Real::NEG_INFINITY, Real::NEG_INFINITY)
        };
        Self {
            phi: option_type.sign(),
            strike,
            forward,
            std_dev,
            discount,
            d1,
            d2,
        }
    }

    fn n_d1(&self) -> Real {
        normal_cdf(self.phi * self.d1)
    }

    fn n_d2(&self) -> Real {
        normal_cdf(self.phi * self.d2)
    }

    /// Standard normal density at `d₁`; zero when the variance vanishes.
    fn density_d1(&self) -> Real {
        if self.d1.is_finite() {
            normal_pdf(self.d1)
        } else {
            0.0
        }
    }

    fn value(&self) -> Real {
        self.phi * self.discount * (self.forward * self.n_d1() - self.strike * self.n_d2())
    }
}

/// Analytic pricing engine for European vanilla options.
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
///
/// Rates and variance are read from the process's curves and volatility
/// surface at the exercise date, so term structures of any shape are used
/// consistently.
///
/// Corresponds to `QuantLib::AnalyticEuropeanEngine`.
pub struct AnalyticEuropeanEngine {
    process: Rc<GeneralizedBlackScholesProcess>,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl AnalyticEuropeanEngine {
    /// Create the engine and subscribe it to `process`.
    pub fn new(process: Rc<GeneralizedBlackScholesProcess>) -> Rc<Self> {
        let engine = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            AnalyticEuropeanEngine {
                process,
                observable: ObservableImpl::new(),
                observer: ObserverImpl::new(this),
            }
        });
        engine.register_with(engine.process.clone());
        engine
    }

    /// The process the engine reads its market data from.
    pub fn process(&self) -> &Rc<GeneralizedBlackScholesProcess> {
        &self.process
    }
}

impl Observable for AnalyticEuropeanEngine {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for AnalyticEuropeanEngine {
    fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl PricingEngine<VanillaOptionArguments> for AnalyticEuropeanEngine {
    fn calculate(&self, arguments: &VanillaOptionArguments) -> Result<PricingResults> {
        ensure!(
            arguments.exercise.exercise_type() == ExerciseType::European,
            Error::InvalidArgument("not a European option".into())
        );
        let payoff = &arguments.payoff;
        let strike = payoff.strike();
        let expiry = arguments.exercise.last_date();

        let spot = self.process.x0()?;
        ensure!(
            spot > 0.0,
            Error::InvalidArgument(format!("negative or null underlying given ({spot})"))
        );
        let risk_free = self.process.risk_free_rate().current_link()?;
        let dividends = self.process.dividend_yield().current_link()?;
        let volatility = self.process.black_volatility().current_link()?;

        let variance = volatility.black_variance(expiry, strike, false)?;
        let dividend_discount = dividends.discount(expiry)?;
        let risk_free_discount = risk_free.discount(expiry)?;
        let forward = spot * dividend_discount / risk_free_discount;

        let black = BlackCalculator::new(
            payoff.option_type(),
            strike,
            forward,
            variance.sqrt(),
            risk_free_discount,
        );
        tracing::trace!(spot, forward, variance, "analytic european calculation");

        let t_rate: Time = risk_free.time_from_reference(expiry)?;
        let t_dividend: Time = dividends.time_from_reference(expiry)?;
        let t_vol: Time = volatility.time_from_reference(expiry)?;

        let phi = black.phi;
        let density = black.density_d1();
        let delta = phi * dividend_discount * black.n_d1();
        let gamma = if black.std_dev > 0.0 {
            dividend_discount * density / (spot * black.std_dev)
        } else {
            0.0
        };
        let vega = spot * dividend_discount * density * t_vol.sqrt();
        let rho = phi * strike * t_rate * risk_free_discount * black.n_d2();
        let dividend_rho = -phi * spot * t_dividend * dividend_discount * black.n_d1();
        let theta = if t_rate > 0.0 && t_vol > 0.0 {
            let r = -risk_free_discount.ln() / t_rate;
            let q = if t_dividend > 0.0 {
                -dividend_discount.ln() / t_dividend
            } else {
                0.0
            };
            let sigma = black.std_dev / t_vol.sqrt();
            -(spot * dividend_discount * density * sigma) / (2.0 * t_vol.sqrt())
                - phi * r * strike * risk_free_discount * black.n_d2()
                + phi * q * spot * dividend_discount * black.n_d1()
        } else {
            0.0
        };

        let value = black.value();
        ensure_post!(value.is_finite(), "non-finite option value ({value})");

        let mut results = PricingResults::from_npv(value)
            .with_result("spot", spot)
            .with_result("forward", forward)
            .with_result("riskFreeDiscount", risk_free_discount)
            .with_result("dividendDiscount", dividend_discount)
            .with_result("strike", strike)
            .with_result("variance", variance);
        results.valuation_date = Some(risk_free.reference_date()?);
        results.greeks = Greeks {
            delta: Some(delta),
            gamma: Some(gamma),
            theta: Some(theta),
            vega: Some(vega),
            rho: Some(rho),
            dividend_rho: Some(dividend_rho),
            itm_cash_probability: Some(black.n_d2()),
            strike_sensitivity: Some(-phi * risk_free_discount * black.n_d2()),
        };
        Ok(results)
    }
}

impl fmt::Debug for AnalyticEuropeanEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticEuropeanEngine")
            .field("process", &self.process)
            .field("observable", &self.observable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::handle::{Handle, RelinkableHandle};
    use ql_core::patterns::lazy_object::LazyObject;
    use ql_core::settings::{SavedSettings, Settings};
    use ql_instruments::{Exercise, Instrument, OneAssetOption, PlainVanillaPayoff, VanillaOption};
    use ql_quotes::{Quote, SimpleQuote};
    use ql_termstructures::{
        BlackConstantVol, BlackVolTermStructure, FlatForward, YieldTermStructure,
    };
    use ql_time::{Actual365Fixed, Date, DayCounter, EvaluationDate};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    struct Market {
        spot: Rc<SimpleQuote>,
        vol: Rc<SimpleQuote>,
        rates: RelinkableHandle<dyn YieldTermStructure>,
        process: Rc<GeneralizedBlackScholesProcess>,
    }

    fn market(reference: Date, spot: Real, rate: Real, dividend: Real, vol: Real) -> Market {
        let spot = Rc::new(SimpleQuote::new(spot));
        let vol_quote = Rc::new(SimpleQuote::new(vol));
        let rates = RelinkableHandle::<dyn YieldTermStructure>::new(FlatForward::fixed(
            reference,
            rate,
            Actual365Fixed,
        ));
        let dividends =
            Handle::<dyn YieldTermStructure>::new(FlatForward::fixed(reference, dividend, Actual365Fixed));
        let surface = Handle::<dyn BlackVolTermStructure>::new(BlackConstantVol::new(
            ql_termstructures::ReferenceDate::Fixed(reference),
            ql_time::NullCalendar,
            Handle::<dyn Quote>::new(vol_quote.clone()),
            Actual365Fixed,
        ));
        let process = GeneralizedBlackScholesProcess::new(
            Handle::<dyn Quote>::new(spot.clone()),
            dividends,
            rates.handle(),
            surface,
        );
        Market {
            spot,
            vol: vol_quote,
            rates,
            process,
        }
    }

    #[test]
    fn black_formula_put_call_parity() {
        let (f, k, sd, df) = (105.0, 100.0, 0.25, 0.95);
        let call = black_formula(OptionType::Call, k, f, sd, df);
        let put = black_formula(OptionType::Put, k, f, sd, df);
        assert_abs_diff_eq!(call - put, df * (f - k), epsilon = 1e-12);
    }

    #[test]
    fn black_formula_without_variance_is_intrinsic() {
        let call = black_formula(OptionType::Call, 95.0, 100.0, 0.0, 0.9);
        assert_abs_diff_eq!(call, 0.9 * 5.0, epsilon = 1e-12);
        let put = black_formula(OptionType::Put, 95.0, 100.0, 0.0, 0.9);
        assert_abs_diff_eq!(put, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn textbook_call_and_greeks() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, 100.0, 0.05, 0.0, 0.20);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let option = VanillaOption::european(OptionType::Call, 100.0, date(2026, 1, 15));
        option.set_pricing_engine(Some(engine)).unwrap();

        assert_abs_diff_eq!(option.npv().unwrap(), 10.4506, epsilon = 1e-3);
        assert_abs_diff_eq!(option.delta().unwrap(), 0.6368, epsilon = 1e-3);
        assert_abs_diff_eq!(option.gamma().unwrap(), 0.018762, epsilon = 1e-4);
        assert_abs_diff_eq!(option.vega().unwrap(), 37.524, epsilon = 1e-2);
        assert_abs_diff_eq!(option.rho().unwrap(), 53.232, epsilon = 1e-2);
        assert_abs_diff_eq!(option.theta().unwrap(), -6.414, epsilon = 1e-2);
        assert_abs_diff_eq!(option.itm_cash_probability().unwrap(), 0.5596, epsilon = 1e-3);
        assert_eq!(option.valuation_date().unwrap(), today);
        assert_abs_diff_eq!(option.additional_result("forward").unwrap(), 100.0 * 0.05_f64.exp(), epsilon = 1e-9);
    }

    #[test]
    fn put_call_parity_with_dividends() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, 100.0, 0.08, 0.03, 0.25);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let expiry = date(2025, 7, 15);
        let call = VanillaOption::european(OptionType::Call, 105.0, expiry);
        let put = VanillaOption::european(OptionType::Put, 105.0, expiry);
        call.set_pricing_engine(Some(engine.clone())).unwrap();
        put.set_pricing_engine(Some(engine)).unwrap();

        let t = Actual365Fixed.year_fraction(today, expiry);
        let parity = 100.0 * (-0.03 * t).exp() - 105.0 * (-0.08 * t).exp();
        assert_abs_diff_eq!(call.npv().unwrap() - put.npv().unwrap(), parity, epsilon = 1e-10);
    }

    #[test]
    fn market_changes_reprice() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, 100.0, 0.05, 0.0, 0.20);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let option = VanillaOption::european(OptionType::Call, 100.0, date(2026, 1, 15));
        option.set_pricing_engine(Some(engine)).unwrap();

        let base = option.npv().unwrap();
        m.spot.set_value(105.0).unwrap();
        assert!(!option.is_calculated());
        let bumped = option.npv().unwrap();
        assert!(bumped > base);

        m.vol.set_value(0.10).unwrap();
        assert!(option.npv().unwrap() < bumped);

        m.rates
            .link_to(FlatForward::fixed(today, 0.01, Actual365Fixed))
            .unwrap();
        assert!(!option.is_calculated());
        let low_rate = option.npv().unwrap();
        m.rates
            .link_to(FlatForward::fixed(today, 0.05, Actual365Fixed))
            .unwrap();
        assert!(option.npv().unwrap() > low_rate);
    }

    #[test]
    fn american_exercise_is_rejected() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, 100.0, 0.05, 0.0, 0.20);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let option = VanillaOption::with_engine(
            PlainVanillaPayoff::new(OptionType::Put, 100.0),
            Exercise::american(today, date(2026, 1, 15)).unwrap(),
            engine,
        )
        .unwrap();
        assert!(matches!(option.npv(), Err(Error::InvalidArgument(_))));
        assert!(!option.is_calculated());
    }

    #[test]
    fn invalid_spot_is_rejected() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, 100.0, 0.05, 0.0, 0.20);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let option = VanillaOption::european(OptionType::Call, 100.0, date(2026, 1, 15));
        option.set_pricing_engine(Some(engine)).unwrap();

        m.spot.set_value(0.0).unwrap();
        assert!(matches!(option.npv(), Err(Error::InvalidArgument(_))));
        m.spot.reset().unwrap();
        assert_eq!(option.npv().unwrap_err(), Error::NullValue);
        m.spot.set_value(100.0).unwrap();
        assert_abs_diff_eq!(option.npv().unwrap(), 10.4506, epsilon = 1e-3);
    }

    #[test]
    fn non_finite_value_is_a_postcondition_failure() {
        let _saved = SavedSettings::new();
        let today = date(2025, 1, 15);
        Settings::instance().set_evaluation_date(today).unwrap();
        let m = market(today, f64::INFINITY, 0.05, 0.0, 0.20);
        let engine = AnalyticEuropeanEngine::new(m.process.clone());
        let option = VanillaOption::european(OptionType::Call, 100.0, date(2026, 1, 15));
        option.set_pricing_engine(Some(engine)).unwrap();

        assert!(matches!(option.npv(), Err(Error::Postcondition(_))));
        assert!(!option.is_calculated());
    }
}
