//! Generalized Black-Scholes process
//! (translates `ql/processes/blackscholesprocess.hpp`).
//!
//! `d ln S = (r(t) − q(t) − σ(t, S)²/2) dt + σ(t, S) dW`
//!
//! where `r` is the risk-free rate, `q` the continuous dividend yield and
//! `σ` either a Black volatility or, when one is supplied, a local
//! volatility.  All four inputs are read through handles; the process
//! observes each of them and re-notifies its own observers (typically
//! pricing engines) whenever any input or handle link changes.

use crate::stochastic_process::StochasticProcess1D;
use ql_core::errors::Result;
use ql_core::handle::Handle;
use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use ql_core::{Rate, Real, Time, Volatility};
use ql_quotes::{handle_value, Quote};
use ql_termstructures::{
    BlackVolTermStructure, FlatForward, LocalVolTermStructure, YieldTermStructure,
};
use ql_time::{Date, DayCounter};
use std::fmt;
use std::rc::{Rc, Weak};

/// A generalized Black-Scholes stochastic process.
///
/// Corresponds to `QuantLib::GeneralizedBlackScholesProcess`.
pub struct GeneralizedBlackScholesProcess {
    x0: Handle<dyn Quote>,
    dividend_yield: Handle<dyn YieldTermStructure>,
    risk_free_rate: Handle<dyn YieldTermStructure>,
    black_vol: Handle<dyn BlackVolTermStructure>,
    local_vol: Option<Handle<dyn LocalVolTermStructure>>,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl GeneralizedBlackScholesProcess {
    /// Create a process driven by a Black volatility surface.
    pub fn new(
        x0: Handle<dyn Quote>,
        dividend_yield: Handle<dyn YieldTermStructure>,
        risk_free_rate: Handle<dyn YieldTermStructure>,
        black_vol: Handle<dyn BlackVolTermStructure>,
    ) -> Rc<Self> {
        Self::build(x0, dividend_yield, risk_free_rate, black_vol, None)
    }

    /// Create a process whose diffusion comes from `local_vol`; the Black
    /// surface is still exposed for analytic engines.
    pub fn with_local_vol(
        x0: Handle<dyn Quote>,
        dividend_yield: Handle<dyn YieldTermStructure>,
        risk_free_rate: Handle<dyn YieldTermStructure>,
        black_vol: Handle<dyn BlackVolTermStructure>,
        local_vol: Handle<dyn LocalVolTermStructure>,
    ) -> Rc<Self> {
        Self::build(x0, dividend_yield, risk_free_rate, black_vol, Some(local_vol))
    }

    fn build(
        x0: Handle<dyn Quote>,
        dividend_yield: Handle<dyn YieldTermStructure>,
        risk_free_rate: Handle<dyn YieldTermStructure>,
        black_vol: Handle<dyn BlackVolTermStructure>,
        local_vol: Option<Handle<dyn LocalVolTermStructure>>,
    ) -> Rc<Self> {
        let process = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            GeneralizedBlackScholesProcess {
                x0,
                dividend_yield,
                risk_free_rate,
                black_vol,
                local_vol,
                observable: ObservableImpl::new(),
                observer: ObserverImpl::new(this),
            }
        });
        process.register_with(process.x0.as_observable());
        process.register_with(process.dividend_yield.as_observable());
        process.register_with(process.risk_free_rate.as_observable());
        process.register_with(process.black_vol.as_observable());
        if let Some(local_vol) = &process.local_vol {
            process.register_with(local_vol.as_observable());
        }
        process
    }

    /// The spot quote handle.
    pub fn state_variable(&self) -> &Handle<dyn Quote> {
        &self.x0
    }

    /// The dividend-yield curve handle.
    pub fn dividend_yield(&self) -> &Handle<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// The risk-free curve handle.
    pub fn risk_free_rate(&self) -> &Handle<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// The Black volatility handle.
    pub fn black_volatility(&self) -> &Handle<dyn BlackVolTermStructure> {
        &self.black_vol
    }

    /// The local volatility handle, if the process was built with one.
    pub fn local_volatility(&self) -> Option<&Handle<dyn LocalVolTermStructure>> {
        self.local_vol.as_ref()
    }

    fn volatility(&self, t: Time, x: Real) -> Result<Volatility> {
        match &self.local_vol {
            Some(local_vol) => local_vol.current_link()?.local_vol_time(t, x, true),
            None => self.black_vol.current_link()?.black_vol_time(t, x, true),
        }
    }

    fn instantaneous_forward(curve: &Handle<dyn YieldTermStructure>, t: Time) -> Result<Rate> {
        curve.current_link()?.forward_rate_time(t, t, true)
    }
}

impl Observable for GeneralizedBlackScholesProcess {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for GeneralizedBlackScholesProcess {
    fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl StochasticProcess1D for GeneralizedBlackScholesProcess {
    fn x0(&self) -> Result<Real> {
        handle_value(&self.x0)
    }

    fn drift(&self, t: Time, x: Real) -> Result<Real> {
        let sigma = self.volatility(t, x)?;
        let r = Self::instantaneous_forward(&self.risk_free_rate, t)?;
        let q = Self::instantaneous_forward(&self.dividend_yield, t)?;
        Ok(r - q - 0.5 * sigma * sigma)
    }

    fn diffusion(&self, t: Time, x: Real) -> Result<Real> {
        self.volatility(t, x)
    }

    fn time(&self, date: Date) -> Result<Time> {
        self.risk_free_rate.current_link()?.time_from_reference(date)
    }

    /// The drift acts on `ln S`, so the expectation is `x·exp(μ·Δt)`.
    fn expectation(&self, t: Time, x: Real, dt: Time) -> Result<Real> {
        Ok(x * (self.drift(t, x)? * dt).exp())
    }

    fn evolve(&self, t: Time, x: Real, dt: Time, dw: Real) -> Result<Real> {
        let log_step = self.drift(t, x)? * dt + self.std_deviation(t, x, dt)? * dw;
        Ok(x * log_step.exp())
    }
}

impl fmt::Debug for GeneralizedBlackScholesProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralizedBlackScholesProcess")
            .field("x0", &self.x0)
            .field("dividend_yield", &self.dividend_yield)
            .field("risk_free_rate", &self.risk_free_rate)
            .field("black_vol", &self.black_vol)
            .field("local_vol", &self.local_vol)
            .finish()
    }
}

/// Black-Scholes process with no dividends: the dividend curve is a flat
/// zero-rate curve sharing the risk-free curve's reference date.
pub fn black_scholes_process(
    x0: Handle<dyn Quote>,
    risk_free_rate: Handle<dyn YieldTermStructure>,
    black_vol: Handle<dyn BlackVolTermStructure>,
    day_counter: impl DayCounter + 'static,
) -> Result<Rc<GeneralizedBlackScholesProcess>> {
    let reference = risk_free_rate.current_link()?.reference_date()?;
    let no_dividends: Rc<dyn YieldTermStructure> = FlatForward::fixed(reference, 0.0, day_counter);
    Ok(GeneralizedBlackScholesProcess::new(
        x0,
        Handle::new(no_dividends),
        risk_free_rate,
        black_vol,
    ))
}

/// Black-Scholes-Merton process with a continuous dividend yield.
pub fn black_scholes_merton_process(
    x0: Handle<dyn Quote>,
    dividend_yield: Handle<dyn YieldTermStructure>,
    risk_free_rate: Handle<dyn YieldTermStructure>,
    black_vol: Handle<dyn BlackVolTermStructure>,
) -> Rc<GeneralizedBlackScholesProcess> {
    GeneralizedBlackScholesProcess::new(x0, dividend_yield, risk_free_rate, black_vol)
}
