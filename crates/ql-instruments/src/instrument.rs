//! `Instrument` base trait.
//!
//! Translates `ql/instrument.hpp` and `ql/pricingengine.hpp`.
//!
//! An instrument is a [`LazyObject`] whose cached value is a
//! [`PricingResults`] record.  The calculation is delegated to a
//! [`PricingEngine`]:
//!
//! 1. fail with [`Error::NoEngine`] if none is set;
//! 2. build a fresh arguments record ([`Instrument::setup_arguments`]);
//! 3. let the arguments validate themselves;
//! 4. have the engine produce a fresh results record;
//! 5. hand it to [`Instrument::fetch_results`] before it is cached.
//!
//! Accessors trigger the calculation; an expired instrument reports zero
//! values without consulting its engine.

use ql_core::errors::{Error, Result};
use ql_core::fail;
use ql_core::patterns::lazy_object::{LazyObject, LazyState};
use ql_core::patterns::observable::{
    AsObservable, Observable, ObservableImpl, Observer, ObserverImpl,
};
use ql_core::Real;
use ql_time::Date;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Sensitivities an engine may report alongside the NPV.
///
/// Every field is optional: engines fill in what they compute.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Greeks {
    /// ∂V/∂S.
    pub delta: Option<Real>,
    /// ∂²V/∂S².
    pub gamma: Option<Real>,
    /// ∂V/∂t, per year.
    pub theta: Option<Real>,
    /// ∂V/∂σ.
    pub vega: Option<Real>,
    /// ∂V/∂r.
    pub rho: Option<Real>,
    /// ∂V/∂q.
    pub dividend_rho: Option<Real>,
    /// Probability of finishing in the money, under the cash measure.
    pub itm_cash_probability: Option<Real>,
    /// ∂V/∂K.
    pub strike_sensitivity: Option<Real>,
}

impl Greeks {
    /// All sensitivities set to zero, as reported for expired instruments.
    pub fn zero() -> Self {
        Self {
            delta: Some(0.0),
            gamma: Some(0.0),
            theta: Some(0.0),
            vega: Some(0.0),
            rho: Some(0.0),
            dividend_rho: Some(0.0),
            itm_cash_probability: Some(0.0),
            strike_sensitivity: Some(0.0),
        }
    }
}

/// The results record produced by a pricing engine.
///
/// Corresponds to `QuantLib::Instrument::results`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingResults {
    /// Net present value.
    pub value: Option<Real>,
    /// Error estimate (e.g. from MC simulation).
    pub error_estimate: Option<Real>,
    /// The date the value refers to.
    pub valuation_date: Option<Date>,
    /// Sensitivities.
    pub greeks: Greeks,
    /// Additional named results.
    pub additional_results: BTreeMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            value: Some(npv),
            ..Self::default()
        }
    }

    /// The record reported by an expired instrument.
    pub fn expired() -> Self {
        Self {
            value: Some(0.0),
            error_estimate: Some(0.0),
            greeks: Greeks::zero(),
            ..Self::default()
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }
}

pub(crate) fn provided<T>(value: Option<T>, name: &str) -> Result<T> {
    match value {
        Some(value) => Ok(value),
        None => fail!("{name} not provided"),
    }
}

/// Arguments an instrument hands to its engine.
pub trait PricingArguments: fmt::Debug {
    /// Check the arguments before the engine sees them.
    fn validate(&self) -> Result<()>;
}

/// A pricing engine for instruments described by arguments of type `A`.
///
/// Engines are observables: an instrument subscribes to its engine, and the
/// engine re-notifies whenever the market data it reads changes.
///
/// Corresponds to `QuantLib::PricingEngine` / `GenericEngine`.
pub trait PricingEngine<A: PricingArguments>: Observable + AsObservable + fmt::Debug {
    /// Price the instrument described by `arguments`.
    fn calculate(&self, arguments: &A) -> Result<PricingResults>;
}

/// State shared by every instrument: the lazy-object bookkeeping and the
/// engine slot.
pub struct InstrumentCore<A: PricingArguments + 'static> {
    lazy: LazyState<PricingResults>,
    engine: RefCell<Option<Rc<dyn PricingEngine<A>>>>,
}

impl<A: PricingArguments + 'static> InstrumentCore<A> {
    /// Create the core of the instrument `this` points to; no engine is set.
    pub fn new(this: Weak<dyn Observer>) -> Self {
        Self {
            lazy: LazyState::new(this),
            engine: RefCell::new(None),
        }
    }

    /// The lazy-object bookkeeping.
    pub fn lazy_state(&self) -> &LazyState<PricingResults> {
        &self.lazy
    }

    /// The observable half.
    pub fn observable(&self) -> &ObservableImpl {
        self.lazy.observable()
    }

    /// The observer half.
    pub fn observer(&self) -> &ObserverImpl {
        self.lazy.observer()
    }

    /// The current engine, if any.
    pub fn engine(&self) -> Option<Rc<dyn PricingEngine<A>>> {
        self.engine.borrow().clone()
    }

    fn replace_engine(
        &self,
        engine: Option<Rc<dyn PricingEngine<A>>>,
    ) -> Option<Rc<dyn PricingEngine<A>>> {
        self.engine.replace(engine)
    }
}

impl<A: PricingArguments + 'static> fmt::Debug for InstrumentCore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentCore")
            .field("lazy", &self.lazy)
            .field("engine", &self.engine.borrow())
            .finish()
    }
}

/// Base trait for all financial instruments.
///
/// Implementors embed an [`InstrumentCore`], route
/// [`LazyObject::perform_calculations`] to
/// [`price_with_engine`](Self::price_with_engine) and
/// [`Observer::update`] to [`LazyObject::lazy_update`].
///
/// Corresponds to `QuantLib::Instrument`.
pub trait Instrument: LazyObject<Results = PricingResults> {
    /// The arguments record this instrument hands to its engine.
    type Arguments: PricingArguments + 'static;

    /// The embedded core.
    fn instrument_core(&self) -> &InstrumentCore<Self::Arguments>;

    /// Whether the instrument has no future value.
    fn is_expired(&self) -> Result<bool>;

    /// Fill an arguments record from the instrument's terms.
    fn setup_arguments(&self) -> Result<Self::Arguments> {
        Err(Error::ContractViolation(
            "setup_arguments not implemented for this instrument".into(),
        ))
    }

    /// Post-process the engine's results before they are cached.
    fn fetch_results(&self, results: PricingResults) -> Result<PricingResults> {
        Ok(results)
    }

    /// The calculation hook: run the engine on freshly built arguments.
    fn price_with_engine(&self) -> Result<PricingResults> {
        let engine = self.instrument_core().engine().ok_or(Error::NoEngine)?;
        let arguments = self.setup_arguments()?;
        arguments.validate()?;
        let results = engine.calculate(&arguments)?;
        self.fetch_results(results)
    }

    /// The current engine, if any.
    fn pricing_engine(&self) -> Option<Rc<dyn PricingEngine<Self::Arguments>>> {
        self.instrument_core().engine()
    }

    /// Replace the engine: unsubscribe from the old one, subscribe to the
    /// new one, and notify observers.
    fn set_pricing_engine(
        &self,
        engine: Option<Rc<dyn PricingEngine<Self::Arguments>>>,
    ) -> Result<()> {
        let new_source = engine.clone().map(|e| e.as_observable());
        if let Some(old) = self.instrument_core().replace_engine(engine) {
            self.unregister_with(&*old.as_observable());
        }
        if let Some(source) = new_source {
            self.register_with(source);
        }
        tracing::debug!(
            observable = ?self.observable().id(),
            engine_set = self.instrument_core().engine().is_some(),
            "pricing engine replaced"
        );
        self.invalidate()
    }

    /// The results record, computed if stale.
    fn results(&self) -> Result<Rc<PricingResults>> {
        if self.is_expired()? {
            return Ok(Rc::new(PricingResults::expired()));
        }
        self.calculate()
    }

    /// Net present value.
    fn npv(&self) -> Result<Real> {
        provided(self.results()?.value, "NPV")
    }

    /// Error estimate of the NPV.
    fn error_estimate(&self) -> Result<Real> {
        provided(self.results()?.error_estimate, "error estimate")
    }

    /// The date the NPV refers to.
    fn valuation_date(&self) -> Result<Date> {
        provided(self.results()?.valuation_date, "valuation date")
    }

    /// All sensitivities reported by the engine.
    fn greeks(&self) -> Result<Greeks> {
        Ok(self.results()?.greeks.clone())
    }

    /// A named additional result.
    fn additional_result(&self, name: &str) -> Result<Real> {
        provided(self.results()?.additional_results.get(name).copied(), name)
    }

    /// All named additional results.
    fn additional_results(&self) -> Result<BTreeMap<String, Real>> {
        Ok(self.results()?.additional_results.clone())
    }
}
