//! # quantlib-reactive
//!
//! The reactive core of [QuantLib](https://www.quantlib.org/): quotes,
//! curves, processes, engines and instruments wired into one observer
//! graph.  Changing a quote, relinking a handle or moving the evaluation
//! date invalidates exactly the results that depend on it; they are
//! recomputed lazily on the next read.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::rc::Rc;
//! use quantlib_reactive::core::{Handle, SavedSettings, Settings};
//! use quantlib_reactive::instruments::{Instrument, OptionType, VanillaOption};
//! use quantlib_reactive::pricingengines::AnalyticEuropeanEngine;
//! use quantlib_reactive::processes::GeneralizedBlackScholesProcess;
//! use quantlib_reactive::quotes::{Quote, SimpleQuote};
//! use quantlib_reactive::termstructures::{
//!     BlackConstantVol, BlackVolTermStructure, FlatForward, YieldTermStructure,
//! };
//! use quantlib_reactive::time::{Actual365Fixed, Date, EvaluationDate};
//!
//! # fn main() -> quantlib_reactive::core::Result<()> {
//! let _saved = SavedSettings::new();
//! let today = Date::from_ymd(2025, 6, 16)?;
//! Settings::instance().set_evaluation_date(today)?;
//!
//! let spot = Rc::new(SimpleQuote::new(100.0));
//! let process = GeneralizedBlackScholesProcess::new(
//!     Handle::<dyn Quote>::new(spot.clone()),
//!     Handle::<dyn YieldTermStructure>::new(FlatForward::fixed(today, 0.0, Actual365Fixed)),
//!     Handle::<dyn YieldTermStructure>::new(FlatForward::fixed(today, 0.05, Actual365Fixed)),
//!     Handle::<dyn BlackVolTermStructure>::new(BlackConstantVol::fixed(today, 0.20, Actual365Fixed)),
//! );
//! let option = VanillaOption::european(OptionType::Call, 100.0, Date::from_ymd(2026, 6, 16)?);
//! option.set_pricing_engine(Some(AnalyticEuropeanEngine::new(process)))?;
//!
//! let before = option.npv()?;
//! spot.set_value(110.0)?;
//! assert!(option.npv()? > before);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Observer graph, handles, lazy objects, settings and errors.
pub use ql_core as core;

/// Dates, day counters, calendars and the evaluation date.
pub use ql_time as time;

/// Normal distribution and floating-point comparison.
pub use ql_math as math;

/// Market quotes.
pub use ql_quotes as quotes;

/// Yield and volatility term structures.
pub use ql_termstructures as termstructures;

/// Stochastic processes.
pub use ql_processes as processes;

/// Instruments and pricing-engine contracts.
pub use ql_instruments as instruments;

/// Pricing engines.
pub use ql_pricingengines as pricingengines;
