//! # ql-pricingengines
//!
//! Pricing engines observing the processes they read market data from.
//!
//! ## Engines
//!
//! - [`AnalyticEuropeanEngine`]: Black-Scholes-Merton closed form for European options

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;

pub use analytic_european_engine::{black_formula, AnalyticEuropeanEngine};
