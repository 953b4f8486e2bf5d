//! # ql-processes
//!
//! Stochastic processes wired into the observer graph.
//!
//! Translates the part of `ql/processes/` the analytic engines need: a
//! process reads spot, curves and volatility through handles and
//! re-notifies its engines whenever any of them changes.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_scholes_process;
pub mod stochastic_process;

pub use black_scholes_process::{
    black_scholes_merton_process, black_scholes_process, GeneralizedBlackScholesProcess,
};
pub use stochastic_process::StochasticProcess1D;
