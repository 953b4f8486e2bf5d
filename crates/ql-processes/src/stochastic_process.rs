//! `StochasticProcess1D`: base trait for one-factor processes
//! (translates `ql/stochasticprocess.hpp`).
//!
//! A process `dX = μ(t,X) dt + σ(t,X) dW` is described by its drift and
//! diffusion; the discretization helpers use a first-order Euler scheme.
//! Processes read their market inputs through handles, so every method is
//! fallible and every process is an observable that engines subscribe to.

use ql_core::errors::Result;
use ql_core::patterns::observable::{AsObservable, Observable};
use ql_core::{Real, Time};
use ql_time::Date;

/// A 1-dimensional stochastic process.
///
/// Corresponds to `QuantLib::StochasticProcess1D`.
pub trait StochasticProcess1D: Observable + AsObservable + std::fmt::Debug {
    /// Initial value of the process.
    fn x0(&self) -> Result<Real>;

    /// Drift `μ(t, x)`.
    fn drift(&self, t: Time, x: Real) -> Result<Real>;

    /// Diffusion `σ(t, x)`.
    fn diffusion(&self, t: Time, x: Real) -> Result<Real>;

    /// Year fraction from the process's reference date to `date`.
    fn time(&self, date: Date) -> Result<Time>;

    /// Expected value `E[x(t+Δt) | x(t) = x]`.
    fn expectation(&self, t: Time, x: Real, dt: Time) -> Result<Real> {
        Ok(x + self.drift(t, x)? * dt)
    }

    /// Standard deviation `σ(t,x) · √Δt`.
    fn std_deviation(&self, t: Time, x: Real, dt: Time) -> Result<Real> {
        Ok(self.diffusion(t, x)? * dt.sqrt())
    }

    /// Variance `σ(t,x)² · Δt`.
    fn variance(&self, t: Time, x: Real, dt: Time) -> Result<Real> {
        let s = self.diffusion(t, x)?;
        Ok(s * s * dt)
    }

    /// Advance `x` by one step driven by the normal variate `dw`.
    fn evolve(&self, t: Time, x: Real, dt: Time, dw: Real) -> Result<Real> {
        Ok(self.expectation(t, x, dt)? + self.std_deviation(t, x, dt)? * dw)
    }
}
