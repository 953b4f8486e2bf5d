//! # ql-math
//!
//! The numerical helpers the reactive core's pricing layer needs: the
//! standard normal distribution (via `statrs`) and floating-point closeness
//! predicates.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::{close, close_enough};
pub use distributions::{normal_cdf, normal_pdf};
