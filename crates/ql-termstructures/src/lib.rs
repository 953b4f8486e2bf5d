//! # ql-termstructures
//!
//! Yield curves and volatility surfaces built on the observer graph.
//!
//! Every term structure is both an observer (of its quotes, and of the
//! evaluation date when its reference date moves) and an observable
//! (re-notifying whatever depends on it).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure`: base trait and shared state for all term structures.
pub mod term_structure;

/// `YieldTermStructure`: yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward`: constant forward-rate yield curve.
pub mod flat_forward;

/// `VolatilityTermStructure`: base trait for volatility term structures.
pub mod volatility_term_structure;

/// `BlackVolTermStructure`: Black-volatility term structures and `BlackConstantVol`.
pub mod black_vol_term_structure;

/// `LocalVolTermStructure`: local-volatility term structures and `LocalConstantVol`.
pub mod local_vol_term_structure;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use black_vol_term_structure::{BlackConstantVol, BlackVolTermStructure};
pub use flat_forward::FlatForward;
pub use local_vol_term_structure::{LocalConstantVol, LocalVolTermStructure};
pub use term_structure::{ReferenceDate, TermStructure, TermStructureCore};
pub use volatility_term_structure::VolatilityTermStructure;
pub use yield_term_structure::YieldTermStructure;
