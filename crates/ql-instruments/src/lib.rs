//! # ql-instruments
//!
//! Instruments as lazy objects: each caches the results record produced
//! by its pricing engine and is invalidated whenever the engine (or
//! anything the engine observes) changes.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod exercise;
pub mod instrument;
pub mod option;
pub mod payoff;

pub use exercise::{Exercise, ExerciseType};
pub use instrument::{
    Greeks, Instrument, InstrumentCore, PricingArguments, PricingEngine, PricingResults,
};
pub use option::{OneAssetOption, VanillaOption, VanillaOptionArguments};
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff, StrikedPayoff};
