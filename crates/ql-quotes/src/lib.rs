//! # ql-quotes
//!
//! Market quotes: the observable leaves of the graph, plus quotes derived
//! from other quotes through handles.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Quote` trait and concrete implementations.
pub mod quote;

pub use quote::{handle_value, Closeness, CompositeQuote, DerivedQuote, Quote, SimpleQuote};
