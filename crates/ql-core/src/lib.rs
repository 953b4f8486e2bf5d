//! # ql-core
//!
//! The reactive substrate of quantlib-reactive.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace: type aliases, the error hierarchy, the
//! Observer/Observable notification graph, the `Handle` indirection,
//! `LazyObject` caching, and the per-thread `Settings`.
//!
//! Everything here is single-threaded: shared nodes live behind `Rc`, back
//! edges are `Weak`, and mutable state sits in `Cell`/`RefCell`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `fail!` / `ensure_post!` macros.
pub mod errors;

/// Shared reference handle (`Handle<T>`, `RelinkableHandle<T>`).
pub mod handle;

/// Design patterns: observable, observable_value, lazy_object.
pub mod patterns;

/// Per-thread library settings (evaluation date and policy flags).
pub mod settings;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Integer type used for general-purpose counting (maps to C++ `QL_INTEGER`).
pub type Integer = i32;

/// Non-negative integer type.
pub type Natural = u32;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use handle::{Handle, RelinkableHandle};
pub use patterns::lazy_object::{LazyObject, LazyState};
pub use patterns::observable::{
    AsObservable, Observable, ObservableId, ObservableImpl, ObservableSettings, Observer,
    ObserverId, ObserverImpl,
};
pub use patterns::observable_value::ObservableValue;
pub use settings::{SavedSettings, Settings};
