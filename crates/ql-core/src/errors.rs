//! Error types for the reactive core.
//!
//! A single `thiserror`-derived enum covers every failure the observer graph,
//! handles, lazy objects and their clients can report.  The C++ macros
//! `QL_REQUIRE`, `QL_ENSURE`, and `QL_FAIL` map to the `ensure!`,
//! `ensure_post!` and `fail!` convenience macros defined here.

use thiserror::Error;

/// The top-level error type used throughout the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (maps to `QL_FAIL`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (maps to `QL_REQUIRE`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated (maps to `QL_ENSURE`).
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// A value was read from a quote that currently holds none.
    #[error("null value")]
    NullValue,

    /// Date construction or arithmetic failed.
    #[error("date error: {0}")]
    Date(String),

    /// A pricing accessor was invoked on an instrument without an engine.
    #[error("null pricing engine")]
    NoEngine,

    /// The current subject of an empty handle was requested.
    #[error("empty Handle cannot be dereferenced")]
    EmptyHandle,

    /// Arguments handed to an engine failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A date or time lies outside the range a term structure covers.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A calculation hook failed.
    #[error("numeric failure: {0}")]
    Numeric(String),

    /// An abstract hook was invoked on a type that does not provide it.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Equivalent to C++ `QL_REQUIRE(condition, message)`.
///
/// With a format string, returns `Err(Error::Precondition(...))` if `$cond`
/// is false.  With any other expression, returns that error instead.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// fn in_range(t: f64) -> ql_core::errors::Result<f64> {
///     ensure!(t <= 30.0, Error::OutOfRange(format!("time {t} past 30y")));
///     Ok(t)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// assert!(matches!(in_range(31.0), Err(Error::OutOfRange(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal $(, $arg:expr)* $(,)?) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($msg $(, $arg)*)
            ));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Equivalent to C++ `QL_ENSURE(condition, message)`.
///
/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Equivalent to C++ `QL_FAIL(message)`.
///
/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert_eq!(always_err(), Err(Error::Runtime("something went wrong".into())));
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_sqrt(x: f64) -> Result<f64> {
        ensure!(x >= 0.0, "cannot take the square root of {}", x);
        Ok(x.sqrt())
    }

    fn checked_index(i: usize, len: usize) -> Result<usize> {
        ensure!(i < len, Error::OutOfRange(format!("index {i} >= {len}")));
        Ok(i)
    }

    fn check_post(x: f64) -> Result<f64> {
        ensure_post!(x.is_finite(), "result {x} is not finite");
        Ok(x)
    }

    #[test]
    fn messages() {
        assert_eq!(Error::NoEngine.to_string(), "null pricing engine");
        assert_eq!(
            Error::EmptyHandle.to_string(),
            "empty Handle cannot be dereferenced"
        );
        assert_eq!(
            Error::OutOfRange("date before reference".into()).to_string(),
            "out of range: date before reference"
        );
    }

    #[test]
    fn ensure_picks_the_error_kind() {
        assert_eq!(checked_sqrt(4.0), Ok(2.0));
        assert_eq!(
            checked_sqrt(-1.0),
            Err(Error::Precondition("cannot take the square root of -1".into()))
        );
        assert_eq!(checked_index(1, 2), Ok(1));
        assert_eq!(
            checked_index(2, 2),
            Err(Error::OutOfRange("index 2 >= 2".into()))
        );
    }

    #[test]
    fn ensure_post_maps_to_postcondition() {
        assert!(check_post(1.0).is_ok());
        assert!(matches!(check_post(f64::NAN), Err(Error::Postcondition(_))));
    }
}
