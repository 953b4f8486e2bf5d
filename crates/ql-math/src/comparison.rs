//! Floating-point closeness predicates (translates `ql/math/comparison.hpp`).
//!
//! Both predicates take a tolerance in units of machine epsilon, relative to
//! the magnitude of the operands.  They are the usual candidates for a
//! quote's closeness test.

use ql_core::Real;

/// Tolerance multiplier QuantLib uses when none is given.
pub const DEFAULT_ULPS: u32 = 42;

/// `true` if `x` and `y` agree within `n` epsilons relative to *both*
/// magnitudes.
pub fn close(x: Real, y: Real, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = Real::from(n) * Real::EPSILON;
    if x == 0.0 || y == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() && diff <= tolerance * y.abs()
}

/// `true` if `x` and `y` agree within `n` epsilons relative to *either*
/// magnitude.
pub fn close_enough(x: Real, y: Real, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = Real::from(n) * Real::EPSILON;
    if x == 0.0 || y == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() || diff <= tolerance * y.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_a_few_epsilons() {
        let x = 100.0;
        let y = x * (1.0 + 10.0 * Real::EPSILON);
        assert!(close(x, y, DEFAULT_ULPS));
        assert!(close_enough(x, y, DEFAULT_ULPS));
        assert!(!close(x, y, 1));
    }

    #[test]
    fn distinct_values() {
        assert!(!close(1.0, 1.0 + 1e-9, DEFAULT_ULPS));
        assert!(!close_enough(0.2, 0.3, DEFAULT_ULPS));
    }

    #[test]
    fn zero_is_handled_absolutely() {
        assert!(close(0.0, 1e-300, DEFAULT_ULPS));
        assert!(!close(0.0, 1e-10, DEFAULT_ULPS));
    }
}
