//! Integer arithmetic used by the driver.
//!
//! `add` and `double` wrap on overflow so debug and release builds agree.
//! `gcd` is the plain subtraction variant: it converges for positive
//! operands and may spin forever otherwise.

use crate::error::{AltsumError, AltsumResult};

pub fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

pub fn double(x: i64) -> i64 {
    x.wrapping_mul(2)
}

/// Greatest common divisor by repeated subtraction.
///
/// Does not terminate for inputs that never meet (e.g. `gcd(0, 5)`).
/// Use [`gcd_bounded`] where that matters.
pub fn gcd(a: i64, b: i64) -> i64 {
    gcd_counted(a, b).value
}

/// Result of a GCD run together with the number of subtractions it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcdOutcome {
    pub value: i64,
    pub steps: u64,
}

pub fn gcd_counted(mut a: i64, mut b: i64) -> GcdOutcome {
    let mut steps = 0u64;
    while a != b {
        subtract_step(&mut a, &mut b);
        steps = steps.wrapping_add(1);
    }
    GcdOutcome { value: a, steps }
}

/// Subtraction GCD that gives up after `max_steps` subtractions.
pub fn gcd_bounded(a: i64, b: i64, max_steps: u64) -> AltsumResult<GcdOutcome> {
    let (mut x, mut y) = (a, b);
    let mut steps = 0u64;
    while x != y {
        if steps >= max_steps {
            return Err(AltsumError::GcdStepLimit {
                a,
                b,
                limit: max_steps,
            });
        }
        subtract_step(&mut x, &mut y);
        steps += 1;
    }
    Ok(GcdOutcome { value: x, steps })
}

#[inline]
fn subtract_step(a: &mut i64, b: &mut i64) {
    if *a > *b {
        *a = a.wrapping_sub(*b);
    } else {
        *b = b.wrapping_sub(*a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euclid(mut a: i64, mut b: i64) -> i64 {
        while b != 0 {
            let t = a % b;
            a = b;
            b = t;
        }
        a
    }

    #[test]
    fn test_add() {
        assert_eq!(add(2, 3), 5);
        assert_eq!(add(-7, 7), 0);
        assert_eq!(add(-4, -8), -12);
        assert_eq!(add(0, 0), 0);
    }

    #[test]
    fn test_add_wraps_on_overflow() {
        assert_eq!(add(i64::MAX, 1), i64::MIN);
        assert_eq!(add(i64::MIN, -1), i64::MAX);
    }

    #[test]
    fn test_double() {
        assert_eq!(double(0), 0);
        assert_eq!(double(21), 42);
        assert_eq!(double(-3), -6);
        assert_eq!(double(i64::MAX), -2);
    }

    #[test]
    fn test_gcd_matches_euclid_for_positive_inputs() {
        for a in 1..=40 {
            for b in 1..=40 {
                assert_eq!(gcd(a, b), euclid(a, b), "gcd({a}, {b})");
                assert_eq!(gcd(a, b), gcd(b, a));
            }
        }
    }

    #[test]
    fn test_gcd_known_values() {
        assert_eq!(gcd(1, 4), 1);
        assert_eq!(gcd(5, 5), 5);
        assert_eq!(gcd(4, 2), 2);
        assert_eq!(gcd(48, 18), 6);
        assert_eq!(gcd(17, 13), 1);
    }

    #[test]
    fn test_gcd_equal_operands_return_immediately() {
        assert_eq!(gcd_counted(0, 0), GcdOutcome { value: 0, steps: 0 });
        assert_eq!(gcd_counted(-9, -9), GcdOutcome { value: -9, steps: 0 });
    }

    #[test]
    fn test_gcd_counted_steps() {
        // 48,18 -> 30,18 -> 12,18 -> 12,6 -> 6,6
        assert_eq!(gcd_counted(48, 18), GcdOutcome { value: 6, steps: 4 });
        assert_eq!(gcd_counted(1, 4).steps, 3);
    }

    #[test]
    fn test_gcd_bounded_converges() {
        let outcome = gcd_bounded(48, 18, 4).unwrap();
        assert_eq!(outcome, GcdOutcome { value: 6, steps: 4 });
        assert_eq!(gcd_bounded(7, 7, 0).unwrap().value, 7);
    }

    #[test]
    fn test_gcd_bounded_gives_up_on_zero_operand() {
        let err = gcd_bounded(0, 5, 1_000).unwrap_err();
        assert_eq!(
            err,
            AltsumError::GcdStepLimit {
                a: 0,
                b: 5,
                limit: 1_000
            }
        );
    }

    #[test]
    fn test_gcd_bounded_limit_is_exact() {
        assert!(gcd_bounded(48, 18, 3).is_err());
    }
}
