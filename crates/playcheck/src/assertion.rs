//! One-shot assertions on plain values.
//!
//! Page state is asserted with the retrying matchers in `expect`; values that
//! were already read (status codes, parsed prices, counts) go through these.

use std::fmt::Debug;

use crate::result::{PlaycheckError, PlaycheckResult};

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Turn a failure into `AssertionFailed`
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` carrying the message when the assertion failed
    pub fn check(self) -> PlaycheckResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(PlaycheckError::assertion(self.message))
        }
    }

    /// Prefix the failure message with what was being checked
    #[must_use]
    pub fn context(mut self, what: &str) -> Self {
        if !self.passed {
            self.message = format!("{what}: {}", self.message);
        }
        self
    }
}

/// Assertion helpers for values read from the page
#[derive(Debug)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug + ?Sized>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a string does not contain a substring
    #[must_use]
    pub fn not_contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::fail(format!("expected '{haystack}' not to contain '{needle}'"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert a value is in a closed range
    #[must_use]
    pub fn in_range<T: PartialOrd + Debug>(value: T, min: T, max: T) -> AssertionResult {
        if value >= min && value <= max {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {value:?} to be in range [{min:?}, {max:?}]"))
        }
    }

    /// Assert `value > bound`
    #[must_use]
    pub fn greater_than<T: PartialOrd + Debug>(value: T, bound: T) -> AssertionResult {
        if value > bound {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {value:?} to be greater than {bound:?}"))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert a condition is false
    #[must_use]
    pub fn is_false(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::fail(message)
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert an Option is Some
    #[must_use]
    pub fn is_some<T>(opt: &Option<T>) -> AssertionResult {
        if opt.is_some() {
            AssertionResult::pass()
        } else {
            AssertionResult::fail("expected Some, got None")
        }
    }

    /// Assert a collection has the expected length
    #[must_use]
    pub fn has_length<T>(collection: &[T], expected: usize) -> AssertionResult {
        if collection.len() == expected {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expected length {expected}, got {}",
                collection.len()
            ))
        }
    }

    /// Assert two floats are within `epsilon`
    #[must_use]
    pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> AssertionResult {
        if (a - b).abs() <= epsilon {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {a} to be within {epsilon} of {b}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod assertion_result_tests {
        use super::*;

        #[test]
        fn test_check_pass() {
            assert!(AssertionResult::pass().check().is_ok());
        }

        #[test]
        fn test_check_fail_carries_message() {
            let err = AssertionResult::fail("boom").check().unwrap_err();
            assert!(err.to_string().contains("boom"));
        }

        #[test]
        fn test_context_only_on_failure() {
            assert_eq!(AssertionResult::pass().context("status").message, "");
            let failed = AssertionResult::fail("expected 200, got 404").context("status");
            assert_eq!(failed.message, "status: expected 200, got 404");
        }
    }

    mod assertion_tests {
        use super::*;

        #[test]
        fn test_equals() {
            assert!(Assertion::equals(&200, &200).passed);
            let r = Assertion::equals(&200, &404);
            assert!(!r.passed);
            assert!(r.message.contains("404"));
        }

        #[test]
        fn test_equals_unsized() {
            assert!(Assertion::equals("a", "a").passed);
            assert!(Assertion::equals(&[1, 2][..], &[1, 2][..]).passed);
        }

        #[test]
        fn test_contains() {
            assert!(Assertion::contains("Item total: $39.98", "Item total").passed);
            assert!(!Assertion::contains("abc", "z").passed);
            assert!(Assertion::not_contains("abc", "z").passed);
        }

        #[test]
        fn test_ranges() {
            assert!(Assertion::in_range(301, 200, 599).passed);
            assert!(!Assertion::in_range(600, 200, 599).passed);
            assert!(Assertion::greater_than(1, 0).passed);
            assert!(!Assertion::greater_than(0, 0).passed);
        }

        #[test]
        fn test_booleans_and_options() {
            assert!(Assertion::is_true(true, "x").passed);
            assert!(!Assertion::is_false(true, "x").passed);
            assert!(Assertion::is_some(&Some(1)).passed);
            assert!(!Assertion::is_some::<u8>(&None).passed);
        }

        #[test]
        fn test_has_length_and_approx() {
            assert!(Assertion::has_length(&[1, 2, 3], 3).passed);
            assert!(!Assertion::has_length(&[1], 3).passed);
            assert!(Assertion::approx_eq(0.1 + 0.2, 0.3, 1e-9).passed);
        }
    }
}
