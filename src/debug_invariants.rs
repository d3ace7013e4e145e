//! Invariant checking shared by profiles, point maps and grids.
//!
//! Checks run after mutations in debug builds and whenever the
//! `check-invariants` (or `strict-invariants`) feature is enabled.

use crate::profile_error::ProfileError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), ProfileError>;
}

/// Run a fallible invariant check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! profile_debug_assert_ok {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[profile invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Build a [`ProfileError::InvariantViolation`] from a format string.
#[macro_export]
macro_rules! invariant_error {
    ($($arg:tt)*) => {
        $crate::profile_error::ProfileError::InvariantViolation(format!($($arg)*))
    };
}
