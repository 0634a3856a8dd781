//! Unified error code convention.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that
//! the runtime, the deliverers and downstream tooling can log and react
//! to failures uniformly without matching on concrete types.
//!
//! # Code Format
//!
//! - `UPPER_SNAKE_CASE`, prefixed with the owning layer
//!   (e.g. `CODEC_`, `DELIVER_`, `PIPELINE_`)
//! - Stable once defined; changing a code is a breaking change
//!
//! # Example
//!
//! ```
//! use gantry_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum WireError {
//!     Timeout,
//!     BadChecksum,
//! }
//!
//! impl ErrorCode for WireError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Timeout => "WIRE_TIMEOUT",
//!             Self::BadChecksum => "WIRE_BAD_CHECKSUM",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Timeout)
//!     }
//! }
//!
//! assert!(WireError::Timeout.is_recoverable());
//! ```

/// Machine-readable code plus recoverability for an error value.
///
/// An error is recoverable when retrying the operation may succeed:
/// a transient condition such as a timeout or a busy peripheral.
/// Malformed input, unknown component types and duplicate identifiers
/// are not: retry will not help.
pub trait ErrorCode {
    /// Returns the stable machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that `err`'s code follows the workspace convention.
///
/// # Panics
///
/// Panics with a descriptive message when the code is empty, lacks the
/// expected prefix, or is not `UPPER_SNAKE_CASE`.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();
    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// [`assert_error_code`] over every variant of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
