//! Unified error interface for the console.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so the shell
//! can report failures uniformly and tests can check code conventions.
//!
//! # Example
//!
//! ```
//! use luag_runtime::ErrorCode;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     NotFound(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for MyError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::NotFound(_) => "MY_NOT_FOUND",
//!             Self::Busy => "MY_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = MyError::Busy;
//! assert_eq!(err.code(), "MY_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error code plus recoverability.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE
/// - Prefixed with the owning module (e.g. `"CARTRIDGE_"`, `"PLUGIN_"`)
/// - Stable once defined
///
/// # Recoverability
///
/// An error is recoverable when the user can fix it without restarting the
/// console: a missing file, a malformed cartridge, a script bug. Internal
/// invariant violations are not recoverable.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the user can retry after corrective action.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Validates every variant of an error enum at once.
///
/// # Panics
///
/// Panics on the first invalid code.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
