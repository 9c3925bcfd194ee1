//! Shared test utilities for the WCPS workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Canned coverage metadata and an in-memory metadata source
//! - WCPS XML request builders
//! - Test data path helpers
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{sample_source, wcps};
//! ```

pub mod fixtures;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_catalog_loading() {
///     let path = require_test_file!("catalog.yaml");
///     // Test code using path...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Set TEST_DATA_DIR to its directory.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Assert that two RasQL strings are equal up to runs of whitespace.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_rasql_eq;
///
/// assert_rasql_eq!("select  c from rgb as c", "select c from rgb as c");
/// ```
#[macro_export]
macro_rules! assert_rasql_eq {
    ($left:expr, $right:expr) => {{
        let left = $crate::normalize_whitespace(&$left);
        let right = $crate::normalize_whitespace(&$right);
        assert_eq!(left, right, "RasQL mismatch");
    }};
}

/// Collapse every run of whitespace into one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
