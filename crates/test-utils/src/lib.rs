//! Shared test utilities for the traffic-map workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Sample render request payloads
//! - Synthetic graph generators
//! - Temporary path helpers for cache files
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
//! use test_utils::{fixtures, grid_request};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert two scalars differ by at most `epsilon`. Operands are widened to
/// `f64`, so canvas coordinates and scale factors can be compared directly.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = ($left as f64, $right as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= $epsilon as f64,
            "assertion failed: {} is not within {} of {} (diff {})",
            left,
            $epsilon,
            right,
            diff
        );
    }};
}

/// Approximate equality of two canvas points given as `(x, y)`.
#[macro_export]
macro_rules! assert_point_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}
