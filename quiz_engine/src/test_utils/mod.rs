//! Helpers for tests in this crate and its dependents. Only compiled with the `test_utils` feature.
pub mod prepare_env;
pub mod providers;
