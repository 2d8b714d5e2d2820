//! Helpers for tests that need a real, migrated database. Enabled with the `test_utils` feature.
pub mod prepare_env;
pub mod seed;
