//! SQLite backend for the settlement engine.
//!
//! Migrations live in `src/sqlite/migrations` and are embedded at compile time. Call
//! [`SqliteDatabase::run_migrations`] once at start-up.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
