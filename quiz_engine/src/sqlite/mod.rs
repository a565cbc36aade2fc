//! SQLite storage backend for the quiz engine.
//!
//! [`SqliteDatabase`] implements every storage trait in [`crate::traits`]. The [`db`] module holds the low-level
//! query functions it is built from.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
