//! SQLite backend for the storefront engine.
//!
//! [`SqliteDatabase`] implements every trait in [`crate::traits`]. The SQL itself lives in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
