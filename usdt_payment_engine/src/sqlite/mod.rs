//! SQLite backend for the USDT Payment Engine.
mod sqlite_impl;

pub mod db;

pub use sqlite_impl::SqliteDatabase;
