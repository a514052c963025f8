//! Prelude module for birthday_book crate.
//!
//! Re-exports the derive macros shared by the value and error types.

pub use derive_more::Display;
