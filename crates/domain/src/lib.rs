//! Shared types for the Furrow gateway crates: request categories,
//! configuration and the common error type.

pub mod category;
pub mod config;
pub mod error;

pub use category::Category;
