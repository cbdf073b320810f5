//! Stashline Core Library
//!
//! Core types, traits, and configuration shared by the Stashline crates.
//! A store keeps one typed value in memory and mirrors it into a
//! key-value `StorageBackend` through a `Serializer`.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
