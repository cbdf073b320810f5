//! Stashline State Engine
//!
//! Keeps one typed value in memory and mirrors it into a storage backend.
//! The value is restored from storage once per store (hydration) and
//! written back on every update after that (write-through). Storage
//! failures are reported through a hook and never reach the caller.

pub mod store;
pub mod context;
pub mod scheduler;
pub mod serializer;
pub mod report;
pub mod environment;
pub mod memory;
pub mod persistent;

pub use store::*;
pub use context::*;
pub use scheduler::*;
pub use serializer::*;
pub use report::*;
pub use environment::*;
pub use memory::*;
pub use persistent::*;
