//! # Covey Memory
//!
//! Memory providers implementing [`covey_core::Memory`].
//!
//! [`RollingMemory`] keeps a bounded window of recent entries and renders
//! them as prompt context, ranking entries by a mix of query relevance and
//! recency when a query is given.

pub mod rolling;

pub use rolling::{MemoryItem, MemoryStats, RollingMemory, RollingMemoryConfig};
