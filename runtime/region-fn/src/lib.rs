//! Region Function - Copyable type-erased callables stored in a memory region
//!
//! # Purpose
//! Lets closures and function objects live in a secondary RAM region. A
//! [`RegionFn`] is parameterized only by its call signature; the captured
//! callable sits in a region-allocated holder reached through a vtable.
//!
//! # Integration Points
//! - Depends on: `region-alloc` (holder storage)
//! - Provides to: callback tables, event handlers and other code that stores
//!   closures outside the default heap
//!
//! # Architecture
//! - [`Callable`]: adapts `FnMut(A0, .., An) -> Ret` to a tuple-argument form
//! - [`RegionFn`]: owns at most one holder; copies deep-clone it into fresh
//!   region storage, never share it
//!
//! # Testing Strategy
//! - Unit tests: empty calls, deep copies, assignment release order
//! - Integration tests: callback tables against the mock region
//! - Benchmarks: construct/clone/invoke latency

#![no_std]

#[cfg(test)]
extern crate std;

mod callable;
mod function;

pub use callable::Callable;
pub use function::RegionFn;

use region_alloc::RegionError;
use thiserror::Error;

/// Errors raised by region callables
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FnError {
    #[error("Called an empty region function")]
    BadCall,

    #[error("Region allocation failed: {0}")]
    Region(#[from] RegionError),
}

pub type Result<T> = core::result::Result<T, FnError>;
