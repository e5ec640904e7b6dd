//! Region Allocator - Stateless allocator adapter for a secondary RAM region
//!
//! # Purpose
//! Sources raw memory from a distinct physical region (for example an
//! external PSRAM bank reachable only through a dedicated allocate/free pair)
//! instead of the default heap, behind an allocator that generic containers
//! can be parameterized with.
//!
//! # Integration Points
//! - Depends on: the board's raw region primitive ([`Region`])
//! - Provides to: region-backed containers, `region-fn` callables
//! - Capabilities required: none, every allocator instance is zero-sized
//!
//! # Architecture
//! - [`Region`]: type-level policy wrapping the raw allocate/free pair
//! - [`RegionAllocator`]: typed allocate/deallocate/construct/destroy over a region
//! - [`raw`]: byte-level path shared by the typed allocator and type-erased holders
//! - [`RegionBox`]: a single value placed in region storage
//! - [`collections`]: vector, string and ordered map aliases over the allocator
//! - [`list`]: linked list whose nodes come from the rebound allocator
//!
//! # Testing Strategy
//! - Unit tests: overflow guard, exhaustion, zero-sized requests, equality
//! - Integration tests: container scenarios against a counting fake region
//! - Benchmarks: allocate/deallocate latency per backend

#![no_std]

#[cfg(any(test, feature = "mock"))]
extern crate std;

extern crate alloc;

mod allocator;
mod boxed;
pub mod collections;
pub mod config;
pub mod list;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod raw;
mod region;

pub use allocator::{Rebind, RegionAllocator};
pub use boxed::RegionBox;
pub use collections::{region_vec, RegionMap, RegionString, RegionVec};
pub use list::RegionList;
#[cfg(feature = "external")]
pub use region::ExternRegion;
pub use region::{DefaultRegion, Region, SystemRegion};

use thiserror::Error;

/// Region allocation errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    #[error("Allocation size overflow ({count} elements of {elem_size} bytes)")]
    Overflow { count: usize, elem_size: usize },

    #[error("Alignment {align} exceeds region guarantee of {max}")]
    UnsupportedAlignment { align: usize, max: usize },

    #[error("Out of region memory (requested: {requested} bytes)")]
    OutOfMemory { requested: usize },

    #[error("Container could not reserve {additional} more elements")]
    Reserve { additional: usize },
}

pub type Result<T> = core::result::Result<T, RegionError>;
