//! A headless windowing and node-recycling engine for fixed-height virtual lists.
//!
//! For the controller that drives a host UI layer (binding, attach/detach, scroll samples), see
//! the `recycler-adapter` crate.
//!
//! This crate holds the parts that never touch a UI object:
//! - geometry: container extent, resident capacity, initial window bounds
//! - a registry of materialized nodes keyed by logical index
//! - the window state machine that decides when to slide forward or backward
//!
//! Every node is positioned at `index * item_extent`, so reusing a node never depends on the
//! layout of its siblings.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
pub mod geometry;
mod metadata;
mod registry;
mod window;


pub use error::{HostError, RecycleError};
pub use metadata::{BindingContext, IterationMetadata};
pub use registry::{NodeRecord, NodeRegistry};
pub use window::{WindowBounds, WindowOptions, WindowSnapshot, WindowState};
