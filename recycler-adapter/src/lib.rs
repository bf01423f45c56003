//! Host-facing controller for the `recycler` crate.
//!
//! The `recycler` crate is UI-agnostic and holds the window math and state. This crate connects
//! it to a host UI layer through the [`RepeatHost`] trait:
//!
//! - materializing the first window when a collection is installed
//! - sliding the window on scroll samples, reusing nodes that were already bound
//! - fail-soft handling of a busy host during scrolling
//! - per-frame coalescing of scroll samples
//! - an optional eviction policy for very long lists
//!
//! This crate is intentionally framework-agnostic; [`sim::SimHost`] is an in-memory host for
//! tests and headless runs.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod coalesce;
mod controller;
mod host;
mod options;
pub mod sim;

#[cfg(test)]
mod tests;

pub use coalesce::{ScrollCoalescer, ScrollSample};
pub use controller::{Controller, ControllerSnapshot, ScrollOutcome};
pub use host::{Anchor, BindRequest, Bound, RepeatHost, ViewportProvider};
pub use options::{EvictionPolicy, RepeatOptions};
