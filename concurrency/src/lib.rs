// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Synchronization facade.
//!
//! Crates which share state between threads import their primitives from [`sync`] rather than
//! from `std::sync` directly. Enabling the `shuttle` feature swaps the whole module for
//! `shuttle::sync`, so the very same code can be driven by the shuttle randomized scheduler in
//! tests.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

mod macros;

#[cfg(not(feature = "shuttle"))]
pub use std::sync;

#[cfg(feature = "shuttle")]
pub use shuttle::sync;

#[cfg(not(feature = "shuttle"))]
pub use std::thread;

#[cfg(feature = "shuttle")]
pub use shuttle::thread;
