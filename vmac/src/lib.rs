// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Virtual MAC addresses for service function chaining.
//!
//! A virtual MAC carries the state of a packet along a service chain: its direction, a port,
//! the chain it belongs to and the hop it is at. This crate builds those addresses, hands out
//! the chain ids they embed, and picks the local locator a forwarder uses to reach the next
//! forwarder of a path.
//!
//! # Example
//!
//! ```
//! use sfc_vmac::{ChainUuid, VmacConfig};
//!
//! let codec = VmacConfig::default().build().unwrap();
//! let chain = ChainUuid::from_name("web-chain");
//! let base = codec.backward_address(chain, 0).unwrap();
//! assert_eq!(base.to_string(), "F0:00:00:40:00:FF");
//! assert_eq!(codec.hop_address(base, 1).unwrap().to_string(), "F0:00:00:40:01:00");
//! ```

pub mod address;
pub mod chainid;
#[cfg(test)]
mod chainid_test;
pub mod codec;
pub mod config;
mod errors;
pub mod layout;
pub mod locator;
pub mod mac;
pub mod registry;
pub mod resolver;

// re-exports
pub use address::{Direction, VirtualMac, VmacFlags};
pub use chainid::{ChainId, ChainIdAllocator, ChainUuid};
pub use codec::{AddressCodec, VmacFields};
pub use config::{ConfigError, VmacConfig, VmacConfigBuilder};
pub use errors::{InvalidParameter, VmacError, VmacResult};
pub use layout::{LayoutError, VmacLayout};
pub use locator::{ConnectivityEntry, ForwarderId, Locator, LocatorKind, Transport};
pub use mac::Mac;
pub use registry::{ForwarderRegistry, ForwarderTable, RegistryError};
pub use resolver::NextHopResolver;
