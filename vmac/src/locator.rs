// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Data-plane locators advertised by forwarders, and the links between forwarders.

use crate::mac::Mac;
use id::Id;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::IpAddr;

/// Marker type for forwarder identities
#[derive(Debug)]
pub enum Forwarder {}

/// Identity of a service function forwarder
pub type ForwarderId = Id<Forwarder>;

/// Encapsulation used over a locator or a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    Ethernet,
    Vxlan,
    VxlanGpe,
    Gre,
    Mpls,
}

impl Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Ethernet => write!(f, "ethernet"),
            Transport::Vxlan => write!(f, "vxlan"),
            Transport::VxlanGpe => write!(f, "vxlan-gpe"),
            Transport::Gre => write!(f, "gre"),
            Transport::Mpls => write!(f, "mpls"),
        }
    }
}

/// Where a locator can be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LocatorKind {
    Mac {
        mac: Mac,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vlan: Option<u16>,
    },
    Ip {
        ip: IpAddr,
        port: u16,
    },
    Mpls {
        label: u32,
    },
}

impl LocatorKind {
    /// The MAC address of a MAC-based locator, `None` for any other kind
    #[must_use]
    pub fn mac(&self) -> Option<Mac> {
        match self {
            LocatorKind::Mac { mac, .. } => Some(*mac),
            LocatorKind::Ip { .. } | LocatorKind::Mpls { .. } => None,
        }
    }
}

impl Display for LocatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorKind::Mac {
                mac,
                vlan: Some(vlan),
            } => write!(f, "mac {mac} vlan {vlan}"),
            LocatorKind::Mac { mac, vlan: None } => write!(f, "mac {mac}"),
            LocatorKind::Ip { ip, port } => write!(f, "ip {ip} port {port}"),
            LocatorKind::Mpls { label } => write!(f, "mpls label {label}"),
        }
    }
}

/// A data-plane attachment point owned by a forwarder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    name: String,
    transport: Transport,
    kind: LocatorKind,
}

impl Locator {
    #[must_use]
    pub fn new(name: impl Into<String>, transport: Transport, kind: LocatorKind) -> Self {
        Self {
            name: name.into(),
            transport,
            kind,
        }
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }
    #[must_use]
    pub fn kind(&self) -> &LocatorKind {
        &self.kind
    }
    /// Shorthand for `self.kind().mac()`
    #[must_use]
    pub fn mac(&self) -> Option<Mac> {
        self.kind.mac()
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} over {})", self.name, self.kind, self.transport)
    }
}

/// A link from one forwarder to a neighbor, as seen from the first one.
///
/// `locator` is what the neighbor advertises on that link. For MAC-based links it is the MAC
/// the local side must own to reach the neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEntry {
    neighbor: ForwarderId,
    transport: Transport,
    locator: LocatorKind,
}

impl ConnectivityEntry {
    #[must_use]
    pub fn new(neighbor: ForwarderId, transport: Transport, locator: LocatorKind) -> Self {
        Self {
            neighbor,
            transport,
            locator,
        }
    }
    #[must_use]
    pub fn neighbor(&self) -> ForwarderId {
        self.neighbor
    }
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }
    #[must_use]
    pub fn locator(&self) -> &LocatorKind {
        &self.locator
    }
}
