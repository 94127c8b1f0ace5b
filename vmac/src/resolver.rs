// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Selection of the local locator a forwarder uses to reach a neighbor.

use crate::locator::{ForwarderId, Locator};
use crate::registry::ForwarderRegistry;
use tracectl::trace_target;
use tracing::debug;

trace_target!("next-hop", LevelFilter::INFO, &["vmac"]);

/// Resolves next hops against a [`ForwarderRegistry`], which it only reads.
#[derive(Debug)]
pub struct NextHopResolver<'a, R: ForwarderRegistry + ?Sized> {
    registry: &'a R,
}

impl<R: ForwarderRegistry + ?Sized> Clone for NextHopResolver<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<R: ForwarderRegistry + ?Sized> Copy for NextHopResolver<'_, R> {}

impl<'a, R: ForwarderRegistry + ?Sized> NextHopResolver<'a, R> {
    #[must_use]
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// The locator of `source` to use towards its neighbor `destination`.
    ///
    /// This is the first MAC locator of `source` whose transport is the one of the link to
    /// `destination` and whose MAC is the one advertised on that link. Returns `None` if
    /// `source` and `destination` are the same forwarder, if they are not linked or if no
    /// locator qualifies.
    #[must_use]
    pub fn resolve_local_locator(
        &self,
        source: ForwarderId,
        destination: ForwarderId,
    ) -> Option<&'a Locator> {
        if source == destination {
            debug!("Not resolving a next hop from forwarder {source} to itself");
            return None;
        }
        let Some(link) = self.registry.connectivity(source, destination) else {
            debug!("No link from forwarder {source} to {destination}");
            return None;
        };
        let Some(link_mac) = link.locator().mac() else {
            debug!(
                "Link from forwarder {source} to {destination} is not MAC-based: {}",
                link.locator()
            );
            return None;
        };
        let Some(locators) = self.registry.locators(source) else {
            debug!("Forwarder {source} advertises no locators");
            return None;
        };
        let found = locators
            .iter()
            .find(|l| l.transport() == link.transport() && l.mac() == Some(link_mac));
        match found {
            Some(locator) => debug!("Forwarder {source} reaches {destination} via {locator}"),
            None => debug!(
                "No {} locator with MAC {link_mac} on forwarder {source}",
                link.transport()
            ),
        }
        found
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::locator::{ConnectivityEntry, LocatorKind, Transport};
    use crate::mac::Mac;
    use crate::registry::ForwarderTable;
    use tracing_test::traced_test;

    const M1: Mac = Mac([0x02, 0, 0, 0, 0, 1]);
    const M2: Mac = Mac([0x02, 0, 0, 0, 0, 2]);

    fn mac(mac: Mac) -> LocatorKind {
        LocatorKind::Mac { mac, vlan: None }
    }

    /// A advertises an IP locator, then M2 over vxlan, then M1 over ethernet and M2 over
    /// ethernet. B is linked from A. C exists but is not linked.
    fn topology(link: ConnectivityEntry) -> (ForwarderTable, ForwarderId, ForwarderId, ForwarderId) {
        let mut table = ForwarderTable::new();
        let (a, b, c) = (
            ForwarderId::from_name("a"),
            ForwarderId::from_name("b"),
            ForwarderId::from_name("c"),
        );
        table.add_forwarder(a, "a");
        table.add_forwarder(b, "b");
        table.add_forwarder(c, "c");
        let locators = [
            Locator::new(
                "ip0",
                Transport::Vxlan,
                LocatorKind::Ip {
                    ip: "10.0.0.1".parse().unwrap(),
                    port: 4789,
                },
            ),
            Locator::new("vx0", Transport::Vxlan, mac(M2)),
            Locator::new("eth0", Transport::Ethernet, mac(M1)),
            Locator::new("eth1", Transport::Ethernet, mac(M2)),
        ];
        for locator in locators {
            table.add_locator(a, locator).unwrap();
        }
        table.add_connectivity(a, link).unwrap();
        (table, a, b, c)
    }

    #[test]
    fn resolves_matching_locator() {
        let b = ForwarderId::from_name("b");
        let (table, a, b, _) = topology(ConnectivityEntry::new(b, Transport::Ethernet, mac(M1)));
        let resolver = NextHopResolver::new(&table);
        assert_eq!(resolver.resolve_local_locator(a, b).unwrap().name(), "eth0");
    }

    #[test]
    fn transport_and_mac_must_both_match() {
        let b = ForwarderId::from_name("b");
        let (table, a, b, _) = topology(ConnectivityEntry::new(b, Transport::Vxlan, mac(M2)));
        let resolver = NextHopResolver::new(&table);
        assert_eq!(resolver.resolve_local_locator(a, b).unwrap().name(), "vx0");

        // same MAC, other transport
        let (table, a, b, _) = topology(ConnectivityEntry::new(b, Transport::Gre, mac(M2)));
        assert!(NextHopResolver::new(&table).resolve_local_locator(a, b).is_none());

        // same transport, other MAC
        let (table, a, b, _) = topology(ConnectivityEntry::new(
            b,
            Transport::Vxlan,
            mac(Mac([0x02, 0, 0, 0, 0, 3])),
        ));
        assert!(NextHopResolver::new(&table).resolve_local_locator(a, b).is_none());
    }

    #[test]
    fn first_match_wins() {
        let b = ForwarderId::from_name("b");
        let (mut table, a, b, _) = topology(ConnectivityEntry::new(b, Transport::Ethernet, mac(M2)));
        table
            .add_locator(a, Locator::new("eth2", Transport::Ethernet, mac(M2)))
            .unwrap();
        let resolver = NextHopResolver::new(&table);
        assert_eq!(resolver.resolve_local_locator(a, b).unwrap().name(), "eth1");
    }

    #[test]
    #[traced_test]
    fn unresolvable() {
        let b = ForwarderId::from_name("b");
        let (table, a, b, c) = topology(ConnectivityEntry::new(b, Transport::Ethernet, mac(M1)));
        let resolver = NextHopResolver::new(&table);
        assert!(resolver.resolve_local_locator(a, a).is_none());
        assert!(resolver.resolve_local_locator(a, c).is_none());
        assert!(logs_contain("No link from forwarder"));
        // links are directed
        assert!(resolver.resolve_local_locator(b, a).is_none());
        assert!(resolver.resolve_local_locator(ForwarderId::new(), b).is_none());
    }

    #[test]
    fn non_mac_link() {
        let b = ForwarderId::from_name("b");
        let link = ConnectivityEntry::new(
            b,
            Transport::Vxlan,
            LocatorKind::Ip {
                ip: "10.0.0.2".parse().unwrap(),
                port: 4789,
            },
        );
        let (table, a, b, _) = topology(link);
        assert!(NextHopResolver::new(&table).resolve_local_locator(a, b).is_none());
    }

    #[test]
    fn through_trait_object() {
        let b = ForwarderId::from_name("b");
        let (table, a, b, _) = topology(ConnectivityEntry::new(b, Transport::Ethernet, mac(M1)));
        let registry: &dyn ForwarderRegistry = &table;
        let resolver = NextHopResolver::new(registry);
        assert_eq!(resolver.resolve_local_locator(a, b).unwrap().mac(), Some(M1));
    }
}
