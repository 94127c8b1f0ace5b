// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Read access to forwarder locators and links, and an in-memory table providing it.

use crate::locator::{ConnectivityEntry, ForwarderId, Locator};
use ahash::RandomState;
use std::collections::HashMap;
use thiserror::Error;

/// What the next-hop resolution needs to know about forwarders.
///
/// Whoever owns forwarder and topology state implements this. Resolution never writes through
/// it.
pub trait ForwarderRegistry {
    /// All locators advertised by `forwarder`, in advertisement order
    fn locators(&self, forwarder: ForwarderId) -> Option<&[Locator]>;
    /// The link from `from` to `to`, as recorded on `from`
    fn connectivity(&self, from: ForwarderId, to: ForwarderId) -> Option<&ConnectivityEntry>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown forwarder {0}")]
    UnknownForwarder(ForwarderId),
    #[error("Forwarder {0} cannot link to itself")]
    SelfLink(ForwarderId),
}

/// Locators and links of one forwarder
#[derive(Debug, Clone)]
pub struct ForwarderEntry {
    name: String,
    locators: Vec<Locator>,
    links: HashMap<ForwarderId, ConnectivityEntry, RandomState>,
}

impl ForwarderEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            locators: Vec::new(),
            links: HashMap::with_hasher(RandomState::with_seed(0)),
        }
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }
    pub fn links(&self) -> impl Iterator<Item = &ConnectivityEntry> {
        self.links.values()
    }
}

/// A table of forwarders
#[derive(Debug, Clone)]
pub struct ForwarderTable(HashMap<ForwarderId, ForwarderEntry, RandomState>);

impl ForwarderTable {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::with_hasher(RandomState::with_seed(0)))
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&ForwarderId, &ForwarderEntry)> {
        self.0.iter()
    }
    #[must_use]
    pub fn get_forwarder(&self, id: ForwarderId) -> Option<&ForwarderEntry> {
        self.0.get(&id)
    }

    /// Add a forwarder with no locators and no links. Re-adding an existing forwarder only
    /// renames it.
    pub fn add_forwarder(&mut self, id: ForwarderId, name: impl Into<String>) {
        let name = name.into();
        self.0
            .entry(id)
            .and_modify(|entry| entry.name.clone_from(&name))
            .or_insert_with(|| ForwarderEntry::new(name));
    }

    /// Remove a forwarder along with every link pointing to it
    pub fn del_forwarder(&mut self, id: ForwarderId) -> Option<ForwarderEntry> {
        let removed = self.0.remove(&id)?;
        for entry in self.0.values_mut() {
            entry.links.remove(&id);
        }
        Some(removed)
    }

    /// Append `locator` to the locators advertised by `id`
    ///
    /// # Errors
    ///
    /// Fails if the forwarder is unknown.
    pub fn add_locator(&mut self, id: ForwarderId, locator: Locator) -> Result<(), RegistryError> {
        self.0
            .get_mut(&id)
            .ok_or(RegistryError::UnknownForwarder(id))?
            .locators
            .push(locator);
        Ok(())
    }

    /// Remove the locator called `name` from `id`, if present
    pub fn del_locator(&mut self, id: ForwarderId, name: &str) -> Option<Locator> {
        let locators = &mut self.0.get_mut(&id)?.locators;
        let pos = locators.iter().position(|l| l.name() == name)?;
        Some(locators.remove(pos))
    }

    /// Record the link from `from` to `link.neighbor()`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Fails if either forwarder is unknown or if the link loops back to `from`.
    pub fn add_connectivity(
        &mut self,
        from: ForwarderId,
        link: ConnectivityEntry,
    ) -> Result<(), RegistryError> {
        let to = link.neighbor();
        if from == to {
            return Err(RegistryError::SelfLink(from));
        }
        if !self.0.contains_key(&to) {
            return Err(RegistryError::UnknownForwarder(to));
        }
        self.0
            .get_mut(&from)
            .ok_or(RegistryError::UnknownForwarder(from))?
            .links
            .insert(to, link);
        Ok(())
    }

    pub fn del_connectivity(&mut self, from: ForwarderId, to: ForwarderId) -> Option<ConnectivityEntry> {
        self.0.get_mut(&from)?.links.remove(&to)
    }
}

impl Default for ForwarderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ForwarderRegistry for ForwarderTable {
    fn locators(&self, forwarder: ForwarderId) -> Option<&[Locator]> {
        self.0.get(&forwarder).map(ForwarderEntry::locators)
    }
    fn connectivity(&self, from: ForwarderId, to: ForwarderId) -> Option<&ConnectivityEntry> {
        self.0.get(&from)?.links.get(&to)
    }
}
