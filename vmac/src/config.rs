// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration of the virtual MAC scheme.

use crate::chainid::ChainIdAllocator;
use crate::codec::AddressCodec;
use crate::errors::VmacError;
use crate::layout::VmacLayout;
use concurrency::sync::Arc;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracectl::{TraceCtlError, TracingControl};
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Bad tracing configuration: {0}")]
    Tracing(#[from] TraceCtlError),
    #[error("max-chains must be in [1, {capacity}], got {requested}")]
    MaxChains { requested: usize, capacity: usize },
    #[error(transparent)]
    Vmac(#[from] VmacError),
}

pub type ConfigResult<T = ()> = Result<T, ConfigError>;

/// Settings of the virtual MAC scheme, usually read from YAML:
///
/// ```yaml
/// layout:
///   version: 1
///   prefix: 15728640
///   port-len: 6
///   cid-len: 8
///   hop-len: 8
/// max-chains: 128
/// tracing: "default=info,vmac=debug"
/// ```
///
/// Every field is optional.
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VmacConfig {
    #[builder(default)]
    #[serde(default)]
    pub layout: VmacLayout,

    /// Cap on the number of chains bound at once. Defaults to one per chain id.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chains: Option<usize>,

    /// Tracing levels, as accepted by [`TracingControl::setup_from_string`]
    #[builder(default, setter(into, strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing: Option<String>,
}

impl VmacConfig {
    /// Parse a YAML document. The layout is checked while parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid YAML, has unknown keys or
    /// describes an invalid layout.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Number of chain ids the allocator will manage
    #[must_use]
    pub fn chain_capacity(&self) -> usize {
        self.max_chains
            .unwrap_or_else(|| self.layout.chain_id_capacity())
    }

    /// # Errors
    ///
    /// Fails if `max-chains` does not fit the layout or if the tracing string does not parse.
    pub fn validate(&self) -> ConfigResult {
        let capacity = self.layout.chain_id_capacity();
        if let Some(requested) = self.max_chains.filter(|n| *n == 0 || *n > capacity) {
            return Err(ConfigError::MaxChains {
                requested,
                capacity,
            });
        }
        if let Some(tracing) = &self.tracing {
            TracingControl::check_config(tracing)?;
        }
        Ok(())
    }

    /// Validate and build a codec backed by a fresh allocator.
    ///
    /// The tracing levels are not applied here: the process-wide subscriber belongs to the
    /// embedding program, which applies them with [`VmacConfig::apply_tracing`].
    ///
    /// # Errors
    ///
    /// See [`VmacConfig::validate`].
    pub fn build(&self) -> ConfigResult<AddressCodec> {
        self.validate()?;
        let allocator = Arc::new(ChainIdAllocator::with_capacity(self.chain_capacity()));
        let codec = AddressCodec::new(self.layout, allocator)?;
        info!(
            "Virtual MAC layout v{} with {} chain ids",
            self.layout.version(),
            self.chain_capacity()
        );
        Ok(codec)
    }

    /// Apply the tracing levels, if any, through `tracectl`, usually [`tracectl::get_trace_ctl`].
    ///
    /// # Errors
    ///
    /// Fails without changing any level if the tracing string does not parse.
    pub fn apply_tracing(&self, tracectl: &TracingControl) -> ConfigResult {
        if let Some(tracing) = &self.tracing {
            tracectl.setup_from_string(tracing)?;
        }
        Ok(())
    }
}
