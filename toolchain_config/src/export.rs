//! The key-value surface handed to the external build tool.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::{NetworkConfig, ToolchainConfig},
    error::ConfigError,
    secrets::REDACTED,
};

/// Whether secret values are written out as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exposure {
    Redacted,
    Revealed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedConfig {
    pub solidity: String,
    /// Left out when it is the tool's own default.
    #[serde(skip_serializing_if = "is_tool_default_network")]
    pub default_network: String,
    pub networks: BTreeMap<String, ExportedNetwork>,
}

fn is_tool_default_network(name: &String) -> bool {
    name == ToolchainConfig::DEFAULT_NETWORK
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
}

impl ExportedNetwork {
    fn new(network: &NetworkConfig, exposure: Exposure) -> Self {
        let url = network.url.as_ref().map(|endpoint| match exposure {
            Exposure::Redacted => endpoint.redacted().to_owned(),
            Exposure::Revealed => endpoint.expose_url().to_owned(),
        });

        let accounts = network
            .accounts
            .iter()
            .map(|key| match exposure {
                Exposure::Redacted => REDACTED.to_owned(),
                Exposure::Revealed => key.expose().to_owned(),
            })
            .collect();

        Self {
            chain_id: network.chain_id,
            url,
            accounts,
        }
    }
}

impl ToolchainConfig {
    pub fn export(&self, exposure: Exposure) -> ExportedConfig {
        ExportedConfig {
            solidity: self.solidity().to_string(),
            default_network: self.default_network_name().to_owned(),
            networks: self
                .networks()
                .map(|(name, network)| (name.to_owned(), ExportedNetwork::new(network, exposure)))
                .collect(),
        }
    }

    pub fn to_json_string(&self, exposure: Exposure) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.export(exposure))?)
    }
}
