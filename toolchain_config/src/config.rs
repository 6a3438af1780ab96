use std::{collections::BTreeMap, fmt, str::FromStr};

use url::Url;

use crate::{error::ConfigError, secrets::Secret};

/// Version of the solidity compiler the external toolchain should invoke, e.g. `0.8.18`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CompilerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidCompilerVersion(s.to_owned());

        let mut parts = s.split('.').map(|part| {
            // leading zeros would not survive a round trip through Display
            if part.is_empty()
                || !part.bytes().all(|b| b.is_ascii_digit())
                || (part.len() > 1 && part.starts_with('0'))
            {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        });

        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self::new(major?, minor?, patch?))
    }
}

impl FromStr for CompilerVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Stands in for the api key segment in printable urls.
pub const REDACTED_SEGMENT: &str = "***";

/// An RPC endpoint, optionally with a provider API key appended as the last path segment.
///
/// The full url is only reachable through [`RpcEndpoint::expose_url`] and is cleared on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    url: Secret,
    scheme: String,
    redacted: String,
}

impl RpcEndpoint {
    /// An endpoint with nothing secret in it.
    pub fn public(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        Ok(Self {
            scheme: url.scheme().to_owned(),
            redacted: url.to_string(),
            url: Secret::new(String::from(url)),
        })
    }

    /// `base` with the api key pushed as a path segment, e.g. `https://sepolia.infura.io/v3/{key}`.
    /// Query and fragment of `base` are kept after the key.
    pub fn with_api_key(base: &str, api_key: &Secret) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        let with_segment = |segment: &str| -> Result<Url, url::ParseError> {
            let mut endpoint = base.clone();
            endpoint
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop_if_empty()
                .push(segment);
            Ok(endpoint)
        };

        Ok(Self {
            scheme: base.scheme().to_owned(),
            redacted: with_segment(REDACTED_SEGMENT)?.to_string(),
            url: Secret::new(String::from(with_segment(api_key.expose())?)),
        })
    }

    pub fn expose_url(&self) -> &str {
        self.url.expose()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RpcEndpoint").field(&self.redacted).finish()
    }
}

/// Connection parameters of one named network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: Option<u64>,
    pub url: Option<RpcEndpoint>,
    /// private keys used to sign outgoing transactions, in order
    pub accounts: Vec<Secret>,
}

impl NetworkConfig {
    pub fn local(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..Default::default()
        }
    }

    pub fn remote(url: RpcEndpoint, accounts: Vec<Secret>) -> Self {
        Self {
            chain_id: None,
            url: Some(url),
            accounts,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.chain_id == Some(0) {
            return Err(ConfigError::InvalidChainId(name.to_owned()));
        }

        if let Some(endpoint) = &self.url {
            let scheme = endpoint.scheme();
            if scheme != "http" && scheme != "https" {
                return Err(ConfigError::InvalidUrl {
                    network: name.to_owned(),
                    reason: format!("unsupported scheme {scheme}"),
                });
            }
        }

        for (index, account) in self.accounts.iter().enumerate() {
            if !is_private_key(account.expose()) {
                return Err(ConfigError::InvalidPrivateKey {
                    network: name.to_owned(),
                    index,
                });
            }
        }

        Ok(())
    }
}

/// 32 bytes of hex, with or without a `0x` prefix.
pub fn is_private_key(key: &str) -> bool {
    let key = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key);
    key.len() == 64 && hex::decode(key).is_ok()
}

/// The settings the external toolchain reads once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainConfig {
    solidity: CompilerVersion,
    default_network: String,
    networks: BTreeMap<String, NetworkConfig>,
}

impl ToolchainConfig {
    pub const DEFAULT_NETWORK: &'static str = "hardhat";

    pub fn new(solidity: CompilerVersion) -> Self {
        Self {
            solidity,
            default_network: Self::DEFAULT_NETWORK.to_owned(),
            networks: BTreeMap::new(),
        }
    }

    pub fn with_default_network(mut self, name: impl Into<String>) -> Self {
        self.default_network = name.into();
        self
    }

    pub fn add_network(
        &mut self,
        name: impl Into<String>,
        network: NetworkConfig,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyNetworkName);
        }
        if self.networks.contains_key(&name) {
            return Err(ConfigError::DuplicateNetwork(name));
        }
        self.networks.insert(name, network);
        Ok(())
    }

    pub fn solidity(&self) -> CompilerVersion {
        self.solidity
    }

    pub fn default_network_name(&self) -> &str {
        &self.default_network
    }

    pub fn default_network(&self) -> Result<&NetworkConfig, ConfigError> {
        self.network(&self.default_network)
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_owned()))
    }

    pub fn networks(&self) -> impl Iterator<Item = (&str, &NetworkConfig)> {
        self.networks.iter().map(|(name, net)| (name.as_str(), net))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.networks.contains_key(&self.default_network) {
            return Err(ConfigError::UnknownNetwork(self.default_network.clone()));
        }
        for (name, network) in &self.networks {
            network.validate(name)?;
        }
        Ok(())
    }
}
