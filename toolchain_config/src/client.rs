use std::{str::FromStr, sync::Arc};

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::Chain,
};
use log::debug;

use crate::{
    config::{NetworkConfig, ToolchainConfig},
    error::ConfigError,
};

pub type EtherSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// The configured chain id, else the well-known id for the network name (e.g. `sepolia`).
pub fn resolve_chain_id(name: &str, network: &NetworkConfig) -> Result<u64, ConfigError> {
    network
        .chain_id
        .or_else(|| Chain::from_str(name).ok().map(u64::from))
        .ok_or_else(|| ConfigError::UnknownChainId(name.to_owned()))
}

/// Build a signing client for `accounts[account_index]` of a network. Nothing is sent over the wire.
pub fn signer_for(
    name: &str,
    network: &NetworkConfig,
    account_index: usize,
) -> Result<Arc<EtherSigner>, ConfigError> {
    let endpoint = network
        .url
        .as_ref()
        .ok_or_else(|| ConfigError::MissingUrl(name.to_owned()))?;

    let key = network
        .accounts
        .get(account_index)
        .ok_or_else(|| ConfigError::MissingAccount {
            network: name.to_owned(),
            index: account_index,
        })?;

    let chain_id = resolve_chain_id(name, network)?;

    let wallet = LocalWallet::from_str(key.expose())
        .map_err(|_| ConfigError::InvalidPrivateKey {
            network: name.to_owned(),
            index: account_index,
        })?
        .with_chain_id(chain_id);

    let provider = Provider::<Http>::try_from(endpoint.expose_url()).map_err(|e| {
        ConfigError::InvalidUrl {
            network: name.to_owned(),
            reason: e.to_string(),
        }
    })?;

    debug!(
        "Built signer {:?} for network {name} (chain {chain_id}) at {}",
        wallet.address(),
        endpoint.redacted()
    );
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

impl ToolchainConfig {
    pub fn signer(&self, network: &str, account_index: usize) -> Result<Arc<EtherSigner>, ConfigError> {
        signer_for(network, self.network(network)?, account_index)
    }
}
