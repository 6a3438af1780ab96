use std::path::PathBuf;

/// Errors raised while loading, validating or consuming a [`crate::config::ToolchainConfig`].
///
/// Messages name the offending variable or network, never the secret value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid compiler version {0:?}, expected MAJOR.MINOR.PATCH")]
    InvalidCompilerVersion(String),
    #[error("Invalid url for network {network}: {reason}")]
    InvalidUrl { network: String, reason: String },
    #[error("Invalid chain id for network {0}: must be positive")]
    InvalidChainId(String),
    #[error("Invalid private key at accounts[{index}] of network {network}")]
    InvalidPrivateKey { network: String, index: usize },
    #[error("Invalid value for: {0}")]
    InvalidApiKey(&'static str),
    #[error("Duplicate network name: {0}")]
    DuplicateNetwork(String),
    #[error("Network name must not be empty")]
    EmptyNetworkName,
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    #[error("Network {0} has no url")]
    MissingUrl(String),
    #[error("Network {network} has no account at index {index}")]
    MissingAccount { network: String, index: usize },
    #[error("No chain id configured or known for network {0}")]
    UnknownChainId(String),
    #[error("Failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}
