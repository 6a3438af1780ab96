use std::{collections::HashMap, path::Path};

use log::{debug, info};

use crate::{
    config::{CompilerVersion, NetworkConfig, RpcEndpoint, ToolchainConfig},
    error::ConfigError,
    secrets::{
        optional, require, EnvSource, Layered, ProcessEnv, Secret, INFURA_API_KEY_ENV_VAR,
        SEPOLIA_PRIVATE_KEY_ENV_VAR,
    },
};

pub const SOLIDITY_VERSION_ENV_VAR: &str = "SOLIDITY_VERSION";

pub const DEFAULT_SOLIDITY_VERSION: CompilerVersion = CompilerVersion::new(0, 8, 18);

pub const LOCAL_NETWORK: &str = "hardhat";
pub const LOCAL_CHAIN_ID: u64 = 1337;

pub const SEPOLIA_NETWORK: &str = "sepolia";
pub const SEPOLIA_RPC_BASE_URL: &str = "https://sepolia.infura.io/v3/";

impl ToolchainConfig {
    /// Load `.env` if there is one, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_source(&ProcessEnv)
    }

    /// Variables already set in the process environment take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(path)?;
        Self::from_source(&Layered {
            primary: ProcessEnv,
            fallback: file,
        })
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        let solidity = match optional(source, SOLIDITY_VERSION_ENV_VAR) {
            Some(v) => {
                debug!("Using compiler version override from {SOLIDITY_VERSION_ENV_VAR}");
                CompilerVersion::parse(&v)?
            }
            None => DEFAULT_SOLIDITY_VERSION,
        };

        let api_key = require(source, INFURA_API_KEY_ENV_VAR)?;
        check_api_key(&api_key)?;
        let sepolia_key = require(source, SEPOLIA_PRIVATE_KEY_ENV_VAR)?;

        let sepolia_url =
            RpcEndpoint::with_api_key(SEPOLIA_RPC_BASE_URL, &api_key).map_err(|e| {
                ConfigError::InvalidUrl {
                    network: SEPOLIA_NETWORK.to_owned(),
                    reason: e.to_string(),
                }
            })?;

        let mut config =
            ToolchainConfig::new(solidity).with_default_network(LOCAL_NETWORK);
        config.add_network(LOCAL_NETWORK, NetworkConfig::local(LOCAL_CHAIN_ID))?;
        config.add_network(
            SEPOLIA_NETWORK,
            NetworkConfig::remote(sepolia_url, vec![sepolia_key]),
        )?;
        config.validate()?;

        info!(
            "Loaded toolchain config: solidity {}, {} networks",
            config.solidity(),
            config.networks().count()
        );
        Ok(config)
    }
}

/// Parse a dotenv file without touching the process environment.
pub fn read_env_file(path: impl AsRef<Path>) -> Result<HashMap<String, String>, ConfigError> {
    let path = path.as_ref();
    let to_err = |source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    dotenv::from_path_iter(path)
        .map_err(to_err)?
        .map(|item| item.map_err(to_err))
        .collect()
}

// The key becomes a path segment of the rpc url.
fn check_api_key(key: &Secret) -> Result<(), ConfigError> {
    let valid = key
        .expose()
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidApiKey(INFURA_API_KEY_ENV_VAR))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TEST_API_KEY: &str = "test-project-key";

    fn test_private_key() -> String {
        format!("0x{}", "11".repeat(32))
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (INFURA_API_KEY_ENV_VAR, TEST_API_KEY),
            (SEPOLIA_PRIVATE_KEY_ENV_VAR, &test_private_key()),
        ])
    }

    #[test]
    fn test_load_builds_both_networks() {
        let config = ToolchainConfig::from_source(&full_env()).unwrap();

        assert_eq!(config.solidity().to_string(), "0.8.18");
        assert_eq!(config.default_network_name(), LOCAL_NETWORK);

        let names: Vec<_> = config.networks().map(|(name, _)| name).collect();
        assert_eq!(names, vec![LOCAL_NETWORK, SEPOLIA_NETWORK]);

        let local = config.network(LOCAL_NETWORK).unwrap();
        assert_eq!(local.chain_id, Some(1337));
        assert!(local.url.is_none());
        assert!(local.accounts.is_empty());

        let sepolia = config.network(SEPOLIA_NETWORK).unwrap();
        assert_eq!(sepolia.chain_id, None);
        assert_eq!(
            sepolia.url.as_ref().unwrap().expose_url(),
            format!("https://sepolia.infura.io/v3/{TEST_API_KEY}")
        );
        assert_eq!(sepolia.accounts.len(), 1);
        assert_eq!(sepolia.accounts[0].expose(), test_private_key());
    }

    #[test]
    fn test_load_fails_fast_on_missing_api_key() {
        let source = env(&[(SEPOLIA_PRIVATE_KEY_ENV_VAR, &test_private_key())]);
        assert!(matches!(
            ToolchainConfig::from_source(&source),
            Err(ConfigError::MissingVar(INFURA_API_KEY_ENV_VAR))
        ));
    }

    #[test]
    fn test_load_fails_fast_on_missing_private_key() {
        let source = env(&[(INFURA_API_KEY_ENV_VAR, TEST_API_KEY)]);
        assert!(matches!(
            ToolchainConfig::from_source(&source),
            Err(ConfigError::MissingVar(SEPOLIA_PRIVATE_KEY_ENV_VAR))
        ));
    }

    #[test]
    fn test_load_rejects_malformed_private_key_without_echoing_it() {
        let mut source = full_env();
        source.insert(SEPOLIA_PRIVATE_KEY_ENV_VAR.to_owned(), "0xnope".to_owned());

        let err = ToolchainConfig::from_source(&source).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrivateKey { index: 0, .. }));
        assert!(!err.to_string().contains("0xnope"));
    }

    #[test]
    fn test_load_rejects_api_key_that_would_change_the_url() {
        let mut source = full_env();
        source.insert(INFURA_API_KEY_ENV_VAR.to_owned(), "abc/../other".to_owned());

        assert!(matches!(
            ToolchainConfig::from_source(&source),
            Err(ConfigError::InvalidApiKey(INFURA_API_KEY_ENV_VAR))
        ));
    }

    #[test]
    fn test_compiler_version_override() {
        let mut source = full_env();
        source.insert(SOLIDITY_VERSION_ENV_VAR.to_owned(), "0.8.24".to_owned());
        let config = ToolchainConfig::from_source(&source).unwrap();
        assert_eq!(config.solidity(), CompilerVersion::new(0, 8, 24));

        source.insert(SOLIDITY_VERSION_ENV_VAR.to_owned(), "latest".to_owned());
        assert!(matches!(
            ToolchainConfig::from_source(&source),
            Err(ConfigError::InvalidCompilerVersion(v)) if v == "latest"
        ));
    }

    #[test]
    fn test_read_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# deployer secrets").unwrap();
        writeln!(file, "{INFURA_API_KEY_ENV_VAR}={TEST_API_KEY}").unwrap();
        writeln!(file, "{SEPOLIA_PRIVATE_KEY_ENV_VAR}={}", test_private_key()).unwrap();
        file.flush().unwrap();

        let vars = read_env_file(file.path()).unwrap();
        assert_eq!(vars.get(INFURA_API_KEY_ENV_VAR).unwrap(), TEST_API_KEY);

        let config = ToolchainConfig::from_source(&vars).unwrap();
        assert_eq!(
            config.network(SEPOLIA_NETWORK).unwrap().accounts[0].expose(),
            test_private_key()
        );
    }

    #[test]
    fn test_read_env_file_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.env");
        assert!(matches!(
            read_env_file(&path),
            Err(ConfigError::EnvFile { path: p, .. }) if p == path
        ));
    }

    #[test]
    fn test_set_variables_win_over_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{INFURA_API_KEY_ENV_VAR}=file-project-key").unwrap();
        writeln!(file, "{SEPOLIA_PRIVATE_KEY_ENV_VAR}={}", test_private_key()).unwrap();
        writeln!(file, "{SOLIDITY_VERSION_ENV_VAR}=0.8.20").unwrap();
        file.flush().unwrap();

        let source = Layered {
            primary: env(&[
                (INFURA_API_KEY_ENV_VAR, "shell-project-key"),
                (SOLIDITY_VERSION_ENV_VAR, ""),
            ]),
            fallback: read_env_file(file.path()).unwrap(),
        };
        let config = ToolchainConfig::from_source(&source).unwrap();

        let sepolia = config.network(SEPOLIA_NETWORK).unwrap();
        assert_eq!(
            sepolia.url.as_ref().unwrap().expose_url(),
            "https://sepolia.infura.io/v3/shell-project-key"
        );
        // only in the file
        assert_eq!(sepolia.accounts[0].expose(), test_private_key());
        // blank in the shell counts as set, so the file value is not used
        assert_eq!(config.solidity(), DEFAULT_SOLIDITY_VERSION);
    }
}
