pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod secrets;

pub use config::{CompilerVersion, NetworkConfig, RpcEndpoint, ToolchainConfig};
pub use error::ConfigError;
pub use export::Exposure;
pub use secrets::Secret;
