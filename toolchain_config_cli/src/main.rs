use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use toolchain_config::{Exposure, ToolchainConfig};

#[derive(Parser)]
#[command(name = "toolchain-config", about = "Load and inspect the toolchain network config")]
struct Cli {
    /// Read variables from this dotenv file instead of `./.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a redacted summary of every network
    Show,
    /// Validate the config and build a signer for every network with accounts
    Check,
    /// Write the config in the shape the build tool reads
    Export {
        /// Include api keys and private keys in the output
        #[arg(long)]
        reveal: bool,
        /// Output file, stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load(&cli)?;

    match cli.command {
        Command::Show => show(&config),
        Command::Check => check(&config)?,
        Command::Export { reveal, out } => export(&config, reveal, out)?,
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<ToolchainConfig> {
    match &cli.env_file {
        Some(path) => ToolchainConfig::from_env_file(path)
            .with_context(|| format!("loading config with env file {}", path.display())),
        None => ToolchainConfig::from_env().context("loading config from environment"),
    }
}

fn show(config: &ToolchainConfig) {
    println!("solidity: {}", config.solidity());
    println!("default network: {}", config.default_network_name());
    for (name, network) in config.networks() {
        println!("network {name}:");
        if let Some(chain_id) = network.chain_id {
            println!("  chainId: {chain_id}");
        }
        if let Some(url) = &network.url {
            println!("  url: {}", url.redacted());
        }
        if !network.accounts.is_empty() {
            println!("  accounts: {}", network.accounts.len());
        }
    }
}

fn check(config: &ToolchainConfig) -> Result<()> {
    config.validate()?;

    for (name, network) in config.networks() {
        if network.accounts.is_empty() {
            info!("{name}: no accounts, nothing to sign with");
            continue;
        }
        for index in 0..network.accounts.len() {
            let signer = config
                .signer(name, index)
                .with_context(|| format!("building signer for {name} account {index}"))?;
            println!("{name} account {index}: {:?}", signer.address());
        }
    }

    info!("Config OK");
    Ok(())
}

fn export(config: &ToolchainConfig, reveal: bool, out: Option<PathBuf>) -> Result<()> {
    let exposure = if reveal {
        warn!("Export includes secret values, do not commit the output");
        Exposure::Revealed
    } else {
        Exposure::Redacted
    };

    let json = config.to_json_string(exposure)?;
    match out {
        Some(path) => {
            write_output(&path, &json, exposure)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote config to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str, exposure: Exposure) -> std::io::Result<()> {
    let mut file = open_output(path, exposure == Exposure::Revealed)?;
    file.write_all(contents.as_bytes())
}

// Files holding revealed secrets are readable by the owner only.
#[cfg(unix)]
fn open_output(path: &Path, owner_only: bool) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if owner_only {
        options.mode(0o600);
    }

    let file = options.open(path)?;
    if owner_only {
        // mode only applies to newly created files
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

#[cfg(not(unix))]
fn open_output(path: &Path, _owner_only: bool) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
