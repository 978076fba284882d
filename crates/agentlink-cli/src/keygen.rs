//! # Keygen Subcommand
//!
//! Generates a secp256k1 key. The private key is written as 64 hex chars,
//! the format `EnvKeyProvider` reads.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use agentlink_crypto::EthSigningKey;

/// Arguments for `agentlink keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the private key here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `agentlink keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let key = EthSigningKey::generate();
    let address = key.address();
    let secret = key.to_hex();

    match &args.out {
        Some(path) => {
            write_secret(path, &secret)?;
            println!("OK: generated secp256k1 key");
            println!("  Private key: {}", path.display());
            println!("  Address:     {address}");
        }
        None => {
            println!("{}", secret.as_str());
            eprintln!("address: {address}");
        }
    }
    tracing::info!(address = %address, "key generated");
    Ok(0)
}

#[cfg(unix)]
fn write_secret(path: &std::path::Path, secret: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create key file: {}", path.display()))?;
    file.write_all(secret.as_bytes())
        .with_context(|| format!("failed to write key file: {}", path.display()))
}

#[cfg(not(unix))]
fn write_secret(path: &std::path::Path, secret: &str) -> Result<()> {
    std::fs::write(path, secret)
        .with_context(|| format!("failed to write key file: {}", path.display()))
}
