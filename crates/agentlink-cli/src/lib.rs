//! # agentlink-cli — the `agentlink` tool
//!
//! Offline access to the credential pipeline:
//!
//! ```bash
//! agentlink keygen --out signer.key
//! agentlink assemble --agent 0x… --identity user.json --declaration "Acts as my trading bot" --out vc.json
//! agentlink hash vc.json
//! AGENTLINK_SIGNER_KEY=$(cat signer.key) agentlink sign vc.json --out signed.json
//! agentlink verify signed.json      # exit 0 valid, 1 invalid, 2 unsigned
//! agentlink attach vc.json --signature 0x… --signer 0x… --out signed.json
//! ```

pub mod credential;
pub mod keygen;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use agentlink_link::LinkConfig;

/// AgentLink credential toolchain.
///
/// Assembles, hashes, signs and verifies credentials binding an agent
/// wallet to a verified human.
#[derive(Parser, Debug)]
#[command(name = "agentlink", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a secp256k1 signing key.
    Keygen(keygen::KeygenArgs),
    /// Build an issued, unsigned credential from an identity record.
    Assemble(credential::AssembleArgs),
    /// Print the canonical keccak256 hash of a credential.
    Hash(credential::HashArgs),
    /// Sign a credential with a key from the environment.
    Sign(credential::SignArgs),
    /// Verify a credential's signature.
    Verify(credential::VerifyArgs),
    /// Attach an externally produced wallet signature.
    Attach(credential::AttachArgs),
}

/// Run a parsed command. Returns the process exit code.
pub fn run(cli: &Cli) -> Result<u8> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Commands::Keygen(args) => keygen::run_keygen(args),
        Commands::Assemble(args) => credential::run_assemble(args, &config),
        Commands::Hash(args) => credential::run_hash(args),
        Commands::Sign(args) => credential::run_sign(args, &config),
        Commands::Verify(args) => credential::run_verify(args),
        Commands::Attach(args) => credential::run_attach(args),
    }
}

/// Load the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<LinkConfig> {
    match path {
        Some(p) => LinkConfig::from_yaml_file(p)
            .with_context(|| format!("failed to load config: {}", p.display())),
        None => Ok(LinkConfig::default()),
    }
}

/// Write `content` to `out`, or to stdout when `out` is `None`.
pub(crate) fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
