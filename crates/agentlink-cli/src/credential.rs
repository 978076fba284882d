//! # Credential Subcommands
//!
//! `assemble`, `hash`, `sign`, `verify` and `attach` over credential JSON
//! files.
//!
//! `verify` reads the document as raw JSON so that what is checked is
//! exactly what was received. `hash`, `sign` and `attach` share one signing
//! target: the hash of the document after it is parsed into an
//! [`AgentVc`]. A document that is not in normal form (lowercase address,
//! sub-second timestamps, unknown fields) hashes differently raw, so the
//! commands warn and work on the normalized form, and `sign`/`attach` write
//! that form back out.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use agentlink_core::{ChainAddress, ContentDigest, IdentityRecord, Timestamp};
use agentlink_crypto::{EnvKeyProvider, RecoverableSignature};
use agentlink_link::LinkConfig;
use agentlink_vc::lifecycle::{attach_signature, issue};
use agentlink_vc::{
    assemble, canonical_hash, canonical_hash_value, sign_vc, verify_value, AgentVc,
    AssembleRequest, SignatureEnvelope, VerificationOutcome,
};

use crate::write_output;

/// Arguments for `agentlink assemble`.
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Agent wallet address.
    #[arg(long)]
    pub agent: String,
    /// Path to the user's identity record (JSON).
    #[arg(long, value_name = "FILE")]
    pub identity: PathBuf,
    /// The human's declaration.
    #[arg(long)]
    pub declaration: String,
    /// Write the credential here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `agentlink hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Credential JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `agentlink sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Credential JSON file (status `issued`).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Environment variable holding the signing key. Defaults to the
    /// configured `signer.key_env`.
    #[arg(long)]
    pub key_env: Option<String>,
    /// Write the signed credential here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `agentlink verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `agentlink attach`.
#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Credential JSON file (status `issued`).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// 65-byte wallet signature over the credential hash, hex.
    #[arg(long)]
    pub signature: String,
    /// Address the signature must recover to.
    #[arg(long)]
    pub signer: String,
    /// Write the signed credential here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Exit code for a valid signature.
pub const EXIT_VALID: u8 = 0;
/// Exit code for an invalid signature.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for an unsigned credential.
pub const EXIT_UNSIGNED: u8 = 2;

/// Execute `agentlink assemble`.
pub fn run_assemble(args: &AssembleArgs, config: &LinkConfig) -> Result<u8> {
    let content = read(&args.identity)?;
    let identity: IdentityRecord = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse identity record: {}", args.identity.display()))?;

    let draft = assemble(
        AssembleRequest {
            agent_id: args.agent.clone(),
            identity,
            declaration: args.declaration.clone(),
        },
        &config.issuer_profile(),
        Timestamp::now(),
    )?;
    let vc = issue(draft)?.vc;
    let hash = canonical_hash(&vc)?;

    tracing::info!(vc_id = %vc.vc_id, hash = %hash.to_prefixed_hex(), "credential assembled");
    write_output(args.out.as_deref(), &to_json(&vc)?)?;
    Ok(0)
}

/// Execute `agentlink hash`.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let (_, hash) = read_signing_target(&args.file)?;
    println!("{}", hash.to_prefixed_hex());
    Ok(0)
}

/// Execute `agentlink sign`.
pub fn run_sign(args: &SignArgs, config: &LinkConfig) -> Result<u8> {
    let (vc, _) = read_signing_target(&args.file)?;
    let var = args.key_env.as_deref().unwrap_or(&config.signer.key_env);
    let provider = EnvKeyProvider::from_env(var)
        .with_context(|| format!("failed to load signing key from ${var}"))?;

    let envelope = sign_vc(&vc, &provider, Timestamp::now())?;
    let signed = attach_signature(vc, envelope, None)?.vc;

    tracing::info!(
        vc_id = %signed.vc_id,
        signer = ?signed.signer_address,
        "credential signed"
    );
    write_output(args.out.as_deref(), &to_json(&signed)?)?;
    Ok(0)
}

/// Execute `agentlink verify`. Exit 0 valid, 1 invalid, 2 unsigned.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let value = read_value(&args.file)?;
    let outcome = verify_value(&value);
    let code = match &outcome {
        VerificationOutcome::Valid { signer, .. } => {
            println!("OK: signature is valid (signer {signer})");
            EXIT_VALID
        }
        VerificationOutcome::Invalid { reason, recovered } => {
            match recovered {
                Some(addr) => println!("FAIL: {reason} (recovered {addr})"),
                None => println!("FAIL: {reason}"),
            }
            EXIT_INVALID
        }
        VerificationOutcome::Unsigned => {
            println!("UNSIGNED: credential carries no signature");
            EXIT_UNSIGNED
        }
    };
    Ok(code)
}

/// Execute `agentlink attach`.
pub fn run_attach(args: &AttachArgs) -> Result<u8> {
    let (vc, hash) = read_signing_target(&args.file)?;
    let signature = RecoverableSignature::from_hex(args.signature.trim())
        .context("invalid signature")?;
    let signer = ChainAddress::parse(&args.signer.trim().to_ascii_lowercase())
        .context("invalid signer address")?;

    let envelope = SignatureEnvelope {
        hash,
        signature,
        signer_address: signer,
        signed_at: Timestamp::now(),
    };
    let signed = attach_signature(vc, envelope, Some(&signer))?.vc;

    tracing::info!(vc_id = %signed.vc_id, signer = %signer, "signature attached");
    write_output(args.out.as_deref(), &to_json(&signed)?)?;
    Ok(0)
}

fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_value(path: &Path) -> Result<serde_json::Value> {
    serde_json::from_str(&read(path)?)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Parse a credential and compute the hash `sign` and `attach` sign over.
pub fn read_signing_target(path: &Path) -> Result<(AgentVc, ContentDigest)> {
    let value = read_value(path)?;
    let vc: AgentVc = serde_json::from_value(value.clone())
        .with_context(|| format!("failed to parse credential: {}", path.display()))?;
    let hash = canonical_hash(&vc)?;
    if canonical_hash_value(&value).ok() != Some(hash) {
        tracing::warn!(
            file = %path.display(),
            hash = %hash.to_prefixed_hex(),
            "credential is not in normal form; using the normalized document"
        );
    }
    Ok((vc, hash))
}

fn to_json(vc: &AgentVc) -> Result<String> {
    serde_json::to_string_pretty(vc).context("failed to serialize credential")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlink_crypto::{EthSigningKey, KeyProvider, LocalKeyProvider};
    use agentlink_vc::VcStatus;
    use serde_json::json;

    const AGENT: &str = "0x1111111111111111111111111111111111111111";

    fn read_vc(path: &Path) -> Result<AgentVc> {
        AgentVc::from_json(&read(path)?)
            .with_context(|| format!("failed to parse credential: {}", path.display()))
    }

    fn identity_file(dir: &Path) -> PathBuf {
        let path = dir.join("user.json");
        let record = json!({
            "userId": "user-U",
            "worldIdVerification": {
                "isVerified": true,
                "nullifierHash": "0xabc",
                "verificationLevel": "orb",
                "verifiedAt": "2026-01-01T00:00:00Z"
            }
        });
        std::fs::write(&path, record.to_string()).unwrap();
        path
    }

    fn assembled(dir: &Path) -> PathBuf {
        let out = dir.join("vc.json");
        run_assemble(
            &AssembleArgs {
                agent: AGENT.to_string(),
                identity: identity_file(dir),
                declaration: "Acts as my trading bot".to_string(),
                out: Some(out.clone()),
            },
            &LinkConfig::default(),
        )
        .unwrap();
        out
    }

    #[test]
    fn assemble_writes_issued_credential() {
        let dir = tempfile::tempdir().unwrap();
        let vc = read_vc(&assembled(dir.path())).unwrap();
        assert_eq!(vc.status, VcStatus::Issued);
        assert_eq!(
            vc.human_proof.world_id().unwrap().nullifier_hash.as_str(),
            "0xabc"
        );
        assert!(vc.human_proof.self_id().is_none());
        assert_eq!(run_verify(&VerifyArgs { file: dir.path().join("vc.json") }).unwrap(), EXIT_UNSIGNED);
    }

    #[test]
    fn assemble_rejects_bad_agent() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_assemble(
            &AssembleArgs {
                agent: "0x1234".to_string(),
                identity: identity_file(dir.path()),
                declaration: "x".to_string(),
                out: None,
            },
            &LinkConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn sign_then_verify_with_env_key() {
        let dir = tempfile::tempdir().unwrap();
        let vc_path = assembled(dir.path());
        let key = EthSigningKey::generate();
        let var = "AGENTLINK_CLI_TEST_SIGN_KEY";
        std::env::set_var(var, key.to_hex().as_str());

        let signed_path = dir.path().join("signed.json");
        let code = run_sign(
            &SignArgs {
                file: vc_path,
                key_env: Some(var.to_string()),
                out: Some(signed_path.clone()),
            },
            &LinkConfig::default(),
        )
        .unwrap();
        std::env::remove_var(var);
        assert_eq!(code, 0);

        let signed = read_vc(&signed_path).unwrap();
        assert_eq!(signed.signer_address, Some(key.address()));
        assert_eq!(run_verify(&VerifyArgs { file: signed_path.clone() }).unwrap(), EXIT_VALID);

        let mut doc = read_value(&signed_path).unwrap();
        doc["declaration"]["description"] = json!("Acts as my trading bot!");
        let tampered = dir.path().join("tampered.json");
        std::fs::write(&tampered, doc.to_string()).unwrap();
        assert_eq!(run_verify(&VerifyArgs { file: tampered }).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn sign_without_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_sign(
            &SignArgs {
                file: assembled(dir.path()),
                key_env: Some("AGENTLINK_CLI_TEST_ABSENT_KEY".to_string()),
                out: None,
            },
            &LinkConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn attach_wallet_signature() {
        let dir = tempfile::tempdir().unwrap();
        let vc_path = assembled(dir.path());
        let wallet = LocalKeyProvider::generate();
        let hash = canonical_hash(&read_vc(&vc_path).unwrap()).unwrap();
        let sig = wallet.sign_message(&hash.bytes).unwrap();

        let out = dir.path().join("attached.json");
        run_attach(&AttachArgs {
            file: vc_path.clone(),
            signature: sig.to_hex(),
            signer: wallet.address().unwrap().to_checksum(),
            out: Some(out.clone()),
        })
        .unwrap();
        assert_eq!(run_verify(&VerifyArgs { file: out }).unwrap(), EXIT_VALID);

        let wrong = run_attach(&AttachArgs {
            file: vc_path,
            signature: sig.to_hex(),
            signer: EthSigningKey::generate().address().to_checksum(),
            out: None,
        });
        assert!(wrong.is_err());
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let vc_path = assembled(dir.path());
        let value = read_value(&vc_path).unwrap();
        let expected = canonical_hash_value(&value).unwrap();

        let reordered: serde_json::Map<String, serde_json::Value> = value
            .as_object()
            .unwrap()
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let reordered_value = serde_json::Value::Object(reordered);
        assert_eq!(canonical_hash_value(&reordered_value).unwrap(), expected);
        assert_eq!(run_hash(&HashArgs { file: vc_path }).unwrap(), 0);
    }

    #[test]
    fn hash_sign_attach_agree_on_unnormalized_document() {
        let dir = tempfile::tempdir().unwrap();
        let vc_path = dir.path().join("vc.json");
        run_assemble(
            &AssembleArgs {
                agent: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
                identity: identity_file(dir.path()),
                declaration: "Acts as my trading bot".to_string(),
                out: Some(vc_path.clone()),
            },
            &LinkConfig::default(),
        )
        .unwrap();

        let mut doc = read_value(&vc_path).unwrap();
        doc["agentId"] = json!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        doc["issuedAt"] = json!("2026-02-01T00:00:00.250Z");
        let loose = dir.path().join("loose.json");
        std::fs::write(&loose, doc.to_string()).unwrap();

        let (_, hash) = read_signing_target(&loose).unwrap();
        assert_ne!(canonical_hash_value(&doc).unwrap(), hash);
        assert_eq!(run_hash(&HashArgs { file: loose.clone() }).unwrap(), 0);

        let wallet = LocalKeyProvider::generate();
        let sig = wallet.sign_message(&hash.bytes).unwrap();
        let out = dir.path().join("attached.json");
        run_attach(&AttachArgs {
            file: loose,
            signature: sig.to_hex(),
            signer: wallet.address().unwrap().to_checksum(),
            out: Some(out.clone()),
        })
        .unwrap();
        assert_eq!(run_verify(&VerifyArgs { file: out.clone() }).unwrap(), EXIT_VALID);

        let attached = read_value(&out).unwrap();
        assert_eq!(attached["agentId"], "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(attached["issuedAt"], "2026-02-01T00:00:00Z");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_hash(&HashArgs {
            file: dir.path().join("absent.json"),
        })
        .unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }
}
