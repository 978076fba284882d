//! # Credential Pipeline Properties
//!
//! assemble → hash → sign → verify across the core, crypto and vc crates:
//! canonicalization determinism, sign/verify round trip, hash stability,
//! the at-least-one-proof rule and tamper detection.

use agentlink_core::{
    AttestationId, IdentityRecord, Nullifier, SelfIdVerification, Timestamp, UserId,
    ValidationError, VerificationLevel, WorldIdVerification,
};
use agentlink_crypto::{EthSigningKey, KeyProvider, LocalKeyProvider};
use agentlink_vc::lifecycle::{attach_signature, issue};
use agentlink_vc::{
    assemble, canonical_hash, canonical_hash_value, sign_vc, verify_value, verify_vc, AgentVc,
    AssembleRequest, HumanProof, IssuerProfile, VcError, VerificationOutcome,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const AGENT: &str = "0x1111111111111111111111111111111111111111";

fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

fn world_only_user() -> IdentityRecord {
    let mut record = IdentityRecord::new(UserId::new("U").unwrap());
    record.world_id_verification = Some(WorldIdVerification {
        is_verified: true,
        nullifier_hash: Nullifier::new("0xabc").unwrap(),
        verification_level: VerificationLevel::Orb,
        verified_at: ts("2026-01-01T00:00:00Z"),
        raw_proof: Some(json!({"proof": "0xdeadbeef", "merkle_root": "0x01"})),
    });
    record
}

fn issued(identity: IdentityRecord, declaration: &str) -> AgentVc {
    let draft = assemble(
        AssembleRequest {
            agent_id: AGENT.to_string(),
            identity,
            declaration: declaration.to_string(),
        },
        &IssuerProfile::default(),
        ts("2026-02-01T00:00:00Z"),
    )
    .unwrap();
    issue(draft).unwrap().vc
}

fn sign(vc: AgentVc, provider: &dyn KeyProvider) -> AgentVc {
    let env = sign_vc(&vc, provider, Timestamp::now()).unwrap();
    attach_signature(vc, env, None).unwrap().vc
}

/// Re-serialize a JSON value with every object's keys emitted in reverse
/// order.
fn reversed_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .rev()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), reversed_json(v)))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(reversed_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

#[test]
fn example_scenario() {
    let vc = issued(world_only_user(), "Acts as my trading bot");

    let doc = vc.to_value().unwrap();
    assert_eq!(doc["humanProof"]["worldId"]["nullifierHash"], "0xabc");
    assert!(doc["humanProof"].get("selfId").is_none());
    assert!(!doc.to_string().contains("deadbeef"));

    assert_eq!(canonical_hash(&vc).unwrap(), canonical_hash(&vc).unwrap());

    let mut seed = [0u8; 32];
    seed[31] = 2;
    let key = LocalKeyProvider::new(EthSigningKey::from_bytes(&seed).unwrap());
    let expected = key.address().unwrap();
    assert_eq!(
        expected.to_checksum(),
        "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF"
    );

    let signed = sign(vc, &key);
    assert_eq!(signed.signer_address, Some(expected));
    match verify_vc(&signed) {
        VerificationOutcome::Valid { signer, .. } => assert_eq!(signer, expected),
        other => panic!("expected valid, got {other:?}"),
    }
}

#[test]
fn hash_is_stable_across_signing() {
    let vc = issued(world_only_user(), "Acts as my trading bot");
    let before = canonical_hash(&vc).unwrap();
    let signed = sign(vc, &LocalKeyProvider::generate());

    assert_eq!(canonical_hash(&signed).unwrap(), before);

    let mut stripped = signed.to_value().unwrap();
    let obj = stripped.as_object_mut().unwrap();
    for field in ["signature", "signedAt", "signerAddress"] {
        obj.remove(field);
    }
    assert_eq!(canonical_hash_value(&stripped).unwrap(), before);
}

#[test]
fn signing_twice_yields_two_valid_signatures() {
    let key = LocalKeyProvider::generate();
    let vc = issued(world_only_user(), "Acts as my trading bot");
    let a = sign(vc.clone(), &key);
    let b = sign(vc, &key);
    assert!(verify_vc(&a).is_valid());
    assert!(verify_vc(&b).is_valid());
}

#[test]
fn user_without_verified_proof_cannot_get_a_credential() {
    let mut record = world_only_user();
    if let Some(w) = record.world_id_verification.as_mut() {
        w.is_verified = false;
    }
    record.self_id_verification = Some(SelfIdVerification {
        is_verified: false,
        attestation_id: AttestationId(1),
        nullifier: Nullifier::new("77").unwrap(),
        verified_at: ts("2026-01-01T00:00:00Z"),
        raw_proof: None,
    });

    let result = assemble(
        AssembleRequest {
            agent_id: AGENT.to_string(),
            identity: record,
            declaration: "Acts as my trading bot".to_string(),
        },
        &IssuerProfile::default(),
        Timestamp::now(),
    );
    assert!(matches!(
        result,
        Err(VcError::Validation(ValidationError::MissingHumanProof))
    ));
}

#[test]
fn both_proofs_are_carried() {
    let mut record = world_only_user();
    record.self_id_verification = Some(SelfIdVerification {
        is_verified: true,
        attestation_id: AttestationId(2),
        nullifier: Nullifier::new("12345").unwrap(),
        verified_at: ts("2026-01-02T00:00:00Z"),
        raw_proof: None,
    });
    let vc = issued(record, "Acts as my trading bot");
    assert!(matches!(vc.human_proof, HumanProof::Both { .. }));
    let doc = vc.to_value().unwrap();
    assert_eq!(doc["humanProof"]["selfId"]["attestationId"], 2);
    assert_eq!(doc["humanProof"]["worldId"]["verificationLevel"], "orb");
}

#[test]
fn tampering_with_declaration_is_detected() {
    let signed = sign(
        issued(world_only_user(), "Acts as my trading bot"),
        &LocalKeyProvider::generate(),
    );

    let mut doc = signed.to_value().unwrap();
    doc["declaration"]["description"] = json!("Acts as my trading bot and my bank");
    assert!(matches!(
        verify_value(&doc),
        VerificationOutcome::Invalid { .. }
    ));

    let mut typed = signed;
    typed.declaration.description = "Acts as my trading bot.".to_string();
    assert!(!verify_vc(&typed).is_valid());
}

#[test]
fn document_parsed_with_reordered_keys_still_verifies() {
    let signed = sign(
        issued(world_only_user(), "Acts as my trading bot"),
        &LocalKeyProvider::generate(),
    );
    let doc = signed.to_value().unwrap();
    let reordered: Value = serde_json::from_str(&reversed_json(&doc)).unwrap();
    assert!(verify_value(&reordered).is_valid());

    let reparsed = AgentVc::from_json(&reversed_json(&doc)).unwrap();
    assert_eq!(reparsed, signed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_key_round_trips(seed in any::<[u8; 32]>(), declaration in "[A-Za-z][A-Za-z0-9 ]{0,60}") {
        let key = EthSigningKey::from_bytes(&seed);
        prop_assume!(key.is_ok());
        let provider = LocalKeyProvider::new(key.unwrap());
        let address = provider.address().unwrap();

        let signed = sign(issued(world_only_user(), &declaration), &provider);
        match verify_vc(&signed) {
            VerificationOutcome::Valid { signer, .. } => prop_assert_eq!(signer, address),
            other => prop_assert!(false, "expected valid, got {:?}", other),
        }
    }

    #[test]
    fn hash_ignores_key_order(declaration in "[A-Za-z][A-Za-z0-9 ]{0,60}") {
        let vc = issued(world_only_user(), &declaration);
        let doc = vc.to_value().unwrap();
        let reordered: Value = serde_json::from_str(&reversed_json(&doc)).unwrap();
        prop_assert_eq!(
            canonical_hash_value(&reordered).unwrap(),
            canonical_hash(&vc).unwrap()
        );
    }
}
