//! Contract tests for the verifier clients against a mock HTTP server.

use std::time::Duration;

use agentlink_core::{AttestationId, IdentityRecord, UserId, VerificationLevel};
use agentlink_identity::{
    IdentityService, SelfClient, SelfSubmission, VerifierConfig, VerifierError, WorldIdClient,
    WorldIdSubmission,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn world_submission() -> WorldIdSubmission {
    WorldIdSubmission {
        merkle_root: "0x1f38b57f3bdf96f05ea62fa68814871bf0ca8ce4dbe073d8497d5a6b0a53e5e0".into(),
        nullifier_hash: "0x2bf8406809dcefb1486dadc96c0a897db9bab002053054cf64272db512c6fbd8".into(),
        proof: "0xdeadbeef".into(),
        verification_level: VerificationLevel::Orb,
        signal_hash: None,
    }
}

fn self_submission() -> SelfSubmission {
    SelfSubmission {
        attestation_id: AttestationId(1),
        proof: json!({"a": ["1", "2"], "b": [["3", "4"]], "c": ["5", "6"]}),
        public_signals: vec!["42".into()],
        user_context_data: "000000000000000000000000000000000000000000000000000000000000a4ec".into(),
    }
}

fn config(server: &MockServer) -> VerifierConfig {
    VerifierConfig::local_mock(&server.uri()).unwrap()
}

#[tokio::test]
async fn world_id_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/verify/app_staging_test"))
        .and(body_partial_json(json!({"action": "link-agent", "verification_level": "orb"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "action": "link-agent",
            "nullifier_hash": "0x2BF8406809DCEFB1486DADC96C0A897DB9BAB002053054CF64272DB512C6FBD8",
            "created_at": "2026-01-01T00:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorldIdClient::new(reqwest::Client::new(), &config(&server));
    let verified = client.verify(&world_submission()).await.unwrap();
    assert_eq!(
        verified.nullifier_hash.as_str(),
        "0x2bf8406809dcefb1486dadc96c0a897db9bab002053054cf64272db512c6fbd8"
    );
    assert_eq!(verified.verification_level, VerificationLevel::Orb);
}

#[tokio::test]
async fn world_id_rejection_carries_code_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/verify/app_staging_test"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "max_verifications_reached",
            "detail": "This person has already verified for this action.",
            "attribute": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorldIdClient::new(reqwest::Client::new(), &config(&server));
    match client.verify(&world_submission()).await {
        Err(VerifierError::Rejected {
            status,
            code,
            detail,
            ..
        }) => {
            assert_eq!(status, 400);
            assert_eq!(code, "max_verifications_reached");
            assert_eq!(detail, "This person has already verified for this action.");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_unreachable_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/verify/app_staging_test"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorldIdClient::new(reqwest::Client::new(), &config(&server));
    let err = client.verify(&world_submission()).await.unwrap_err();
    match &err {
        VerifierError::Unreachable { detail, .. } => assert!(detail.contains("503")),
        other => panic!("expected Unreachable, got {other:?}"),
    }
    assert_eq!(err.code(), "UPSTREAM_ERROR");
}

#[tokio::test]
async fn slow_verifier_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isValid": true, "nullifier": "1"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = SelfClient::new(http, &config(&server));
    let err = client.verify(&self_submission()).await.unwrap_err();
    assert!(matches!(err, VerifierError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn self_success_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .and(header("authorization", "Bearer self-key"))
        .and(body_partial_json(json!({"attestationId": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isValid": true,
            "nullifier": "1234567890",
            "attestationId": 1,
            "timestamp": 1767225600000i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.self_api_key = Some(zeroize::Zeroizing::new("self-key".to_string()));
    let client = SelfClient::new(reqwest::Client::new(), &cfg);
    let verified = client.verify(&self_submission()).await.unwrap();
    assert_eq!(verified.nullifier.as_str(), "1234567890");
    assert_eq!(verified.attestation_id, AttestationId(1));
    assert_eq!(verified.verified_at.to_iso8601(), "2026-01-01T00:00:00Z");
}

#[tokio::test]
async fn self_invalid_proof_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isValid": false,
            "error": "Proof verification failed"
        })))
        .mount(&server)
        .await;

    let client = SelfClient::new(reqwest::Client::new(), &config(&server));
    match client.verify(&self_submission()).await {
        Err(VerifierError::Rejected { code, detail, .. }) => {
            assert_eq!(code, "invalid_proof");
            assert_eq!(detail, "Proof verification failed");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = SelfClient::new(reqwest::Client::new(), &config(&server));
    let err = client.verify(&self_submission()).await.unwrap_err();
    assert!(matches!(err, VerifierError::Deserialization { .. }), "got {err:?}");
}

#[tokio::test]
async fn service_caches_successful_verification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/verify/app_staging_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "nullifier_hash": "0x2bf8406809dcefb1486dadc96c0a897db9bab002053054cf64272db512c6fbd8"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = IdentityService::from_config(&config(&server)).unwrap();
    let alice = IdentityRecord::new(UserId::new("alice").unwrap());

    let first = service
        .apply_world_id(alice.clone(), &world_submission())
        .await
        .unwrap();
    let second = service
        .apply_world_id(alice, &world_submission())
        .await
        .unwrap();

    assert!(first.has_verified_proof());
    let w1 = first.verified_world().unwrap();
    let w2 = second.verified_world().unwrap();
    assert_eq!(w1.nullifier_hash, w2.nullifier_hash);
    assert!(w1.raw_proof.is_some());
}

#[tokio::test]
async fn service_rejects_nullifier_reuse_by_another_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isValid": true,
            "nullifier": "0xfeed"
        })))
        .mount(&server)
        .await;

    let service = IdentityService::from_config(&config(&server)).unwrap();
    let alice = IdentityRecord::new(UserId::new("alice").unwrap());
    let bob = IdentityRecord::new(UserId::new("bob").unwrap());

    let alice = service.apply_self_id(alice, &self_submission()).await.unwrap();
    assert!(alice.verified_self().is_some());

    let err = service
        .apply_self_id(bob, &self_submission())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NULLIFIER_REUSED");
}

#[tokio::test]
async fn failed_verification_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let service = IdentityService::from_config(&config(&server)).unwrap();
    let rec = IdentityRecord::new(UserId::new("carol").unwrap());
    assert!(service.apply_self_id(rec.clone(), &self_submission()).await.is_err());
    assert!(service.apply_self_id(rec, &self_submission()).await.is_err());
}
