//! Fixtures shared by the unit tests.

use agentlink_core::{
    IdentityRecord, Nullifier, Timestamp, UserId, VerificationLevel, WorldIdVerification,
};
use agentlink_crypto::KeyProvider;

use crate::assemble::{assemble, AssembleRequest};
use crate::credential::{AgentVc, IssuerProfile};
use crate::lifecycle::{attach_signature, issue};
use crate::sign::sign_vc;

pub(crate) fn draft_vc() -> AgentVc {
    let mut identity = IdentityRecord::new(UserId::new("user-1").unwrap());
    identity.world_id_verification = Some(WorldIdVerification {
        is_verified: true,
        nullifier_hash: Nullifier::new("0x0badc0de").unwrap(),
        verification_level: VerificationLevel::Orb,
        verified_at: Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
        raw_proof: None,
    });
    assemble(
        AssembleRequest {
            agent_id: "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF".to_string(),
            identity,
            declaration: "Negotiates freight quotes on my behalf".to_string(),
        },
        &IssuerProfile::default(),
        Timestamp::parse("2026-02-01T00:00:00Z").unwrap(),
    )
    .unwrap()
}

pub(crate) fn issued_vc() -> AgentVc {
    issue(draft_vc()).unwrap().vc
}

pub(crate) fn signed_vc(provider: &dyn KeyProvider) -> AgentVc {
    let vc = issued_vc();
    let env = sign_vc(&vc, provider, Timestamp::now()).unwrap();
    attach_signature(vc, env, None).unwrap().vc
}
