//! Fixtures shared by the unit tests.

use agentlink_core::{
    ChainAddress, IdentityRecord, Nullifier, Timestamp, UserId, VerificationLevel,
    WorldIdVerification,
};
use agentlink_vc::{assemble, lifecycle::issue, AgentVc, AssembleRequest, IssuerProfile};

pub(crate) const AGENT_A: &str = "0x1111111111111111111111111111111111111111";
pub(crate) const AGENT_B: &str = "0x3333333333333333333333333333333333333333";

/// A user with a verified World ID and, optionally, a wallet.
pub(crate) fn verified_user(id: &str, wallet: Option<ChainAddress>) -> IdentityRecord {
    let mut record = IdentityRecord::new(UserId::new(id).unwrap());
    record.wallet_address = wallet;
    record.world_id_verification = Some(WorldIdVerification {
        is_verified: true,
        nullifier_hash: Nullifier::new(format!("0x{:x}", id.len() + 0xabc)).unwrap(),
        verification_level: VerificationLevel::Orb,
        verified_at: Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
        raw_proof: None,
    });
    record
}

pub(crate) fn issued_vc_for(agent: &str, user: &str) -> AgentVc {
    let vc = assemble(
        AssembleRequest {
            agent_id: agent.to_string(),
            identity: verified_user(user, None),
            declaration: "Acts as my trading bot".to_string(),
        },
        &IssuerProfile::default(),
        Timestamp::now(),
    )
    .unwrap();
    issue(vc).unwrap().vc
}
