//! The generic three-message Join protocol shared by every scheme whose
//! credential is the BBS+-style one in `credential.rs` (BBS04, KLAP20,
//! GL19, DL21, DL21-SEQ — spec 4.3). Each side is a small, explicit state
//! machine per spec 9's "Message-based Join" design note: `step(state,
//! inbound) -> (state', outbound)`, `seq` checked at every transition.
//!
//! PS16 does not use this module; its Join is built directly in
//! `schemes::ps16` atop a differently-shaped credential.

use ark_ec::PairingEngine;
use ark_serialize::CanonicalSerialize;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;
use ark_std::{UniformRand, Zero};
use schnorr_pok::{compute_random_oracle_challenge, impl_proof_of_knowledge_of_discrete_log};

use crate::credential::{identifier_commitment, issue_credential, write_canonical, CoreGroupKey, Credential};
use crate::error::GroupSigError;
use crate::DefaultDigest;

impl_proof_of_knowledge_of_discrete_log!(JoinKnowledgeProtocol, JoinKnowledgeProof);

/// One message of the Join transcript, carrying its own `seq` so the
/// receiver can enforce strict ordering (spec 4.3/5: "the receiver MUST
/// reject any message whose `seq` does not match its local
/// next-expected value").
#[derive(Clone, Debug, PartialEq)]
pub enum JoinMessage<E: PairingEngine> {
    /// seq=0, Mgr -> Mem: a fresh challenge nonce.
    Challenge { nonce: E::Fr },
    /// seq=1, Mem -> Mgr: the commitment to `y` plus a proof of knowledge
    /// of `y`, bound to the manager's nonce.
    Commitment {
        f: E::G1Affine,
        proof: JoinKnowledgeProof<E::G1Affine>,
        nonce: E::Fr,
    },
    /// seq=2, Mgr -> Mem: the issued credential.
    Credential { a: E::G1Affine, x: E::Fr },
}

impl<E: PairingEngine> JoinMessage<E> {
    fn seq(&self) -> u8 {
        match self {
            JoinMessage::Challenge { .. } => 0,
            JoinMessage::Commitment { .. } => 1,
            JoinMessage::Credential { .. } => 2,
        }
    }
}

fn join_challenge<E: PairingEngine>(nonce: &E::Fr, t: &E::G1Affine) -> E::Fr {
    let mut bytes = Vec::new();
    write_canonical(&mut bytes, nonce);
    t.serialize_unchecked(&mut bytes)
        .expect("serializing to a Vec<u8> cannot fail");
    compute_random_oracle_challenge::<E::Fr, DefaultDigest>(&bytes)
}

/// Member side of Join. `seq=3` (finalisation) is a distinct call,
/// [`MemberJoin::finalize`], since it produces the terminal member key
/// rather than an outbound wire message.
pub struct MemberJoin<E: PairingEngine> {
    expected_seq: u8,
    y: Option<E::Fr>,
}

impl<E: PairingEngine> Default for MemberJoin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PairingEngine> MemberJoin<E> {
    pub fn new() -> Self {
        Self {
            expected_seq: 0,
            y: None,
        }
    }

    /// seq=0 -> seq=1: sample `y`, commit `F = h^y`, prove knowledge of `y`
    /// over `h` bound to the manager's nonce.
    pub fn step<R: RngCore>(
        &mut self,
        inbound: JoinMessage<E>,
        core: &CoreGroupKey<E>,
        rng: &mut R,
    ) -> Result<JoinMessage<E>, GroupSigError> {
        self.check_seq(&inbound, 0)?;
        let nonce = match inbound {
            JoinMessage::Challenge { nonce } => nonce,
            _ => unreachable!("checked by check_seq"),
        };
        let y = E::Fr::rand(rng);
        let blinding = E::Fr::rand(rng);
        let f = identifier_commitment(core, &y);
        let protocol = JoinKnowledgeProtocol::<E::G1Affine>::init(y, blinding, &core.h);
        let challenge = join_challenge::<E>(&nonce, &protocol.t);
        let proof = protocol.gen_proof(&challenge);

        self.y = Some(y);
        self.expected_seq = 2;
        Ok(JoinMessage::Commitment { f, proof, nonce })
    }

    /// seq=2 -> seq=3: accept the issued credential and check it against
    /// the BBS+ pairing equation before trusting it.
    pub fn finalize(
        self,
        inbound: JoinMessage<E>,
        core: &CoreGroupKey<E>,
    ) -> Result<(Credential<E>, E::Fr), GroupSigError> {
        self.check_seq(&inbound, 2)?;
        let (a, x) = match inbound {
            JoinMessage::Credential { a, x } => (a, x),
            _ => unreachable!("checked by check_seq"),
        };
        let y = self
            .y
            .ok_or(GroupSigError::ProtocolFail("finalize called before step"))?;
        let cred = Credential { a, x };
        if !crate::credential::verify_credential(core, &y, &cred) {
            log::warn!("join: issued credential failed the BBS+ pairing check");
            return Err(GroupSigError::CryptoFail(
                "issued credential failed the BBS+ pairing check",
            ));
        }
        log::debug!("join: member finalised a new credential");
        Ok((cred, y))
    }

    fn check_seq(&self, inbound: &JoinMessage<E>, expected: u8) -> Result<(), GroupSigError> {
        if self.expected_seq != expected || inbound.seq() != expected {
            log::warn!(
                "join: member expected seq {} (local state {}), got seq {}",
                expected,
                self.expected_seq,
                inbound.seq()
            );
            return Err(GroupSigError::ProtocolFail("out-of-order join message"));
        }
        Ok(())
    }
}

/// Manager side of Join.
pub struct ManagerJoin<E: PairingEngine> {
    expected_seq: u8,
}

impl<E: PairingEngine> Default for ManagerJoin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PairingEngine> ManagerJoin<E> {
    pub fn new() -> Self {
        Self { expected_seq: 0 }
    }

    /// seq=0: send the challenge nonce that opens the session.
    pub fn start<R: RngCore>(&mut self, rng: &mut R) -> JoinMessage<E> {
        self.expected_seq = 1;
        JoinMessage::Challenge {
            nonce: E::Fr::rand(rng),
        }
    }

    /// seq=1 -> seq=2: verify the member's proof of knowledge of `y`, issue
    /// the credential. Returns the outbound message plus the commitment
    /// `F` the caller should fold into a GML entry (KLAP20's `τ`, BBS04's
    /// traceable identifier) if the scheme has a GML.
    pub fn step<R: RngCore>(
        &mut self,
        inbound: JoinMessage<E>,
        core: &CoreGroupKey<E>,
        isk: &E::Fr,
        rng: &mut R,
    ) -> Result<(JoinMessage<E>, E::G1Affine), GroupSigError> {
        if self.expected_seq != 1 || inbound.seq() != 1 {
            log::warn!(
                "join: manager expected seq 1 (local state {}), got seq {}",
                self.expected_seq,
                inbound.seq()
            );
            return Err(GroupSigError::ProtocolFail("out-of-order join message"));
        }
        let (f, proof, nonce) = match inbound {
            JoinMessage::Commitment { f, proof, nonce } => (f, proof, nonce),
            _ => unreachable!("checked above"),
        };
        let challenge = join_challenge::<E>(&nonce, &proof.t);
        if !proof.verify(&f, &core.h, &challenge) {
            log::warn!("join: member's proof of knowledge of y failed");
            return Err(GroupSigError::CryptoFail(
                "member's proof of knowledge of y failed",
            ));
        }
        let x = loop {
            let candidate = E::Fr::rand(rng);
            if !(*isk + candidate).is_zero() {
                break candidate;
            }
        };
        let cred = issue_credential(core, isk, f, x)
            .ok_or(GroupSigError::Internal("isk + x was zero"))?;
        self.expected_seq = 3;
        log::debug!("join: manager issued a credential");
        Ok((
            JoinMessage::Credential {
                a: cred.a,
                x: cred.x,
            },
            f,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    type Fr = <Bls12_381 as PairingEngine>::Fr;

    #[test]
    fn full_three_message_join_yields_verifying_credential() {
        let mut rng = StdRng::seed_from_u64(7u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);

        let mut mgr = ManagerJoin::<Bls12_381>::new();
        let mut mem = MemberJoin::<Bls12_381>::new();

        let msg0 = mgr.start(&mut rng);
        let msg1 = mem.step(msg0, &core, &mut rng).unwrap();
        let (msg2, f) = mgr.step(msg1, &core, &isk, &mut rng).unwrap();
        let (cred, y) = mem.finalize(msg2, &core).unwrap();

        assert!(crate::credential::verify_credential(&core, &y, &cred));
        assert_eq!(identifier_commitment(&core, &y), f);
    }

    #[test]
    fn out_of_order_seq_is_rejected() {
        let mut rng = StdRng::seed_from_u64(8u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);

        let mut mem = MemberJoin::<Bls12_381>::new();
        let bogus = JoinMessage::Credential {
            a: core.g1,
            x: Fr::rand(&mut rng),
        };
        assert!(mem.step(bogus, &core, &mut rng).is_err());
    }
}
