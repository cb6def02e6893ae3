//! PS16 (spec 4.4, scheme code 4): the one scheme in scope whose credential
//! is a Pointcheval-Sanders signature rather than the shared BBS+-style
//! `(A, x)` (spec 4.3). The issuer's key is a pair of scalars `(xis, yis)`
//! (`keys::Ps16IssuerKey`) instead of a single `isk`, and there is no hidden
//! `x` at all: the credential on a member's hidden identifier `y` is the
//! triple `(sigma1, sigma1h, sigma2)`, with
//!
//! ```text
//! sigma1  = g1^u
//! sigma1h = h^(y*u)      (computed by the issuer from the member's f = h^y)
//! sigma2  = sigma1^xis * sigma1h^yis
//! ```
//!
//! for a fresh issuer-chosen `u`, so the issuer never needs to learn `y` to
//! compute `sigma2` — the same blind-issuance shape as `credential.rs`'s
//! `issue_credential`, specialised to PS16's two-key signature instead of
//! the BBS+ one. `verify_credential` below is the PS16 analogue of
//! `credential::verify_credential`; `sign`/`verify` are the PS16 analogue of
//! `credential::randomize_credential`/`verify_randomized_credential` plus
//! the Sign SPK every other scheme in `schemes` builds on top.

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;
use ark_std::{UniformRand, Zero};
use schnorr_pok::representation::{Equation, EquationG1, RepProtocol};
use schnorr_pok::{compute_random_oracle_challenge, impl_proof_of_knowledge_of_discrete_log};

use crate::error::GroupSigError;
use crate::gml::Gml;
use crate::keys::{GroupPublicKey, ManagerKey, MemberKey, Ps16GroupKey, Ps16IssuerKey};
use crate::signature::Signature;
use crate::spk::Spk;
use crate::DefaultDigest;

use super::support::{push, transcript};

impl_proof_of_knowledge_of_discrete_log!(Ps16JoinKnowledgeProtocol, Ps16JoinKnowledgeProof);

/// `setup`: PS16's manager key is the pair `(xis, yis)`; there is no second
/// inspector role (spec 4.3: PS16 has one manager, same as BBS04).
pub fn setup<E: PairingEngine, R: RngCore>(rng: &mut R) -> (GroupPublicKey<E>, ManagerKey<E>) {
    let xis = E::Fr::rand(rng);
    let yis = E::Fr::rand(rng);
    let grpkey = Ps16GroupKey::generate_using_rng(rng, &xis, &yis);
    (
        GroupPublicKey::Ps16(grpkey),
        ManagerKey::Ps16 { isk: Ps16IssuerKey { xis, yis } },
    )
}

fn grpkey_of<E: PairingEngine>(grpkey: &GroupPublicKey<E>) -> Result<&Ps16GroupKey<E>, GroupSigError> {
    match grpkey {
        GroupPublicKey::Ps16(k) => Ok(k),
        _ => Err(GroupSigError::InvalidArgument("not a PS16 group key")),
    }
}

fn isk_of<E: PairingEngine>(mgrkey: &ManagerKey<E>) -> Result<(&E::Fr, &E::Fr), GroupSigError> {
    match mgrkey {
        ManagerKey::Ps16 { isk } => Ok((&isk.xis, &isk.yis)),
        _ => Err(GroupSigError::InvalidArgument("not a PS16 manager key")),
    }
}

fn member_parts<E: PairingEngine>(
    memkey: &MemberKey<E>,
) -> Result<(E::G1Affine, E::G1Affine, E::G1Affine, E::Fr), GroupSigError> {
    match memkey {
        MemberKey::Ps16 { sigma1, sigma1h, sigma2, y } => Ok((*sigma1, *sigma1h, *sigma2, *y)),
        _ => Err(GroupSigError::InvalidArgument("not a PS16 member key")),
    }
}

/// `e(sigma2, g2) == e(sigma1, xx) * e(sigma1h, yy)`: the credential is a
/// valid PS16 signature under the issuer's key, regardless of `y` (this half
/// never needs `y` — it is the PS16 analogue of
/// `credential::verify_randomized_credential`, reused again unchanged at
/// Sign/Verify once `sigma1`/`sigma1h`/`sigma2` are re-randomised).
fn check_issuer_signature<E: PairingEngine>(
    grpkey: &Ps16GroupKey<E>,
    sigma1: &E::G1Affine,
    sigma1h: &E::G1Affine,
    sigma2: &E::G1Affine,
) -> bool {
    if sigma1.is_zero() {
        return false;
    }
    E::pairing(*sigma2, grpkey.g2)
        == E::pairing(*sigma1, grpkey.xx) + E::pairing(*sigma1h, grpkey.yy)
}

/// `e(sigma1h, g1) == e(h^y, sigma1)`: ties `sigma1h` to the same hidden `y`
/// and the same issuer randomness `u` used for `sigma1`. Needs `y`, so this
/// check only runs once, at Join finalisation — by Sign time `y` must stay
/// hidden, which is exactly why Sign builds its own `d`/SPK instead of
/// re-running this check (see module docs).
fn check_identifier_binding<E: PairingEngine>(
    grpkey: &Ps16GroupKey<E>,
    y: &E::Fr,
    sigma1: &E::G1Affine,
    sigma1h: &E::G1Affine,
) -> bool {
    let f = grpkey.h.mul(y.into_repr()).into_affine();
    E::pairing(*sigma1h, grpkey.g1) == E::pairing(f, *sigma1)
}

fn verify_credential<E: PairingEngine>(
    grpkey: &Ps16GroupKey<E>,
    y: &E::Fr,
    sigma1: &E::G1Affine,
    sigma1h: &E::G1Affine,
    sigma2: &E::G1Affine,
) -> bool {
    check_identifier_binding(grpkey, y, sigma1, sigma1h)
        && check_issuer_signature(grpkey, sigma1, sigma1h, sigma2)
}

fn join_challenge<E: PairingEngine>(nonce: &E::Fr, t: &E::G1Affine) -> E::Fr {
    let mut bytes = Vec::new();
    push(&mut bytes, nonce);
    t.serialize_unchecked(&mut bytes)
        .expect("serializing to a Vec<u8> cannot fail");
    compute_random_oracle_challenge::<E::Fr, DefaultDigest>(&bytes)
}

/// One message of PS16's own three-message Join transcript (spec 4.3's
/// Message-based Join, specialised to PS16's credential shape — see
/// `join.rs`'s module docs for why PS16 does not reuse `JoinMessage`).
#[derive(Clone, Debug, PartialEq)]
pub enum Ps16JoinMessage<E: PairingEngine> {
    Challenge { nonce: E::Fr },
    Commitment {
        f: E::G1Affine,
        proof: Ps16JoinKnowledgeProof<E::G1Affine>,
        nonce: E::Fr,
    },
    Credential {
        sigma1: E::G1Affine,
        sigma1h: E::G1Affine,
        sigma2: E::G1Affine,
    },
}

impl<E: PairingEngine> Ps16JoinMessage<E> {
    fn seq(&self) -> u8 {
        match self {
            Ps16JoinMessage::Challenge { .. } => 0,
            Ps16JoinMessage::Commitment { .. } => 1,
            Ps16JoinMessage::Credential { .. } => 2,
        }
    }
}

pub struct Ps16MemberJoin<E: PairingEngine> {
    expected_seq: u8,
    y: Option<E::Fr>,
}

impl<E: PairingEngine> Default for Ps16MemberJoin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PairingEngine> Ps16MemberJoin<E> {
    pub fn new() -> Self {
        Self { expected_seq: 0, y: None }
    }

    fn check_seq(&self, inbound: &Ps16JoinMessage<E>, expected: u8) -> Result<(), GroupSigError> {
        if self.expected_seq != expected || inbound.seq() != expected {
            return Err(GroupSigError::ProtocolFail("out-of-order join message"));
        }
        Ok(())
    }

    pub fn step<R: RngCore>(
        &mut self,
        inbound: Ps16JoinMessage<E>,
        grpkey: &GroupPublicKey<E>,
        rng: &mut R,
    ) -> Result<Ps16JoinMessage<E>, GroupSigError> {
        self.check_seq(&inbound, 0)?;
        let nonce = match inbound {
            Ps16JoinMessage::Challenge { nonce } => nonce,
            _ => unreachable!("checked by check_seq"),
        };
        let grpkey = grpkey_of(grpkey)?;
        let y = E::Fr::rand(rng);
        let blinding = E::Fr::rand(rng);
        let f = grpkey.h.mul(y.into_repr()).into_affine();
        let protocol = Ps16JoinKnowledgeProtocol::<E::G1Affine>::init(y, blinding, &grpkey.h);
        let challenge = join_challenge::<E>(&nonce, &protocol.t);
        let proof = protocol.gen_proof(&challenge);

        self.y = Some(y);
        self.expected_seq = 2;
        Ok(Ps16JoinMessage::Commitment { f, proof, nonce })
    }

    pub fn finalize(
        self,
        inbound: Ps16JoinMessage<E>,
        grpkey: &GroupPublicKey<E>,
    ) -> Result<MemberKey<E>, GroupSigError> {
        self.check_seq(&inbound, 2)?;
        let (sigma1, sigma1h, sigma2) = match inbound {
            Ps16JoinMessage::Credential { sigma1, sigma1h, sigma2 } => (sigma1, sigma1h, sigma2),
            _ => unreachable!("checked by check_seq"),
        };
        let y = self
            .y
            .ok_or(GroupSigError::ProtocolFail("finalize called before step"))?;
        let grpkey = grpkey_of(grpkey)?;
        if !verify_credential(grpkey, &y, &sigma1, &sigma1h, &sigma2) {
            return Err(GroupSigError::CryptoFail(
                "issued credential failed the PS16 pairing check",
            ));
        }
        Ok(MemberKey::Ps16 { sigma1, sigma1h, sigma2, y })
    }
}

pub struct Ps16ManagerJoin<E: PairingEngine> {
    expected_seq: u8,
}

impl<E: PairingEngine> Default for Ps16ManagerJoin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PairingEngine> Ps16ManagerJoin<E> {
    pub fn new() -> Self {
        Self { expected_seq: 0 }
    }

    pub fn start<R: RngCore>(&mut self, rng: &mut R) -> Ps16JoinMessage<E> {
        self.expected_seq = 1;
        Ps16JoinMessage::Challenge { nonce: E::Fr::rand(rng) }
    }

    pub fn step<R: RngCore>(
        &mut self,
        inbound: Ps16JoinMessage<E>,
        grpkey: &GroupPublicKey<E>,
        mgrkey: &ManagerKey<E>,
        rng: &mut R,
    ) -> Result<(Ps16JoinMessage<E>, E::G1Affine), GroupSigError> {
        if self.expected_seq != 1 || inbound.seq() != 1 {
            return Err(GroupSigError::ProtocolFail("out-of-order join message"));
        }
        let (f, proof, nonce) = match inbound {
            Ps16JoinMessage::Commitment { f, proof, nonce } => (f, proof, nonce),
            _ => unreachable!("checked above"),
        };
        let grpkey = grpkey_of(grpkey)?;
        let challenge = join_challenge::<E>(&nonce, &proof.t);
        if !proof.verify(&f, &grpkey.h, &challenge) {
            return Err(GroupSigError::CryptoFail(
                "member's proof of knowledge of y failed",
            ));
        }
        let (xis, yis) = isk_of(mgrkey)?;
        let u = loop {
            let candidate = E::Fr::rand(rng);
            if !candidate.is_zero() {
                break candidate;
            }
        };
        let sigma1 = grpkey.g1.mul(u.into_repr()).into_affine();
        let sigma1h = f.mul(u.into_repr()).into_affine();
        let sigma2 = (sigma1.mul(xis.into_repr()) + sigma1h.mul(yis.into_repr())).into_affine();
        self.expected_seq = 3;
        Ok((Ps16JoinMessage::Credential { sigma1, sigma1h, sigma2 }, f))
    }
}

pub fn join_mgr_start<E: PairingEngine, R: RngCore>(
    mgr: &mut Ps16ManagerJoin<E>,
    rng: &mut R,
) -> Ps16JoinMessage<E> {
    mgr.start(rng)
}

pub fn join_mgr_step<E: PairingEngine, R: RngCore>(
    mgr: &mut Ps16ManagerJoin<E>,
    inbound: Ps16JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    gml: &mut Gml<E>,
    rng: &mut R,
) -> Result<Ps16JoinMessage<E>, GroupSigError> {
    let (outbound, f) = mgr.step(inbound, grpkey, mgrkey, rng)?;
    gml.insert(f)?;
    Ok(outbound)
}

pub fn join_mem_start<E: PairingEngine>() -> Ps16MemberJoin<E> {
    Ps16MemberJoin::new()
}

pub fn join_mem_step<E: PairingEngine, R: RngCore>(
    mem: &mut Ps16MemberJoin<E>,
    inbound: Ps16JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    rng: &mut R,
) -> Result<Ps16JoinMessage<E>, GroupSigError> {
    mem.step(inbound, grpkey, rng)
}

pub fn join_mem_finalize<E: PairingEngine>(
    mem: Ps16MemberJoin<E>,
    inbound: Ps16JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
) -> Result<MemberKey<E>, GroupSigError> {
    mem.finalize(inbound, grpkey)
}

/// The single Sign/Verify equation: `d = (-e)*y + h*a`, i.e. `d = a·h -
/// y·e`, a Pedersen-style opening binding the member's real `y` (the one
/// `e = sigma1h'` already encodes) to a fresh per-signature blinding `a`,
/// the PS16 analogue of `credential.rs`'s `d`.
fn sign_equations<E: PairingEngine>(e: E::G1Affine, h: E::G1Affine, d: E::G1Affine) -> Vec<Equation<E>> {
    let neg_e = (-e.into_projective()).into_affine();
    ark_std::vec![Equation::G1(EquationG1 {
        bases: ark_std::vec![neg_e, h],
        witness_indices: ark_std::vec![0, 1],
        value: d,
    })]
}

fn sign_transcript<E: PairingEngine>(
    msg: &[u8],
    grpkey: &Ps16GroupKey<E>,
    sigma1: &E::G1Affine,
    e: &E::G1Affine,
    sigma2: &E::G1Affine,
    d: &E::G1Affine,
) -> Vec<u8> {
    let mut t = transcript(msg);
    push(&mut t, &grpkey.g1);
    push(&mut t, &grpkey.h);
    push(&mut t, sigma1);
    push(&mut t, e);
    push(&mut t, sigma2);
    push(&mut t, d);
    t
}

pub fn sign<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    rng: &mut R,
) -> Result<Signature<E>, GroupSigError> {
    let grpkey = grpkey_of(grpkey)?;
    let (sigma1, sigma1h, sigma2, y) = member_parts(memkey)?;

    let r = loop {
        let candidate = E::Fr::rand(rng);
        if !candidate.is_zero() {
            break candidate;
        }
    };
    let sigma1_out = sigma1.mul(r.into_repr()).into_affine();
    let e = sigma1h.mul(r.into_repr()).into_affine();
    let sigma2_out = sigma2.mul(r.into_repr()).into_affine();

    let a = E::Fr::rand(rng);
    let d = (grpkey.h.mul(a.into_repr()) - e.mul(y.into_repr())).into_affine();

    let equations = sign_equations::<E>(e, grpkey.h, d);
    let blindings = ark_std::vec![E::Fr::rand(rng), E::Fr::rand(rng)];
    let protocol = RepProtocol::init(ark_std::vec![y, a], blindings, equations)?;
    let spk = Spk::prove(
        protocol,
        &sign_transcript(msg, grpkey, &sigma1_out, &e, &sigma2_out, &d),
    )?;

    Ok(Signature::Ps16 { sigma1: sigma1_out, e, sigma2: sigma2_out, d, spk })
}

pub fn verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    msg: &[u8],
) -> Result<bool, GroupSigError> {
    let grpkey = grpkey_of(grpkey)?;
    let (sigma1, e, sigma2, d, spk) = match sig {
        Signature::Ps16 { sigma1, e, sigma2, d, spk } => (sigma1, e, sigma2, d, spk),
        _ => return Err(GroupSigError::InvalidArgument("not a PS16 signature")),
    };
    if !check_issuer_signature(grpkey, sigma1, e, sigma2) {
        return Ok(false);
    }
    let equations = sign_equations::<E>(*e, grpkey.h, *d);
    let transcript = sign_transcript(msg, grpkey, sigma1, e, sigma2, d);
    Ok(spk.verify(&equations, &transcript).is_ok())
}

/// Batches the credential-validity half across `n` signatures into 3
/// pairings total (one random linear combination per side of
/// `check_issuer_signature`), same testable property as every other
/// scheme's `verify_batch` (spec 8's property 5).
pub fn verify_batch<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
    msgs: &[&[u8]],
    rng: &mut R,
) -> Result<bool, GroupSigError> {
    if sigs.len() != msgs.len() {
        return Err(GroupSigError::InvalidArgument("sigs/msgs length mismatch"));
    }
    let grpkey = grpkey_of(grpkey)?;
    let mut sigma1_sum = E::G1Projective::zero();
    let mut e_sum = E::G1Projective::zero();
    let mut sigma2_sum = E::G1Projective::zero();
    for (sig, msg) in sigs.iter().zip(msgs.iter()) {
        let (sigma1, e, sigma2, d, spk) = match sig {
            Signature::Ps16 { sigma1, e, sigma2, d, spk } => (sigma1, e, sigma2, d, spk),
            _ => return Err(GroupSigError::InvalidArgument("not a PS16 signature")),
        };
        if sigma1.is_zero() {
            return Ok(false);
        }
        let equations = sign_equations::<E>(*e, grpkey.h, *d);
        let transcript = sign_transcript(msg, grpkey, sigma1, e, sigma2, d);
        if spk.verify(&equations, &transcript).is_err() {
            return Ok(false);
        }
        let coeff = E::Fr::rand(rng);
        sigma1_sum += sigma1.mul(coeff.into_repr());
        e_sum += e.mul(coeff.into_repr());
        sigma2_sum += sigma2.mul(coeff.into_repr());
    }
    Ok(E::pairing(sigma2_sum.into_affine(), grpkey.g2)
        == E::pairing(sigma1_sum.into_affine(), grpkey.xx)
            + E::pairing(e_sum.into_affine(), grpkey.yy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn join_one_member<R: RngCore>(
        grpkey: &GroupPublicKey<Bls12_381>,
        mgrkey: &ManagerKey<Bls12_381>,
        gml: &mut Gml<Bls12_381>,
        rng: &mut R,
    ) -> MemberKey<Bls12_381> {
        let mut mgr = Ps16ManagerJoin::new();
        let mut mem = join_mem_start();
        let msg0 = join_mgr_start(&mut mgr, rng);
        let msg1 = join_mem_step(&mut mem, msg0, grpkey, rng).unwrap();
        let msg2 = join_mgr_step(&mut mgr, msg1, grpkey, mgrkey, gml, rng).unwrap();
        join_mem_finalize(mem, msg2, grpkey).unwrap()
    }

    #[test]
    fn join_yields_credential_passing_both_pairing_checks() {
        let mut rng = StdRng::seed_from_u64(200u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Ps16);
        let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);
        assert_eq!(gml.len(), 1);
        match memkey {
            MemberKey::Ps16 { .. } => {}
            _ => panic!("expected a PS16 member key"),
        }
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let mut rng = StdRng::seed_from_u64(201u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Ps16);
        let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);

        let sig = sign(&grpkey, &memkey, b"hello", &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello").unwrap());
        assert!(!verify(&grpkey, &sig, b"tampered").unwrap());
    }

    #[test]
    fn verify_batch_matches_individual_verify() {
        let mut rng = StdRng::seed_from_u64(202u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Ps16);

        let mut sigs = Vec::new();
        let msgs: Vec<&[u8]> = ark_std::vec![b"m0", b"m1", b"m2"];
        for m in &msgs {
            let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);
            sigs.push(sign(&grpkey, &memkey, m, &mut rng).unwrap());
        }
        assert!(verify_batch(&grpkey, &sigs, &msgs, &mut rng).unwrap());
        for (sig, msg) in sigs.iter().zip(msgs.iter()) {
            assert!(verify(&grpkey, sig, msg).unwrap());
        }

        let sigma2_0 = match &sigs[0] {
            Signature::Ps16 { sigma2, .. } => *sigma2,
            _ => unreachable!(),
        };
        let mut mixed = sigs.clone();
        if let Signature::Ps16 { sigma2, .. } = &mut mixed[1] {
            *sigma2 = sigma2_0;
        }
        assert!(!verify_batch(&grpkey, &mixed, &msgs, &mut rng).unwrap());
    }

    #[test]
    fn different_members_do_not_share_a_credential() {
        let mut rng = StdRng::seed_from_u64(203u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Ps16);
        let a = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);
        let b = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);
        assert_ne!(a.y(), b.y());
    }
}
