//! GL19 (spec 4.4/4.6, scheme code 3): BBS04 plus a Converter role and an
//! expiring credential. Sign additionally produces two independent
//! ElGamal-style ciphertexts of the member's identifier commitment under
//! the Converter's public key; `blind`/`convert`/`unblind` peel a
//! three-layer ciphertext (Converter's `xi`, then the blinder's `bsk`) to
//! recover a pseudonym that is deterministic in `(y, domain)` and stable
//! across re-blindings (spec 8 testable property 7). Grounded on
//! `credential.rs`/`join.rs`'s shared engine for the credential half;
//! the ciphertext design is this crate's own resolution of spec 4.6's
//! underspecified wire shape (see `DESIGN.md`).

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;
use ark_std::UniformRand;
use blake2::Blake2b;
use gs_crypto_utils::hashing_utils::projective_group_elem_from_try_and_incr;
use schnorr_pok::representation::{Equation, EquationG1, RepProtocol};

use crate::credential::{
    issue_credential, randomize_credential, verify_randomized_credential,
    verify_randomized_credentials_batch, CoreGroupKey, Credential, IssuerSecretKey,
};
use crate::error::GroupSigError;
use crate::gml::Gml;
use crate::join::{JoinMessage, ManagerJoin, MemberJoin};
use crate::keys::{BlindingKeyPair, Gl19Tail, GroupPublicKey, ManagerKey, MemberKey};
use crate::signature::Signature;
use crate::spk::Spk;

use super::support::{credential_commitment, credential_equations, push, transcript};

/// After `blind`: a second layer `b = g1^s` tracking the blinder's own
/// randomness, with `c` re-randomised under `bpk` (spec 4.6's "encrypt
/// `(ehy1,ehy2)` under `bpk`"). `a` still carries the Converter's layer
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Gl19Blinded<E: PairingEngine> {
    pub a: E::G1Affine,
    pub b: E::G1Affine,
    pub c: E::G1Affine,
}

/// After `convert`: the Converter's layer has been peeled and a
/// domain-specific term folded in, leaving only the blinder's layer for
/// `unblind` to remove.
#[derive(Clone, Debug, PartialEq)]
pub struct Gl19Converted<E: PairingEngine> {
    pub b: E::G1Affine,
    pub c: E::G1Affine,
}

fn domain_base<E: PairingEngine>(domain: &[u8]) -> E::G1Affine {
    projective_group_elem_from_try_and_incr::<E::G1Affine, Blake2b>(domain).into_affine()
}

pub fn setup<E: PairingEngine, R: RngCore>(rng: &mut R) -> (GroupPublicKey<E>, ManagerKey<E>) {
    let isk = IssuerSecretKey::generate(rng);
    let core = CoreGroupKey::generate_using_rng(rng, &isk.0);
    let xi = E::Fr::rand(rng);
    let y_pub = core.g1.mul(xi.into_repr()).into_affine();
    let z1 = core.h.mul(xi.into_repr()).into_affine();
    let z2 = core.h1.mul(xi.into_repr()).into_affine();
    let tail = Gl19Tail { z1, z2, y: y_pub };
    (GroupPublicKey::Gl19(core, tail), ManagerKey::Gl19 { isk, xi })
}

fn parts<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
) -> Result<(&CoreGroupKey<E>, &Gl19Tail<E>), GroupSigError> {
    match grpkey {
        GroupPublicKey::Gl19(core, tail) => Ok((core, tail)),
        _ => Err(GroupSigError::InvalidArgument("not a GL19 group key")),
    }
}

fn mgr_xi<E: PairingEngine>(mgrkey: &ManagerKey<E>) -> Result<&E::Fr, GroupSigError> {
    match mgrkey {
        ManagerKey::Gl19 { xi, .. } => Ok(xi),
        _ => Err(GroupSigError::InvalidArgument("not a GL19 manager key")),
    }
}

fn member_parts<E: PairingEngine>(
    memkey: &MemberKey<E>,
) -> Result<(E::G1Affine, E::Fr, E::Fr, u64), GroupSigError> {
    match memkey {
        MemberKey::Gl19 { a, x, y, expiration } => Ok((*a, *x, *y, *expiration)),
        _ => Err(GroupSigError::InvalidArgument("not a GL19 member key")),
    }
}

pub fn join_mgr_start<E: PairingEngine, R: RngCore>(mgr: &mut ManagerJoin<E>, rng: &mut R) -> JoinMessage<E> {
    mgr.start(rng)
}

pub fn join_mgr_step<E: PairingEngine, R: RngCore>(
    mgr: &mut ManagerJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    gml: &mut Gml<E>,
    rng: &mut R,
) -> Result<JoinMessage<E>, GroupSigError> {
    let (core, _) = parts(grpkey)?;
    let isk = match mgrkey {
        ManagerKey::Gl19 { isk, .. } => &isk.0,
        _ => return Err(GroupSigError::InvalidArgument("not a GL19 manager key")),
    };
    let (outbound, f) = mgr.step(inbound, core, isk, rng)?;
    gml.insert(f)?;
    Ok(outbound)
}

pub fn join_mem_start<E: PairingEngine>() -> MemberJoin<E> {
    MemberJoin::new()
}

pub fn join_mem_step<E: PairingEngine, R: RngCore>(
    mem: &mut MemberJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    rng: &mut R,
) -> Result<JoinMessage<E>, GroupSigError> {
    let (core, _) = parts(grpkey)?;
    mem.step(inbound, core, rng)
}

/// `expiration` is agreed out of band (the Join transcript carries no room
/// for it — spec 4.3's three messages are shared with every BBS+-style
/// scheme); the manager communicates the credential's lifetime to the
/// member alongside the protocol, same as an issuance policy would.
pub fn join_mem_finalize<E: PairingEngine>(
    mem: MemberJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    expiration: u64,
) -> Result<MemberKey<E>, GroupSigError> {
    let (core, _) = parts(grpkey)?;
    let (cred, y) = mem.finalize(inbound, core)?;
    Ok(MemberKey::Gl19 { a: cred.a, x: cred.x, y, expiration })
}

/// `credential_equations`'s unchanged BBS04 conjunction (witnesses `[x, y',
/// a_blind, b]`, indices 0..=3) plus four equations binding the escrow pairs
/// to the member's long-term `y` (index 4) rather than the per-signature
/// `y' = y·a_blind` — `sign` builds both `nym2` and `ehy2` from the raw `y`,
/// so the SPK must share that same witness across both ciphertexts.
#[allow(clippy::too_many_arguments)]
fn sign_equations<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    tail: &Gl19Tail<E>,
    a_hat: E::G1Affine,
    a_tilde: E::G1Affine,
    d: E::G1Affine,
    nym1: E::G1Affine,
    nym2: E::G1Affine,
    ehy1: E::G1Affine,
    ehy2: E::G1Affine,
) -> Vec<Equation<E>> {
    let mut equations = credential_equations(core, a_hat, a_tilde, d);
    equations.push(Equation::G1(EquationG1 {
        bases: ark_std::vec![core.g1],
        witness_indices: ark_std::vec![5],
        value: nym1,
    }));
    equations.push(Equation::G1(EquationG1 {
        bases: ark_std::vec![core.h, tail.y],
        witness_indices: ark_std::vec![4, 5],
        value: nym2,
    }));
    equations.push(Equation::G1(EquationG1 {
        bases: ark_std::vec![core.g1],
        witness_indices: ark_std::vec![6],
        value: ehy1,
    }));
    equations.push(Equation::G1(EquationG1 {
        bases: ark_std::vec![core.h, tail.y],
        witness_indices: ark_std::vec![4, 6],
        value: ehy2,
    }));
    equations
}

#[allow(clippy::too_many_arguments)]
fn sign_transcript<E: PairingEngine>(
    msg: &[u8],
    core: &CoreGroupKey<E>,
    tail: &Gl19Tail<E>,
    a_hat: &E::G1Affine,
    a_tilde: &E::G1Affine,
    d: &E::G1Affine,
    nym1: &E::G1Affine,
    nym2: &E::G1Affine,
    ehy1: &E::G1Affine,
    ehy2: &E::G1Affine,
    expiration: u64,
) -> Vec<u8> {
    let mut t = transcript(msg);
    push(&mut t, &core.g1);
    push(&mut t, &core.h);
    push(&mut t, &core.h1);
    push(&mut t, &tail.y);
    push(&mut t, a_hat);
    push(&mut t, a_tilde);
    push(&mut t, d);
    push(&mut t, nym1);
    push(&mut t, nym2);
    push(&mut t, ehy1);
    push(&mut t, ehy2);
    t.extend_from_slice(&expiration.to_be_bytes());
    t
}

pub fn sign<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    rng: &mut R,
) -> Result<Signature<E>, GroupSigError> {
    let (core, tail) = parts(grpkey)?;
    let (a, x, y, expiration) = member_parts(memkey)?;
    let cred = Credential { a, x };

    let a_blind = E::Fr::rand(rng);
    let b = E::Fr::rand(rng);
    let (a_hat, a_tilde) = randomize_credential(core, &cred, &y, &a_blind);
    let d = credential_commitment(core, a_blind, b);
    let y_prime = y * a_blind;

    let r = E::Fr::rand(rng);
    let r2 = E::Fr::rand(rng);
    let nym1 = core.g1.mul(r.into_repr()).into_affine();
    let nym2 = (core.h.mul(y.into_repr()) + tail.y.mul(r.into_repr())).into_affine();
    let ehy1 = core.g1.mul(r2.into_repr()).into_affine();
    let ehy2 = (core.h.mul(y.into_repr()) + tail.y.mul(r2.into_repr())).into_affine();

    let equations = sign_equations(core, tail, a_hat, a_tilde, d, nym1, nym2, ehy1, ehy2);
    let blindings: Vec<_> = (0..7).map(|_| E::Fr::rand(rng)).collect();
    let protocol = RepProtocol::init(
        ark_std::vec![x, y_prime, a_blind, b, y, r, r2],
        blindings,
        equations,
    )?;
    let t = sign_transcript(msg, core, tail, &a_hat, &a_tilde, &d, &nym1, &nym2, &ehy1, &ehy2, expiration);
    let spk = Spk::prove(protocol, &t)?;

    Ok(Signature::Gl19 { a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, expiration })
}

pub fn verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    msg: &[u8],
    now: u64,
) -> Result<bool, GroupSigError> {
    let (core, tail) = parts(grpkey)?;
    let (a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, expiration) = match sig {
        Signature::Gl19 { a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, expiration } => {
            (a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, *expiration)
        }
        _ => return Err(GroupSigError::InvalidArgument("not a GL19 signature")),
    };
    if now > expiration {
        return Ok(false);
    }
    if !verify_randomized_credential(core, a_hat, a_tilde) {
        return Ok(false);
    }
    let equations = sign_equations(core, tail, *a_hat, *a_tilde, *d, *nym1, *nym2, *ehy1, *ehy2);
    let t = sign_transcript(msg, core, tail, a_hat, a_tilde, d, nym1, nym2, ehy1, ehy2, expiration);
    Ok(spk.verify(&equations, &t).is_ok())
}

pub fn verify_batch<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
    msgs: &[&[u8]],
    now: u64,
    rng: &mut R,
) -> Result<bool, GroupSigError> {
    if sigs.len() != msgs.len() {
        return Err(GroupSigError::InvalidArgument("sigs/msgs length mismatch"));
    }
    let (core, tail) = parts(grpkey)?;
    let mut pairs = Vec::with_capacity(sigs.len());
    for (sig, msg) in sigs.iter().zip(msgs.iter()) {
        let (a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, expiration) = match sig {
            Signature::Gl19 { a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, expiration } => {
                (a_hat, a_tilde, d, spk, nym1, nym2, ehy1, ehy2, *expiration)
            }
            _ => return Err(GroupSigError::InvalidArgument("not a GL19 signature")),
        };
        if now > expiration {
            return Ok(false);
        }
        let equations = sign_equations(core, tail, *a_hat, *a_tilde, *d, *nym1, *nym2, *ehy1, *ehy2);
        let t = sign_transcript(msg, core, tail, a_hat, a_tilde, d, nym1, nym2, ehy1, ehy2, expiration);
        if spk.verify(&equations, &t).is_err() {
            return Ok(false);
        }
        pairs.push((*a_hat, *a_tilde));
    }
    Ok(verify_randomized_credentials_batch(core, &pairs, rng))
}

/// Encrypt `(ehy1, ehy2)` under `bldkey.bpk` (spec 4.6's `blind`): adds a
/// second first-component `b = g1^s` tracking the fresh randomness used to
/// fold in `bpk^s`, kept separate from the Converter's `a` so `convert` and
/// `unblind` can each remove their own layer independently.
pub fn blind<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    bldkey: &BlindingKeyPair<E>,
    rng: &mut R,
) -> Result<Gl19Blinded<E>, GroupSigError> {
    let (core, _) = parts(grpkey)?;
    let (ehy1, ehy2) = match sig {
        Signature::Gl19 { ehy1, ehy2, .. } => (*ehy1, *ehy2),
        _ => return Err(GroupSigError::InvalidArgument("not a GL19 signature")),
    };
    let s = E::Fr::rand(rng);
    let b = core.g1.mul(s.into_repr()).into_affine();
    let c = (ehy2.into_projective() + bldkey.bpk.mul(s.into_repr())).into_affine();
    Ok(Gl19Blinded { a: ehy1, b, c })
}

/// Peel the Converter's layer off every element of the batch and fold in a
/// domain-specific term, preserving input order (spec 4.6/5: "Batching is
/// critical ... the API mandates accepting arrays").
pub fn convert<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    bsigs: &[Gl19Blinded<E>],
    domain: &[u8],
) -> Result<Vec<Gl19Converted<E>>, GroupSigError> {
    parts(grpkey)?;
    let xi = mgr_xi(mgrkey)?;
    let h_domain = domain_base::<E>(domain);
    let term = h_domain.mul(xi.into_repr());
    Ok(bsigs
        .iter()
        .map(|b| {
            let c = (b.c.into_projective() - b.a.mul(xi.into_repr()) + term).into_affine();
            Gl19Converted { b: b.b, c }
        })
        .collect())
}

/// Peel the blinder's layer, recovering `h^y · H_G1(domain)^xi` (spec 4.6's
/// `unblind`): deterministic in `(y, domain)` for a fixed converter key,
/// regardless of the random `s`/`r2` chosen along the way (spec 8 testable
/// property 7).
pub fn unblind<E: PairingEngine>(
    csig: &Gl19Converted<E>,
    bldkey: &BlindingKeyPair<E>,
) -> E::G1Affine {
    (csig.c.into_projective() - csig.b.mul(bldkey.bsk.into_repr())).into_affine()
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
        expiration: u64,
        rng: &mut R,
    ) -> MemberKey<Bls12_381> {
        let mut mgr = ManagerJoin::new();
        let mut mem = join_mem_start();
        let msg0 = join_mgr_start(&mut mgr, rng);
        let msg1 = join_mem_step(&mut mem, msg0, grpkey, rng).unwrap();
        let msg2 = join_mgr_step(&mut mgr, msg1, grpkey, mgrkey, gml, rng).unwrap();
        join_mem_finalize(mem, msg2, grpkey, expiration).unwrap()
    }

    #[test]
    fn sign_then_verify_round_trip_respects_expiration() {
        let mut rng = StdRng::seed_from_u64(210u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Gl19);
        let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, 1_000, &mut rng);

        let sig = sign(&grpkey, &memkey, b"hello", &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello", 500).unwrap());
        assert!(!verify(&grpkey, &sig, b"hello", 1_001).unwrap());
        assert!(!verify(&grpkey, &sig, b"tampered", 500).unwrap());
    }

    #[test]
    fn convert_unblind_pseudonym_is_deterministic_and_stable_across_reblinding() {
        let mut rng = StdRng::seed_from_u64(211u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = Gml::new(crate::SchemeId::Gl19);
        let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, 1_000, &mut rng);
        let (core, _) = parts(&grpkey).unwrap();
        let bldkey = BlindingKeyPair::generate(&mut rng, core.g1);

        let sig1 = sign(&grpkey, &memkey, b"m1", &mut rng).unwrap();
        let bsig1 = blind(&grpkey, &sig1, &bldkey, &mut rng).unwrap();
        let csig1 = convert(&grpkey, &mgrkey, &[bsig1], b"domain-a")
            .unwrap()
            .remove(0);
        let nym1 = unblind(&csig1, &bldkey);

        let sig2 = sign(&grpkey, &memkey, b"m2", &mut rng).unwrap();
        let bsig2 = blind(&grpkey, &sig2, &bldkey, &mut rng).unwrap();
        let csig2 = convert(&grpkey, &mgrkey, &[bsig2], b"domain-a")
            .unwrap()
            .remove(0);
        let nym2 = unblind(&csig2, &bldkey);

        assert_eq!(nym1, nym2);

        let csig3 = convert(&grpkey, &mgrkey, &[blind(&grpkey, &sig1, &bldkey, &mut rng).unwrap()], b"domain-b")
            .unwrap()
            .remove(0);
        let nym_other_domain = unblind(&csig3, &bldkey);
        assert_ne!(nym1, nym_other_domain);
    }
}
