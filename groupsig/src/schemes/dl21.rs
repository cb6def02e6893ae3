//! DL21 (spec 4.4/4.7, scheme code 6): BBS04's credential and core SPK with
//! no GML (per `SchemeDescriptor::of`'s `has_gml: false`) and a per-scope
//! pseudonym `nym = H_G1(scope)^y` instead of an escrow. `identify` lets a
//! member recognise their own signatures; `link`/`verify_link` let a member
//! prove several of their signatures, across scopes, share one identifier
//! without revealing it. Grounded on `credential.rs`/`join.rs`'s shared
//! engine; the link proof reuses `spk::Spk`/`schnorr_pok::representation`
//! exactly as the signature's own SPK does, one equation per linked
//! signature sharing the single witness `y`.

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;
use ark_std::UniformRand;
use blake2::Blake2b;
use gs_crypto_utils::hashing_utils::projective_group_elem_from_try_and_incr;
use schnorr_pok::representation::{Equation, EquationG1, RepProtocol};

use crate::credential::{
    randomize_credential, verify_randomized_credential, verify_randomized_credentials_batch,
    CoreGroupKey, Credential, IssuerSecretKey,
};
use crate::error::GroupSigError;
use crate::join::{JoinMessage, ManagerJoin, MemberJoin};
use crate::keys::{GroupPublicKey, ManagerKey, MemberKey};
use crate::proof::Proof;
use crate::scheme::SchemeId;
use crate::signature::Signature;
use crate::spk::Spk;

use super::support::{credential_commitment, credential_equations, push, transcript};

/// Hashes `scope` into a fixed `G1` point, the per-context pseudonym base
/// (spec glossary: "Scope ... fixing the pseudonym basis").
pub fn scope_base<E: PairingEngine>(scope: &[u8]) -> E::G1Affine {
    projective_group_elem_from_try_and_incr::<E::G1Affine, Blake2b>(scope).into_affine()
}

pub fn setup<E: PairingEngine, R: RngCore>(rng: &mut R) -> (GroupPublicKey<E>, ManagerKey<E>) {
    let isk = IssuerSecretKey::generate(rng);
    let core = CoreGroupKey::generate_using_rng(rng, &isk.0);
    (GroupPublicKey::Dl21(core), ManagerKey::Dl21 { isk })
}

fn core_of<E: PairingEngine>(grpkey: &GroupPublicKey<E>) -> Result<&CoreGroupKey<E>, GroupSigError> {
    match grpkey {
        GroupPublicKey::Dl21(core) => Ok(core),
        _ => Err(GroupSigError::InvalidArgument("not a DL21 group key")),
    }
}

fn member_parts<E: PairingEngine>(
    memkey: &MemberKey<E>,
) -> Result<(E::G1Affine, E::Fr, E::Fr), GroupSigError> {
    match memkey {
        MemberKey::Dl21 { a, x, y } => Ok((*a, *x, *y)),
        _ => Err(GroupSigError::InvalidArgument("not a DL21 member key")),
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
    rng: &mut R,
) -> Result<JoinMessage<E>, GroupSigError> {
    let core = core_of(grpkey)?;
    let isk = match mgrkey {
        ManagerKey::Dl21 { isk } => &isk.0,
        _ => return Err(GroupSigError::InvalidArgument("not a DL21 manager key")),
    };
    let (outbound, _f) = mgr.step(inbound, core, isk, rng)?;
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
    let core = core_of(grpkey)?;
    mem.step(inbound, core, rng)
}

pub fn join_mem_finalize<E: PairingEngine>(
    mem: MemberJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
) -> Result<MemberKey<E>, GroupSigError> {
    let core = core_of(grpkey)?;
    let (cred, y) = mem.finalize(inbound, core)?;
    Ok(MemberKey::Dl21 { a: cred.a, x: cred.x, y })
}

/// `credential_equations`'s unchanged BBS04 conjunction (witnesses `[x, y',
/// a_blind, b]`, indices 0..=3) plus a fourth binding `nym` to the member's
/// long-term `y` directly (witness index 4) rather than the per-signature
/// `y' = y·a_blind` the first two equations use — `identify`/`link` need
/// `nym` reproducible from `memkey.y` alone.
fn sign_equations<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    a_hat: E::G1Affine,
    a_tilde: E::G1Affine,
    d: E::G1Affine,
    scope_h: E::G1Affine,
    nym: E::G1Affine,
) -> Vec<Equation<E>> {
    let mut equations = credential_equations(core, a_hat, a_tilde, d);
    equations.push(Equation::G1(EquationG1 {
        bases: ark_std::vec![scope_h],
        witness_indices: ark_std::vec![4],
        value: nym,
    }));
    equations
}

fn sign_transcript<E: PairingEngine>(
    msg: &[u8],
    core: &CoreGroupKey<E>,
    a_hat: &E::G1Affine,
    a_tilde: &E::G1Affine,
    d: &E::G1Affine,
    scope_h: &E::G1Affine,
    nym: &E::G1Affine,
) -> Vec<u8> {
    let mut t = transcript(msg);
    push(&mut t, &core.g1);
    push(&mut t, &core.h);
    push(&mut t, &core.h1);
    push(&mut t, scope_h);
    push(&mut t, a_hat);
    push(&mut t, a_tilde);
    push(&mut t, d);
    push(&mut t, nym);
    t
}

pub fn sign<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    scope: &[u8],
    rng: &mut R,
) -> Result<Signature<E>, GroupSigError> {
    let core = core_of(grpkey)?;
    let (a, x, y) = member_parts(memkey)?;
    let cred = Credential { a, x };

    let a_blind = E::Fr::rand(rng);
    let b = E::Fr::rand(rng);
    let (a_hat, a_tilde) = randomize_credential(core, &cred, &y, &a_blind);
    let d = credential_commitment(core, a_blind, b);
    let y_prime = y * a_blind;

    let scope_h = scope_base::<E>(scope);
    let nym = scope_h.mul(y.into_repr()).into_affine();

    let equations = sign_equations(core, a_hat, a_tilde, d, scope_h, nym);
    let blindings = ark_std::vec![
        E::Fr::rand(rng),
        E::Fr::rand(rng),
        E::Fr::rand(rng),
        E::Fr::rand(rng),
        E::Fr::rand(rng)
    ];
    let protocol = RepProtocol::init(ark_std::vec![x, y_prime, a_blind, b, y], blindings, equations)?;
    let t = sign_transcript(msg, core, &a_hat, &a_tilde, &d, &scope_h, &nym);
    let spk = Spk::prove(protocol, &t)?;

    Ok(Signature::Dl21 { a_hat, a_tilde, d, spk, nym })
}

fn sig_parts<E: PairingEngine>(
    sig: &Signature<E>,
) -> Result<(E::G1Affine, E::G1Affine, E::G1Affine, &Spk<E>, E::G1Affine), GroupSigError> {
    match sig {
        Signature::Dl21 { a_hat, a_tilde, d, spk, nym } => Ok((*a_hat, *a_tilde, *d, spk, *nym)),
        _ => Err(GroupSigError::InvalidArgument("not a DL21 signature")),
    }
}

pub fn verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    msg: &[u8],
    scope: &[u8],
) -> Result<bool, GroupSigError> {
    let core = core_of(grpkey)?;
    let (a_hat, a_tilde, d, spk, nym) = sig_parts(sig)?;
    if !verify_randomized_credential(core, &a_hat, &a_tilde) {
        return Ok(false);
    }
    let scope_h = scope_base::<E>(scope);
    let equations = sign_equations(core, a_hat, a_tilde, d, scope_h, nym);
    let t = sign_transcript(msg, core, &a_hat, &a_tilde, &d, &scope_h, &nym);
    Ok(spk.verify(&equations, &t).is_ok())
}

pub fn verify_batch<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
    msgs: &[&[u8]],
    scopes: &[&[u8]],
    rng: &mut R,
) -> Result<bool, GroupSigError> {
    if sigs.len() != msgs.len() || sigs.len() != scopes.len() {
        return Err(GroupSigError::InvalidArgument("sigs/msgs/scopes length mismatch"));
    }
    let core = core_of(grpkey)?;
    let mut pairs = Vec::with_capacity(sigs.len());
    for ((sig, msg), scope) in sigs.iter().zip(msgs.iter()).zip(scopes.iter()) {
        let (a_hat, a_tilde, d, spk, nym) = sig_parts(sig)?;
        let scope_h = scope_base::<E>(scope);
        let equations = sign_equations(core, a_hat, a_tilde, d, scope_h, nym);
        let t = sign_transcript(msg, core, &a_hat, &a_tilde, &d, &scope_h, &nym);
        if spk.verify(&equations, &t).is_err() {
            return Ok(false);
        }
        pairs.push((a_hat, a_tilde));
    }
    Ok(verify_randomized_credentials_batch(core, &pairs, rng))
}

/// Spec 4.7's `identify`: does `sig`'s pseudonym match the one `memkey`
/// would produce for its scope?
pub fn identify<E: PairingEngine>(memkey: &MemberKey<E>, sig: &Signature<E>, scope: &[u8]) -> Result<bool, GroupSigError> {
    let (_, _, y) = member_parts(memkey)?;
    let (.., nym) = sig_parts(sig)?;
    let candidate = scope_base::<E>(scope).mul(y.into_repr()).into_affine();
    Ok(candidate == nym)
}

fn link_transcript<E: PairingEngine>(msg: &[u8], nyms: &[E::G1Affine], bases: &[E::G1Affine]) -> Vec<u8> {
    let mut t = transcript(msg);
    for (nym, base) in nyms.iter().zip(bases.iter()) {
        push(&mut t, base);
        push(&mut t, nym);
    }
    t
}

fn link_equations<E: PairingEngine>(nyms: &[E::G1Affine], bases: &[E::G1Affine]) -> Vec<Equation<E>> {
    nyms.iter()
        .zip(bases.iter())
        .map(|(nym, base)| {
            Equation::G1(EquationG1 {
                bases: ark_std::vec![*base],
                witness_indices: ark_std::vec![0],
                value: *nym,
            })
        })
        .collect()
}

/// Spec 4.7's `link`: prove one `y` is the discrete log of every signature's
/// pseudonym under its own scope base, bound to `msg` against replay.
/// Every `(sig, scope)` must first verify and `identify` as the caller's.
pub fn link<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    sigs_and_scopes: &[(&Signature<E>, &[u8])],
    rng: &mut R,
) -> Result<Proof<E>, GroupSigError> {
    let (_, _, y) = member_parts(memkey)?;
    let mut nyms = Vec::with_capacity(sigs_and_scopes.len());
    let mut bases = Vec::with_capacity(sigs_and_scopes.len());
    for (sig, scope) in sigs_and_scopes {
        if !verify(grpkey, sig, msg, scope)? {
            return Err(GroupSigError::CryptoFail("a linked signature did not verify"));
        }
        if !identify(memkey, sig, scope)? {
            return Err(GroupSigError::InvalidArgument(
                "a linked signature does not belong to this member",
            ));
        }
        let (.., nym) = sig_parts(sig)?;
        nyms.push(nym);
        bases.push(scope_base::<E>(scope));
    }
    let equations = link_equations(&nyms, &bases);
    let blindings = ark_std::vec![E::Fr::rand(rng)];
    let protocol = RepProtocol::init(ark_std::vec![y], blindings, equations)?;
    let t = link_transcript(msg, &nyms, &bases);
    let spk = Spk::prove(protocol, &t)?;
    Ok(Proof::DlLink { scheme: SchemeId::Dl21, spk })
}

/// Spec 4.7's `verify_link`: re-verify each signature, recompute each scope
/// base, and check the combined SPK.
pub fn verify_link<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    msg: &[u8],
    sigs_and_scopes: &[(&Signature<E>, &[u8])],
    proof: &Proof<E>,
) -> Result<bool, GroupSigError> {
    let spk = match proof {
        Proof::DlLink { scheme: SchemeId::Dl21, spk } => spk,
        Proof::DlLink { .. } => return Err(GroupSigError::InvalidArgument("link proof is for a different scheme")),
        _ => return Err(GroupSigError::InvalidArgument("not a link proof")),
    };
    let mut nyms = Vec::with_capacity(sigs_and_scopes.len());
    let mut bases = Vec::with_capacity(sigs_and_scopes.len());
    for (sig, scope) in sigs_and_scopes {
        if !verify(grpkey, sig, msg, scope)? {
            return Ok(false);
        }
        let (.., nym) = sig_parts(sig)?;
        nyms.push(nym);
        bases.push(scope_base::<E>(scope));
    }
    let equations = link_equations(&nyms, &bases);
    let t = link_transcript(msg, &nyms, &bases);
    Ok(spk.verify(&equations, &t).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn join_one_member<R: RngCore>(
        grpkey: &GroupPublicKey<Bls12_381>,
        mgrkey: &ManagerKey<Bls12_381>,
        rng: &mut R,
    ) -> MemberKey<Bls12_381> {
        let mut mgr = ManagerJoin::new();
        let mut mem = join_mem_start();
        let msg0 = join_mgr_start(&mut mgr, rng);
        let msg1 = join_mem_step(&mut mem, msg0, grpkey, rng).unwrap();
        let msg2 = join_mgr_step(&mut mgr, msg1, grpkey, mgrkey, rng).unwrap();
        join_mem_finalize(mem, msg2, grpkey).unwrap()
    }

    #[test]
    fn sign_verify_and_identify_round_trip() {
        let mut rng = StdRng::seed_from_u64(220u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let member_i = join_one_member(&grpkey, &mgrkey, &mut rng);
        let member_j = join_one_member(&grpkey, &mgrkey, &mut rng);

        let sig = sign(&grpkey, &member_i, b"hello", b"scope-1", &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello", b"scope-1").unwrap());
        assert!(!verify(&grpkey, &sig, b"hello", b"scope-2").unwrap());

        assert!(identify(&member_i, &sig, b"scope-1").unwrap());
        assert!(!identify(&member_j, &sig, b"scope-1").unwrap());
    }

    #[test]
    fn link_proves_shared_identifier_and_rejects_impostor_substitution() {
        let mut rng = StdRng::seed_from_u64(221u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let member_d = join_one_member(&grpkey, &mgrkey, &mut rng);
        let member_e = join_one_member(&grpkey, &mgrkey, &mut rng);

        let sig1 = sign(&grpkey, &member_d, b"m1", b"scope", &mut rng).unwrap();
        let sig2 = sign(&grpkey, &member_d, b"m1", b"scope", &mut rng).unwrap();
        let sig3 = sign(&grpkey, &member_d, b"m1", b"scope", &mut rng).unwrap();

        let batch = ark_std::vec![
            (&sig1, b"scope".as_slice()),
            (&sig2, b"scope".as_slice()),
            (&sig3, b"scope".as_slice())
        ];
        let proof = link(&grpkey, &member_d, b"m1", &batch, &mut rng).unwrap();
        assert!(verify_link(&grpkey, b"m1", &batch, &proof).unwrap());

        let impostor_sig = sign(&grpkey, &member_e, b"m1", b"scope", &mut rng).unwrap();
        let tampered = ark_std::vec![
            (&sig1, b"scope".as_slice()),
            (&impostor_sig, b"scope".as_slice()),
            (&sig3, b"scope".as_slice())
        ];
        assert!(!verify_link(&grpkey, b"m1", &tampered, &proof).unwrap());
    }
}
