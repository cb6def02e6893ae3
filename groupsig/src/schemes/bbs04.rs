//! BBS04 (spec 4.4, scheme code 1): the baseline scheme every other
//! BBS+-style scheme in this crate extends. `setup` samples fresh
//! generators and an issuer key; `sign` re-randomises the member's
//! credential and proves knowledge of the witnesses `(x, b, y')` used to
//! build it; `verify`/`verify_batch` check the credential-validity pairing
//! plus that SPK. Grounded on `credential.rs`/`join.rs`'s shared engine —
//! this module adds nothing beyond wiring them together and the two-equation
//! conjunction spec 4.4 step 2 specifies.

use ark_ec::PairingEngine;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;
use ark_std::UniformRand;
use schnorr_pok::representation::Equation;
use schnorr_pok::representation::RepProtocol;

use crate::credential::{
    issue_credential, randomize_credential, verify_randomized_credential,
    verify_randomized_credentials_batch, CoreGroupKey, Credential, IssuerSecretKey,
};
use crate::error::GroupSigError;
use crate::join::{JoinMessage, ManagerJoin, MemberJoin};
use crate::keys::{GroupPublicKey, ManagerKey, MemberKey};
use crate::signature::Signature;
use crate::spk::Spk;

use super::support::{credential_commitment, credential_equations, push, transcript};

/// `setup`: fresh generators, fresh issuer key, no inspector role (spec 4.3:
/// BBS04 has "one `setup` call, one manager role").
pub fn setup<E: PairingEngine, R: RngCore>(rng: &mut R) -> (GroupPublicKey<E>, ManagerKey<E>) {
    let isk = IssuerSecretKey::generate(rng);
    let core = CoreGroupKey::generate_using_rng(rng, &isk.0);
    (GroupPublicKey::Bbs04(core), ManagerKey::Bbs04 { isk })
}

pub fn core_of<E: PairingEngine>(grpkey: &GroupPublicKey<E>) -> Result<&CoreGroupKey<E>, GroupSigError> {
    match grpkey {
        GroupPublicKey::Bbs04(c) => Ok(c),
        _ => Err(GroupSigError::InvalidArgument("not a BBS04 group key")),
    }
}

fn isk_of<E: PairingEngine>(mgrkey: &ManagerKey<E>) -> Result<&E::Fr, GroupSigError> {
    match mgrkey {
        ManagerKey::Bbs04 { isk } => Ok(&isk.0),
        _ => Err(GroupSigError::InvalidArgument("not a BBS04 manager key")),
    }
}

fn member_parts<E: PairingEngine>(
    memkey: &MemberKey<E>,
) -> Result<(E::G1Affine, E::Fr, E::Fr), GroupSigError> {
    match memkey {
        MemberKey::Bbs04 { a, x, y } => Ok((*a, *x, *y)),
        _ => Err(GroupSigError::InvalidArgument("not a BBS04 member key")),
    }
}

/// Mgr side of Join (spec 4.3 seq=0/seq=2): thin wrapper over
/// `join::ManagerJoin` that also appends the fresh commitment to the GML.
pub fn join_mgr_start<E: PairingEngine, R: RngCore>(
    mgr: &mut ManagerJoin<E>,
    rng: &mut R,
) -> JoinMessage<E> {
    mgr.start(rng)
}

pub fn join_mgr_step<E: PairingEngine, R: RngCore>(
    mgr: &mut ManagerJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    gml: &mut crate::gml::Gml<E>,
    rng: &mut R,
) -> Result<JoinMessage<E>, GroupSigError> {
    let core = core_of(grpkey)?;
    let isk = isk_of(mgrkey)?;
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
    mem.step(inbound, core_of(grpkey)?, rng)
}

pub fn join_mem_finalize<E: PairingEngine>(
    mem: MemberJoin<E>,
    inbound: JoinMessage<E>,
    grpkey: &GroupPublicKey<E>,
) -> Result<MemberKey<E>, GroupSigError> {
    let (cred, y) = mem.finalize(inbound, core_of(grpkey)?)?;
    Ok(MemberKey::Bbs04 { a: cred.a, x: cred.x, y })
}

/// The two-equation conjunction Sign/Verify share (spec 4.4 step 2):
/// witnesses `[x, y', a_blind, b]`.
///
/// - `a_tilde = a_hat^(-x) · h^y' · g1^a_blind`
/// - `d = h1^a_blind · h^b`
fn sign_equations<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    a_hat: E::G1Affine,
    a_tilde: E::G1Affine,
    d: E::G1Affine,
) -> Vec<Equation<E>> {
    credential_equations(core, a_hat, a_tilde, d)
}

fn sign_transcript<E: PairingEngine>(
    msg: &[u8],
    core: &CoreGroupKey<E>,
    a_hat: &E::G1Affine,
    a_tilde: &E::G1Affine,
    d: &E::G1Affine,
) -> Vec<u8> {
    let mut t = transcript(msg);
    push(&mut t, &core.g1);
    push(&mut t, &core.h);
    push(&mut t, &core.h1);
    push(&mut t, a_hat);
    push(&mut t, a_tilde);
    push(&mut t, d);
    t
}

pub fn sign<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
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

    let equations = sign_equations(core, a_hat, a_tilde, d);
    let blindings = ark_std::vec![
        E::Fr::rand(rng),
        E::Fr::rand(rng),
        E::Fr::rand(rng),
        E::Fr::rand(rng)
    ];
    let protocol = RepProtocol::init(ark_std::vec![x, y_prime, a_blind, b], blindings, equations)?;
    let spk = Spk::prove(protocol, &sign_transcript(msg, core, &a_hat, &a_tilde, &d))?;

    Ok(Signature::Bbs04 { a_hat, a_tilde, d, spk })
}

pub fn verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    msg: &[u8],
) -> Result<bool, GroupSigError> {
    let core = core_of(grpkey)?;
    let (a_hat, a_tilde, d, spk) = match sig {
        Signature::Bbs04 { a_hat, a_tilde, d, spk } => (a_hat, a_tilde, d, spk),
        _ => return Err(GroupSigError::InvalidArgument("not a BBS04 signature")),
    };
    if !verify_randomized_credential(core, a_hat, a_tilde) {
        return Ok(false);
    }
    let equations = sign_equations(core, *a_hat, *a_tilde, *d);
    let transcript = sign_transcript(msg, core, a_hat, a_tilde, d);
    Ok(spk.verify(&equations, &transcript).is_ok())
}

/// Spec 8's testable property 5: `verify_batch`'s result must be
/// numerically equivalent to `n` individual `verify` calls. The SPK half is
/// cheap and checked per-signature; only the credential-validity pairing is
/// actually batched (see `credential::verify_randomized_credentials_batch`).
pub fn verify_batch<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
    msgs: &[&[u8]],
    rng: &mut R,
) -> Result<bool, GroupSigError> {
    if sigs.len() != msgs.len() {
        return Err(GroupSigError::InvalidArgument("sigs/msgs length mismatch"));
    }
    let core = core_of(grpkey)?;
    let mut pairs = Vec::with_capacity(sigs.len());
    for (sig, msg) in sigs.iter().zip(msgs.iter()) {
        let (a_hat, a_tilde, d, spk) = match sig {
            Signature::Bbs04 { a_hat, a_tilde, d, spk } => (a_hat, a_tilde, d, spk),
            _ => return Err(GroupSigError::InvalidArgument("not a BBS04 signature")),
        };
        let equations = sign_equations(core, *a_hat, *a_tilde, *d);
        let t = sign_transcript(msg, core, a_hat, a_tilde, d);
        if spk.verify(&equations, &t).is_err() {
            return Ok(false);
        }
        pairs.push((*a_hat, *a_tilde));
    }
    Ok(verify_randomized_credentials_batch(core, &pairs, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn join_one_member<R: RngCore>(
        grpkey: &GroupPublicKey<Bls12_381>,
        mgrkey: &ManagerKey<Bls12_381>,
        gml: &mut crate::gml::Gml<Bls12_381>,
        rng: &mut R,
    ) -> MemberKey<Bls12_381> {
        let mut mgr = ManagerJoin::new();
        let mut mem = join_mem_start();
        let msg0 = join_mgr_start(&mut mgr, rng);
        let msg1 = join_mem_step(&mut mem, msg0, grpkey, rng).unwrap();
        let msg2 = join_mgr_step(&mut mgr, msg1, grpkey, mgrkey, gml, rng).unwrap();
        join_mem_finalize(mem, msg2, grpkey).unwrap()
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let mut rng = StdRng::seed_from_u64(100u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = crate::gml::Gml::new(crate::SchemeId::Bbs04);
        let memkey = join_one_member(&grpkey, &mgrkey, &mut gml, &mut rng);

        let sig = sign(&grpkey, &memkey, b"hello", &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello").unwrap());
        assert!(!verify(&grpkey, &sig, b"tampered").unwrap());
    }

    #[test]
    fn verify_batch_matches_individual_verify() {
        let mut rng = StdRng::seed_from_u64(101u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(&mut rng);
        let mut gml = crate::gml::Gml::new(crate::SchemeId::Bbs04);

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

        // Splicing one signature's a_hat onto another breaks the per-item
        // credential pairing relation; the batch must catch it too.
        let hat0 = match &sigs[0] {
            Signature::Bbs04 { a_hat, .. } => *a_hat,
            _ => unreachable!(),
        };
        let mut mixed = sigs.clone();
        if let Signature::Bbs04 { a_hat, .. } = &mut mixed[1] {
            *a_hat = hat0;
        }
        assert!(!verify_batch(&grpkey, &mixed, &msgs, &mut rng).unwrap());
    }
}
