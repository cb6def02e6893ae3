//! The uniform façade: thin entry points dispatched purely by scheme tag.
//! Everything here already exists one layer down in `schemes::*`; this
//! module's only job is to read the scheme off its tagged inputs, check
//! every other tagged input against it (`scheme::require_same_scheme` — no
//! entry point accepts mixed-scheme objects), and call the one scheme
//! module that matches.
//!
//! Per-scheme Sign/Verify need different extra inputs — DL21's scope,
//! DL21-SEQ's scope plus its sequence counter, GL19's current time for
//! expiration — so rather than invent five near-identical function
//! signatures, those extras are bundled into small `*Extra` structs with
//! `Option` fields, checked against the dispatched-to scheme at call time.
//! A field left `None` for a scheme that needs it is a caller error
//! (`InvalidArgument`), same as any other malformed input.

use ark_ec::PairingEngine;
use ark_std::rand::RngCore;
use ark_std::vec::Vec;

use crate::error::GroupSigError;
use crate::gml::Gml;
use crate::join::{JoinMessage, ManagerJoin, MemberJoin};
use crate::keys::{BlindingKeyPair, GroupPublicKey, ManagerKey, MemberKey};
use crate::proof::Proof;
use crate::scheme::{require_same_scheme, SchemeDescriptor, SchemeId};
use crate::schemes::gl19::{self, Gl19Blinded, Gl19Converted};
use crate::schemes::ps16::{self, Ps16JoinMessage, Ps16ManagerJoin, Ps16MemberJoin};
use crate::schemes::{bbs04, dl21, dl21seq, klap20};
use crate::signature::Signature;

/// Introspection record for a scheme code (registry lookup plus a field
/// read, same seam every other entry point here uses).
pub fn descriptor(scheme: SchemeId) -> SchemeDescriptor {
    scheme.descriptor()
}

/// Fresh generators, fresh issuer key, and — for KLAP20/GL19 — the
/// inspector role's key in the same call (each scheme module's `setup`
/// already bundles both shares; see `keys::ManagerKey`'s per-scheme
/// variants for why a single combined call is enough here).
pub fn setup<E: PairingEngine, R: RngCore>(
    scheme: SchemeId,
    rng: &mut R,
) -> (GroupPublicKey<E>, ManagerKey<E>) {
    log::debug!("facade: setting up a fresh {} group", scheme);
    match scheme {
        SchemeId::Bbs04 => bbs04::setup(rng),
        SchemeId::Gl19 => gl19::setup(rng),
        SchemeId::Ps16 => ps16::setup(rng),
        SchemeId::Klap20 => klap20::setup(rng),
        SchemeId::Dl21 => dl21::setup(rng),
        SchemeId::Dl21Seq => dl21seq::setup(rng),
    }
}

/// Member side of the three-message Join state machine, tagged because
/// PS16's is built atop its own credential shape
/// (`schemes::ps16::Ps16MemberJoin`) rather than the `join::MemberJoin`
/// every other scheme here shares.
pub enum MemberJoinState<E: PairingEngine> {
    Shared(MemberJoin<E>),
    Ps16(Ps16MemberJoin<E>),
}

/// Manager side of the same state machine, tagged the same way.
pub enum ManagerJoinState<E: PairingEngine> {
    Shared(ManagerJoin<E>),
    Ps16(Ps16ManagerJoin<E>),
}

/// One wire message of the Join transcript, tagged the same way.
#[derive(Clone, Debug, PartialEq)]
pub enum JoinWireMessage<E: PairingEngine> {
    Shared(JoinMessage<E>),
    Ps16(Ps16JoinMessage<E>),
}

pub fn mem_join_new<E: PairingEngine>(scheme: SchemeId) -> MemberJoinState<E> {
    match scheme {
        SchemeId::Ps16 => MemberJoinState::Ps16(Ps16MemberJoin::new()),
        _ => MemberJoinState::Shared(MemberJoin::new()),
    }
}

pub fn mgr_join_new<E: PairingEngine>(scheme: SchemeId) -> ManagerJoinState<E> {
    match scheme {
        SchemeId::Ps16 => ManagerJoinState::Ps16(Ps16ManagerJoin::new()),
        _ => ManagerJoinState::Shared(ManagerJoin::new()),
    }
}

/// Opens a Join session: the manager sends the fresh challenge nonce that
/// starts the transcript.
pub fn mgr_join_start<E: PairingEngine, R: RngCore>(
    state: &mut ManagerJoinState<E>,
    rng: &mut R,
) -> JoinWireMessage<E> {
    match state {
        ManagerJoinState::Shared(mgr) => JoinWireMessage::Shared(mgr.start(rng)),
        ManagerJoinState::Ps16(mgr) => JoinWireMessage::Ps16(mgr.start(rng)),
    }
}

/// Member's response to the manager's challenge: commit to a fresh hidden
/// identifier and prove knowledge of it.
pub fn mem_join_step<E: PairingEngine, R: RngCore>(
    state: &mut MemberJoinState<E>,
    inbound: JoinWireMessage<E>,
    grpkey: &GroupPublicKey<E>,
    rng: &mut R,
) -> Result<JoinWireMessage<E>, GroupSigError> {
    match (state, inbound) {
        (MemberJoinState::Shared(mem), JoinWireMessage::Shared(msg)) => {
            Ok(JoinWireMessage::Shared(mem.step(msg, grpkey.core()?, rng)?))
        }
        (MemberJoinState::Ps16(mem), JoinWireMessage::Ps16(msg)) => {
            Ok(JoinWireMessage::Ps16(mem.step(msg, grpkey, rng)?))
        }
        _ => Err(GroupSigError::InvalidArgument(
            "join state/message scheme mismatch",
        )),
    }
}

/// Manager verifies the member's proof, issues the credential, and — for
/// every scheme with a membership ledger — appends the new entry in the
/// same call the credential is produced (a ledger insert can't be skipped
/// for a scheme that declares one, nor attempted for one that doesn't).
pub fn mgr_join_step<E: PairingEngine, R: RngCore>(
    state: &mut ManagerJoinState<E>,
    inbound: JoinWireMessage<E>,
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    gml: Option<&mut Gml<E>>,
    rng: &mut R,
) -> Result<JoinWireMessage<E>, GroupSigError> {
    require_same_scheme(grpkey.scheme(), mgrkey.scheme())?;
    let has_gml = grpkey.scheme().descriptor().has_gml;
    match (state, inbound) {
        (ManagerJoinState::Shared(mgr), JoinWireMessage::Shared(msg)) => {
            let core = grpkey.core()?;
            let isk = mgrkey
                .issuer_isk()
                .ok_or(GroupSigError::InvalidArgument("manager key has no issuer share"))?;
            let (outbound, f) = mgr.step(msg, core, isk, rng)?;
            match (has_gml, gml) {
                (true, Some(g)) => {
                    g.insert(f)?;
                }
                (true, None) => return Err(GroupSigError::InvalidArgument("scheme requires a GML")),
                (false, _) => {}
            }
            Ok(JoinWireMessage::Shared(outbound))
        }
        (ManagerJoinState::Ps16(mgr), JoinWireMessage::Ps16(msg)) => {
            let (outbound, f) = mgr.step(msg, grpkey, mgrkey, rng)?;
            match gml {
                Some(g) => {
                    g.insert(f)?;
                }
                None => return Err(GroupSigError::InvalidArgument("scheme requires a GML")),
            }
            Ok(JoinWireMessage::Ps16(outbound))
        }
        _ => Err(GroupSigError::InvalidArgument(
            "join state/message scheme mismatch",
        )),
    }
}

/// Extra inputs `mem_join_finalize` needs beyond the shared credential
/// check: only GL19's expiration, agreed out of band since the three-message
/// transcript carries no room for it.
#[derive(Clone, Copy, Debug, Default)]
pub struct FinalizeExtra {
    pub expiration: Option<u64>,
}

/// Member finalises Join, checking the issued credential against the
/// scheme's pairing equation before trusting it.
pub fn mem_join_finalize<E: PairingEngine, R: RngCore>(
    state: MemberJoinState<E>,
    inbound: JoinWireMessage<E>,
    grpkey: &GroupPublicKey<E>,
    extra: FinalizeExtra,
    rng: &mut R,
) -> Result<MemberKey<E>, GroupSigError> {
    match (state, inbound) {
        (MemberJoinState::Shared(mem), JoinWireMessage::Shared(msg)) => match grpkey.scheme() {
            SchemeId::Bbs04 => bbs04::join_mem_finalize(mem, msg, grpkey),
            SchemeId::Klap20 => klap20::join_mem_finalize(mem, msg, grpkey),
            SchemeId::Dl21 => dl21::join_mem_finalize(mem, msg, grpkey),
            SchemeId::Dl21Seq => dl21seq::join_mem_finalize(mem, msg, grpkey, rng),
            SchemeId::Gl19 => {
                let expiration = extra
                    .expiration
                    .ok_or(GroupSigError::InvalidArgument("GL19 join needs an expiration"))?;
                gl19::join_mem_finalize(mem, msg, grpkey, expiration)
            }
            SchemeId::Ps16 => Err(GroupSigError::InvalidArgument(
                "join state/message scheme mismatch",
            )),
        },
        (MemberJoinState::Ps16(mem), JoinWireMessage::Ps16(msg)) => {
            ps16::join_mem_finalize(mem, msg, grpkey)
        }
        _ => Err(GroupSigError::InvalidArgument(
            "join state/message scheme mismatch",
        )),
    }
}

/// Non-credential inputs Sign needs beyond `(grpkey, memkey, msg, rng)`.
/// Left at `None` for any scheme that doesn't use the field.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignExtra<'a> {
    pub scope: Option<&'a [u8]>,
    pub counter: Option<u64>,
}

pub fn sign<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    extra: SignExtra<'_>,
    rng: &mut R,
) -> Result<Signature<E>, GroupSigError> {
    require_same_scheme(grpkey.scheme(), memkey.scheme())?;
    match grpkey.scheme() {
        SchemeId::Bbs04 => bbs04::sign(grpkey, memkey, msg, rng),
        SchemeId::Klap20 => klap20::sign(grpkey, memkey, msg, rng),
        SchemeId::Gl19 => gl19::sign(grpkey, memkey, msg, rng),
        SchemeId::Ps16 => ps16::sign(grpkey, memkey, msg, rng),
        SchemeId::Dl21 => {
            let scope = extra
                .scope
                .ok_or(GroupSigError::InvalidArgument("DL21 sign needs a scope"))?;
            dl21::sign(grpkey, memkey, msg, scope, rng)
        }
        SchemeId::Dl21Seq => {
            let scope = extra
                .scope
                .ok_or(GroupSigError::InvalidArgument("DL21-SEQ sign needs a scope"))?;
            let counter = extra.counter.ok_or(GroupSigError::InvalidArgument(
                "DL21-SEQ sign needs a sequence counter",
            ))?;
            dl21seq::sign(grpkey, memkey, msg, scope, counter, rng)
        }
    }
}

/// Non-credential inputs Verify needs: DL21/DL21-SEQ's scope, GL19's
/// current time (checked against the signature's embedded expiration).
#[derive(Clone, Copy, Debug, Default)]
pub struct VerifyExtra<'a> {
    pub scope: Option<&'a [u8]>,
    pub now: Option<u64>,
}

pub fn verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    msg: &[u8],
    extra: VerifyExtra<'_>,
) -> Result<bool, GroupSigError> {
    require_same_scheme(grpkey.scheme(), sig.scheme())?;
    match grpkey.scheme() {
        SchemeId::Bbs04 => bbs04::verify(grpkey, sig, msg),
        SchemeId::Klap20 => klap20::verify(grpkey, sig, msg),
        SchemeId::Ps16 => ps16::verify(grpkey, sig, msg),
        SchemeId::Gl19 => {
            let now = extra
                .now
                .ok_or(GroupSigError::InvalidArgument("GL19 verify needs the current time"))?;
            gl19::verify(grpkey, sig, msg, now)
        }
        SchemeId::Dl21 => {
            let scope = extra
                .scope
                .ok_or(GroupSigError::InvalidArgument("DL21 verify needs a scope"))?;
            dl21::verify(grpkey, sig, msg, scope)
        }
        SchemeId::Dl21Seq => {
            let scope = extra
                .scope
                .ok_or(GroupSigError::InvalidArgument("DL21-SEQ verify needs a scope"))?;
            dl21seq::verify(grpkey, sig, msg, scope)
        }
    }
}

/// Batched counterpart of `verify`, one set of extras shared by the whole
/// batch (every signature in a batch is checked against the same scope/time
/// in every scheme that needs one — a per-signature extra isn't needed by
/// any scheme here, so this stays a single `VerifyExtra`-shaped input
/// rather than a slice of them).
#[derive(Clone, Copy, Debug, Default)]
pub struct VerifyBatchExtra<'a> {
    pub scopes: Option<&'a [&'a [u8]]>,
    pub now: Option<u64>,
}

pub fn verify_batch<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
    msgs: &[&[u8]],
    extra: VerifyBatchExtra<'_>,
    rng: &mut R,
) -> Result<bool, GroupSigError> {
    for sig in sigs {
        require_same_scheme(grpkey.scheme(), sig.scheme())?;
    }
    match grpkey.scheme() {
        SchemeId::Bbs04 => bbs04::verify_batch(grpkey, sigs, msgs, rng),
        SchemeId::Klap20 => klap20::verify_batch(grpkey, sigs, msgs, rng),
        SchemeId::Ps16 => ps16::verify_batch(grpkey, sigs, msgs, rng),
        SchemeId::Gl19 => {
            let now = extra
                .now
                .ok_or(GroupSigError::InvalidArgument("GL19 verify_batch needs the current time"))?;
            gl19::verify_batch(grpkey, sigs, msgs, now, rng)
        }
        SchemeId::Dl21 => {
            let scopes = extra
                .scopes
                .ok_or(GroupSigError::InvalidArgument("DL21 verify_batch needs scopes"))?;
            dl21::verify_batch(grpkey, sigs, msgs, scopes, rng)
        }
        SchemeId::Dl21Seq => {
            let scopes = extra
                .scopes
                .ok_or(GroupSigError::InvalidArgument("DL21-SEQ verify_batch needs scopes"))?;
            dl21seq::verify_batch(grpkey, sigs, msgs, scopes, rng)
        }
    }
}

/// Opener-side recovery of the GML index behind a signature, KLAP20 only
/// (the only scheme declaring a verifiable-opening role).
pub fn open<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    sig: &Signature<E>,
    gml: &Gml<E>,
    rng: &mut R,
) -> Result<(u64, Proof<E>), GroupSigError> {
    require_same_scheme(grpkey.scheme(), mgrkey.scheme())?;
    require_same_scheme(grpkey.scheme(), sig.scheme())?;
    match grpkey.scheme() {
        SchemeId::Klap20 => {
            let outcome = klap20::open(grpkey, mgrkey, sig, gml, rng);
            match &outcome {
                Ok((index, _)) => log::debug!("facade: open recovered GML index {}", index),
                Err(e) => log::warn!("facade: open failed: {}", e),
            }
            outcome
        }
        _ => Err(GroupSigError::InvalidArgument("scheme has no verifiable opening")),
    }
}

/// Re-verifies an opener's claimed identifier against its opening proof.
pub fn open_verify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    tau: E::G1Affine,
    proof: &Proof<E>,
) -> Result<bool, GroupSigError> {
    require_same_scheme(grpkey.scheme(), sig.scheme())?;
    match grpkey.scheme() {
        SchemeId::Klap20 => klap20::open_verify(grpkey, sig, tau, proof),
        _ => Err(GroupSigError::InvalidArgument("scheme has no verifiable opening")),
    }
}

/// Encrypts a signature's pseudonym pair under a blinder's public key,
/// GL19 only.
pub fn blind<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    sig: &Signature<E>,
    bldkey: &BlindingKeyPair<E>,
    rng: &mut R,
) -> Result<Gl19Blinded<E>, GroupSigError> {
    require_same_scheme(grpkey.scheme(), sig.scheme())?;
    match grpkey.scheme() {
        SchemeId::Gl19 => gl19::blind(grpkey, sig, bldkey, rng),
        _ => Err(GroupSigError::InvalidArgument("scheme has no blind/convert/unblind")),
    }
}

/// Converter's batched rerandomisation of blinded signatures into
/// domain-specific pseudonyms, preserving input order. GL19 only.
pub fn convert<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    bsigs: &[Gl19Blinded<E>],
    domain: &[u8],
) -> Result<Vec<Gl19Converted<E>>, GroupSigError> {
    require_same_scheme(grpkey.scheme(), mgrkey.scheme())?;
    match grpkey.scheme() {
        SchemeId::Gl19 => gl19::convert(grpkey, mgrkey, bsigs, domain),
        _ => Err(GroupSigError::InvalidArgument("scheme has no blind/convert/unblind")),
    }
}

/// Peels the blinder's own layer off a converted signature, recovering the
/// plaintext pseudonym. GL19 only.
pub fn unblind<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    csig: &Gl19Converted<E>,
    bldkey: &BlindingKeyPair<E>,
) -> Result<E::G1Affine, GroupSigError> {
    match grpkey.scheme() {
        SchemeId::Gl19 => Ok(gl19::unblind(csig, bldkey)),
        _ => Err(GroupSigError::InvalidArgument("scheme has no blind/convert/unblind")),
    }
}

/// Self-recognition: does `sig` carry the pseudonym `memkey` would produce
/// for `scope`? DL21/DL21-SEQ only.
pub fn identify<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    sig: &Signature<E>,
    scope: &[u8],
) -> Result<bool, GroupSigError> {
    require_same_scheme(grpkey.scheme(), memkey.scheme())?;
    require_same_scheme(grpkey.scheme(), sig.scheme())?;
    match grpkey.scheme() {
        SchemeId::Dl21 => dl21::identify(memkey, sig, scope),
        SchemeId::Dl21Seq => dl21seq::identify(memkey, sig, scope),
        _ => Err(GroupSigError::InvalidArgument("scheme has no identify/link")),
    }
}

/// Proves a batch of the caller's own signatures, across scopes, share one
/// hidden identifier. DL21/DL21-SEQ only.
pub fn link<E: PairingEngine, R: RngCore>(
    grpkey: &GroupPublicKey<E>,
    memkey: &MemberKey<E>,
    msg: &[u8],
    sigs_and_scopes: &[(&Signature<E>, &[u8])],
    rng: &mut R,
) -> Result<Proof<E>, GroupSigError> {
    require_same_scheme(grpkey.scheme(), memkey.scheme())?;
    for (sig, _) in sigs_and_scopes {
        require_same_scheme(grpkey.scheme(), sig.scheme())?;
    }
    match grpkey.scheme() {
        SchemeId::Dl21 => dl21::link(grpkey, memkey, msg, sigs_and_scopes, rng),
        SchemeId::Dl21Seq => dl21seq::link(grpkey, memkey, msg, sigs_and_scopes, rng),
        _ => Err(GroupSigError::InvalidArgument("scheme has no identify/link")),
    }
}

/// Verifies a `link` proof. DL21/DL21-SEQ only.
pub fn verify_link<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    msg: &[u8],
    sigs_and_scopes: &[(&Signature<E>, &[u8])],
    proof: &Proof<E>,
) -> Result<bool, GroupSigError> {
    for (sig, _) in sigs_and_scopes {
        require_same_scheme(grpkey.scheme(), sig.scheme())?;
    }
    match grpkey.scheme() {
        SchemeId::Dl21 => dl21::verify_link(grpkey, msg, sigs_and_scopes, proof),
        SchemeId::Dl21Seq => dl21seq::verify_link(grpkey, msg, sigs_and_scopes, proof),
        _ => Err(GroupSigError::InvalidArgument("scheme has no identify/link")),
    }
}

/// Checks a claimed-chronological run of DL21-SEQ signatures forms a valid
/// chain, reporting the first broken link. DL21-SEQ only.
pub fn verify_seqlink<E: PairingEngine>(
    grpkey: &GroupPublicKey<E>,
    sigs: &[Signature<E>],
) -> Result<Result<(), u64>, GroupSigError> {
    for sig in sigs {
        require_same_scheme(grpkey.scheme(), sig.scheme())?;
    }
    match grpkey.scheme() {
        SchemeId::Dl21Seq => dl21seq::verify_seqlink(sigs),
        _ => Err(GroupSigError::InvalidArgument("scheme has no sequential link")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn join_member<E: PairingEngine, R: RngCore>(
        scheme: SchemeId,
        grpkey: &GroupPublicKey<E>,
        mgrkey: &ManagerKey<E>,
        mut gml: Option<&mut Gml<E>>,
        expiration: Option<u64>,
        rng: &mut R,
    ) -> MemberKey<E> {
        let mut mgr_state = mgr_join_new(scheme);
        let mut mem_state = mem_join_new(scheme);
        let msg0 = mgr_join_start(&mut mgr_state, rng);
        let msg1 = mem_join_step(&mut mem_state, msg0, grpkey, rng).unwrap();
        let msg2 = mgr_join_step(
            &mut mgr_state,
            msg1,
            grpkey,
            mgrkey,
            gml.as_deref_mut(),
            rng,
        )
        .unwrap();
        mem_join_finalize(mem_state, msg2, grpkey, FinalizeExtra { expiration }, rng).unwrap()
    }

    /// End-to-end KLAP20 scenario: two members join, one signs, the opener
    /// recovers the right GML index and its proof checks out.
    #[test]
    fn klap20_open_scenario_dispatches_through_the_facade() {
        let mut rng = StdRng::seed_from_u64(900u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(SchemeId::Klap20, &mut rng);
        let mut gml = Gml::new(SchemeId::Klap20);

        let _member_a = join_member(SchemeId::Klap20, &grpkey, &mgrkey, Some(&mut gml), None, &mut rng);
        let member_b = join_member(SchemeId::Klap20, &grpkey, &mgrkey, Some(&mut gml), None, &mut rng);

        let sig = sign(&grpkey, &member_b, b"hello", SignExtra::default(), &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello", VerifyExtra::default()).unwrap());

        let (index, proof) = open(&grpkey, &mgrkey, &sig, &gml, &mut rng).unwrap();
        assert_eq!(index, 1);
        let tau = gml.entries()[index as usize].tau;
        assert!(open_verify(&grpkey, &sig, tau, &proof).unwrap());
    }

    /// A KLAP20 signature fed into a BBS04 group key is rejected as a
    /// scheme mismatch rather than silently mis-dispatched.
    #[test]
    fn cross_scheme_signature_is_rejected() {
        let mut rng = StdRng::seed_from_u64(901u64);
        let (bbs_grpkey, _) = setup::<Bls12_381, _>(SchemeId::Bbs04, &mut rng);
        let (klap_grpkey, klap_mgrkey) = setup::<Bls12_381, _>(SchemeId::Klap20, &mut rng);
        let member = join_member(SchemeId::Klap20, &klap_grpkey, &klap_mgrkey, None, None, &mut rng);
        let sig = sign(&klap_grpkey, &member, b"hello", SignExtra::default(), &mut rng).unwrap();

        assert!(verify(&bbs_grpkey, &sig, b"hello", VerifyExtra::default()).is_err());
    }

    #[test]
    fn gl19_blind_convert_unblind_round_trips_through_the_facade() {
        let mut rng = StdRng::seed_from_u64(902u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(SchemeId::Gl19, &mut rng);
        let member = join_member(SchemeId::Gl19, &grpkey, &mgrkey, None, Some(10_000), &mut rng);
        let bldkey = BlindingKeyPair::generate(&mut rng, grpkey.core().unwrap().g1);

        let sig = sign(&grpkey, &member, b"m", SignExtra::default(), &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"m", VerifyExtra { scope: None, now: Some(1) }).unwrap());

        let bsig = blind(&grpkey, &sig, &bldkey, &mut rng).unwrap();
        let csig = convert(&grpkey, &mgrkey, &[bsig], b"domain").unwrap().remove(0);
        let nym = unblind(&grpkey, &csig, &bldkey).unwrap();

        let sig2 = sign(&grpkey, &member, b"m2", SignExtra::default(), &mut rng).unwrap();
        let bsig2 = blind(&grpkey, &sig2, &bldkey, &mut rng).unwrap();
        let csig2 = convert(&grpkey, &mgrkey, &[bsig2], b"domain").unwrap().remove(0);
        assert_eq!(nym, unblind(&grpkey, &csig2, &bldkey).unwrap());
    }

    #[test]
    fn dl21_link_round_trips_through_the_facade() {
        let mut rng = StdRng::seed_from_u64(903u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(SchemeId::Dl21, &mut rng);
        let member = join_member(SchemeId::Dl21, &grpkey, &mgrkey, None, None, &mut rng);

        let extra = SignExtra { scope: Some(b"scope"), counter: None };
        let sig1 = sign(&grpkey, &member, b"m1", extra, &mut rng).unwrap();
        let sig2 = sign(&grpkey, &member, b"m1", extra, &mut rng).unwrap();

        assert!(identify(&grpkey, &member, &sig1, b"scope").unwrap());

        let batch = ark_std::vec![(&sig1, b"scope".as_slice()), (&sig2, b"scope".as_slice())];
        let proof = link(&grpkey, &member, b"m1", &batch, &mut rng).unwrap();
        assert!(verify_link(&grpkey, b"m1", &batch, &proof).unwrap());
    }

    #[test]
    fn dl21seq_seqlink_detects_reordering_through_the_facade() {
        let mut rng = StdRng::seed_from_u64(904u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(SchemeId::Dl21Seq, &mut rng);
        let member = join_member(SchemeId::Dl21Seq, &grpkey, &mgrkey, None, None, &mut rng);

        let sig0 = sign(
            &grpkey,
            &member,
            b"m0",
            SignExtra { scope: Some(b"scope"), counter: Some(0) },
            &mut rng,
        )
        .unwrap();
        let sig1 = sign(
            &grpkey,
            &member,
            b"m1",
            SignExtra { scope: Some(b"scope"), counter: Some(1) },
            &mut rng,
        )
        .unwrap();

        assert_eq!(
            verify_seqlink(&grpkey, &[sig0.clone(), sig1.clone()]).unwrap(),
            Ok(())
        );
        assert_eq!(verify_seqlink(&grpkey, &[sig1, sig0]).unwrap(), Err(1));
    }

    #[test]
    fn ps16_sign_verify_dispatches_through_the_facade() {
        let mut rng = StdRng::seed_from_u64(905u64);
        let (grpkey, mgrkey) = setup::<Bls12_381, _>(SchemeId::Ps16, &mut rng);
        let mut gml = Gml::new(SchemeId::Ps16);
        let member = join_member(SchemeId::Ps16, &grpkey, &mgrkey, Some(&mut gml), None, &mut rng);

        let sig = sign(&grpkey, &member, b"hello", SignExtra::default(), &mut rng).unwrap();
        assert!(verify(&grpkey, &sig, b"hello", VerifyExtra::default()).unwrap());
        assert!(!verify(&grpkey, &sig, b"tampered", VerifyExtra::default()).unwrap());
    }

    #[test]
    fn descriptor_dispatch_matches_registry() {
        assert!(descriptor(SchemeId::Klap20).has_verifiable_openings);
        assert!(!descriptor(SchemeId::Dl21).has_gml);
    }
}
