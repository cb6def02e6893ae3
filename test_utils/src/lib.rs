//! Shared fixtures and round-trip macros for `groupsig`'s test suites.
//! Grounded on the teacher's own `test_utils` crate (`Fr`/`ProofG1` aliases
//! plus a `test_serialization!` macro every proof-system test calls) and on
//! the join/seed-rng boilerplate repeated across `groupsig`'s own
//! `#[cfg(test)]` modules.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

use ark_bls12_381::Bls12_381;
use ark_ec::PairingEngine;
use ark_std::rand::{rngs::StdRng, RngCore, SeedableRng};

use groupsig::error::GroupSigError;
use groupsig::facade::{self, FinalizeExtra, ManagerJoinState, MemberJoinState};
use groupsig::gml::Gml;
use groupsig::keys::{GroupPublicKey, ManagerKey, MemberKey};
use groupsig::scheme::SchemeId;

/// The curve every `groupsig` test in this workspace runs against.
pub type TestEngine = Bls12_381;
pub type Fr = <Bls12_381 as PairingEngine>::Fr;
pub type G1 = <Bls12_381 as PairingEngine>::G1Affine;
pub type G2 = <Bls12_381 as PairingEngine>::G2Affine;

/// A deterministic RNG from a small seed, the same `StdRng::seed_from_u64`
/// every test module in this workspace already constructs by hand.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Round-trips a value through `ark-serialize`'s three encodings (checked
/// compressed, unchecked, uncompressed) and asserts each decodes back to an
/// equal value. Mirrors the `test_serialization!` macro `bbs_plus`,
/// `schnorr_pok` and `proof_system`'s own test suites all define locally;
/// centralised here so `groupsig`'s tests don't each redeclare it.
#[macro_export]
macro_rules! test_serialization {
    ($obj_type:ty, $obj:expr) => {
        let mut serz = ark_std::vec![];
        ark_serialize::CanonicalSerialize::serialize(&$obj, &mut serz).unwrap();
        assert_eq!(
            <$obj_type as ark_serialize::CanonicalDeserialize>::deserialize(&serz[..]).unwrap(),
            $obj
        );

        let mut serz = ark_std::vec![];
        ark_serialize::CanonicalSerialize::serialize_unchecked(&$obj, &mut serz).unwrap();
        assert_eq!(
            <$obj_type as ark_serialize::CanonicalDeserialize>::deserialize_unchecked(&serz[..])
                .unwrap(),
            $obj
        );

        let mut serz = ark_std::vec![];
        ark_serialize::CanonicalSerialize::serialize_uncompressed(&$obj, &mut serz).unwrap();
        assert_eq!(
            <$obj_type as ark_serialize::CanonicalDeserialize>::deserialize_uncompressed(
                &serz[..]
            )
            .unwrap(),
            $obj
        );
    };
}

/// Round-trips a value through its own hand-rolled `to_bytes`/`from_bytes`
/// pair (the canonical wire codec every exported `groupsig` type uses, see
/// `groupsig::codec`, which is deliberately not `ark-serialize`-compatible
/// framing). Same shape as `test_serialization!` above, for the crate's own
/// codec rather than arkworks'.
#[macro_export]
macro_rules! test_bytes_roundtrip {
    ($obj_type:ty, $obj:expr) => {
        let bytes = $obj.to_bytes();
        assert_eq!(<$obj_type>::from_bytes(&bytes).unwrap(), $obj);
    };
}

/// Runs the member+manager Join transcript to completion for `scheme` and
/// returns the resulting member key, appending the issued commitment to
/// `gml` when one is supplied. Centralises the three-message handshake every
/// scheme's own test module (and `facade`'s) otherwise repeats by hand.
pub fn join_member<E: PairingEngine, R: RngCore>(
    scheme: SchemeId,
    grpkey: &GroupPublicKey<E>,
    mgrkey: &ManagerKey<E>,
    mut gml: Option<&mut Gml<E>>,
    expiration: Option<u64>,
    rng: &mut R,
) -> Result<MemberKey<E>, GroupSigError> {
    let mut mgr_state: ManagerJoinState<E> = facade::mgr_join_new(scheme);
    let mut mem_state: MemberJoinState<E> = facade::mem_join_new(scheme);
    let msg0 = facade::mgr_join_start(&mut mgr_state, rng);
    let msg1 = facade::mem_join_step(&mut mem_state, msg0, grpkey, rng)?;
    let msg2 = facade::mgr_join_step(&mut mgr_state, msg1, grpkey, mgrkey, gml.as_deref_mut(), rng)?;
    facade::mem_join_finalize(mem_state, msg2, grpkey, FinalizeExtra { expiration }, rng)
}

/// Convenience wrapper: `setup` plus a single [`join_member`] call, the
/// shape most single-member tests need.
pub fn setup_with_one_member<E: PairingEngine, R: RngCore>(
    scheme: SchemeId,
    gml: Option<&mut Gml<E>>,
    expiration: Option<u64>,
    rng: &mut R,
) -> (GroupPublicKey<E>, ManagerKey<E>, MemberKey<E>) {
    let (grpkey, mgrkey) = facade::setup(scheme, rng);
    let memkey = join_member(scheme, &grpkey, &mgrkey, gml, expiration, rng)
        .expect("join of a freshly-set-up group cannot fail");
    (grpkey, mgrkey, memkey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use ark_std::UniformRand;

    #[test]
    fn test_serialization_macro_round_trips_a_field_element() {
        let mut rng = seeded_rng(1);
        let x = Fr::rand(&mut rng);
        test_serialization!(Fr, x);
    }

    #[test]
    fn join_member_fixture_produces_a_usable_credential() {
        let mut rng = seeded_rng(2);
        let mut gml = Gml::new(SchemeId::Bbs04);
        let (grpkey, _mgrkey, memkey) =
            setup_with_one_member::<TestEngine, _>(SchemeId::Bbs04, Some(&mut gml), None, &mut rng);
        assert_eq!(gml.len(), 1);

        let extra = groupsig::facade::SignExtra::default();
        let sig = facade::sign(&grpkey, &memkey, b"hello", extra, &mut rng).unwrap();
        assert!(facade::verify(&grpkey, &sig, b"hello", groupsig::facade::VerifyExtra::default()).unwrap());
    }

    #[test]
    fn join_member_fixture_works_without_a_gml_for_gml_less_schemes() {
        let mut rng = seeded_rng(3);
        let (grpkey, _mgrkey, memkey) =
            setup_with_one_member::<TestEngine, _>(SchemeId::Dl21, None, None, &mut rng);
        let extra = groupsig::facade::SignExtra { scope: Some(b"scope"), counter: None };
        let sig = facade::sign(&grpkey, &memkey, b"m", extra, &mut rng).unwrap();
        assert!(facade::identify(&grpkey, &memkey, &sig, b"scope").unwrap());
    }

    #[test]
    fn test_bytes_roundtrip_macro_round_trips_a_group_public_key() {
        let mut rng = seeded_rng(4);
        let (grpkey, _mgrkey) = facade::setup::<TestEngine, _>(SchemeId::Klap20, &mut rng);
        test_bytes_roundtrip!(GroupPublicKey<TestEngine>, grpkey);
    }
}
