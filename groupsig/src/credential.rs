//! The BBS+-style credential engine shared by BBS04, KLAP20, GL19, DL21 and
//! DL21-SEQ (spec 4.3: "All schemes in scope share a three-message
//! interactive issuance"; PS16 alone uses a different, PS-signature-style
//! credential and is built separately in `schemes::ps16`). Grounded on
//! `bbs_plus::setup`'s `SignatureParamsG1`/`KeypairG2` — same hash-to-group
//! parameter generation, same `g1 * h^y` commitment shape — generalised
//! from an arbitrary multi-message commitment down to the single hidden
//! identifier `y` this spec's Join protocol commits to.

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::{PrimeField, ToBytes};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;
use ark_std::{UniformRand, Zero};
use digest::Digest;
use zeroize::Zeroize;

#[cfg(feature = "use-serde")]
use gs_crypto_utils::serde_utils::*;
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "use-serde")]
use serde_with::serde_as;

use gs_crypto_utils::hashing_utils::projective_group_elem_from_try_and_incr;

/// The group elements every BBS+-style scheme's group public key starts
/// with (spec 3: "at minimum generators `g1,h,h1,h2 ∈ G1`, `g2 ∈ G2`, and
/// the issuer public key `ipk = g2^isk`"). Each scheme's own group key
/// struct embeds this and adds its own tail fields.
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct CoreGroupKey<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub g1: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub h: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub h1: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub h2: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub g2: E::G2Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub ipk: E::G2Affine,
}

impl<E: PairingEngine> CoreGroupKey<E> {
    /// Derive the generators deterministically by hashing `label`, the way
    /// `bbs_plus::setup::SignatureParamsG1::new` derives its own — useful
    /// for test vectors and for two independent implementations needing to
    /// agree on the same public generators without a setup ceremony.
    /// `ipk` still requires `isk`, sampled by the caller (`setup` proper).
    pub fn generate_using_label<D: Digest>(label: &[u8], isk: &E::Fr) -> Self {
        let g1 = projective_group_elem_from_try_and_incr::<E::G1Affine, D>(
            &labelled(label, b"g1"),
        )
        .into_affine();
        let h = projective_group_elem_from_try_and_incr::<E::G1Affine, D>(
            &labelled(label, b"h"),
        )
        .into_affine();
        let h1 = projective_group_elem_from_try_and_incr::<E::G1Affine, D>(
            &labelled(label, b"h1"),
        )
        .into_affine();
        let h2 = projective_group_elem_from_try_and_incr::<E::G1Affine, D>(
            &labelled(label, b"h2"),
        )
        .into_affine();
        let g2 = projective_group_elem_from_try_and_incr::<E::G2Affine, D>(
            &labelled(label, b"g2"),
        )
        .into_affine();
        let ipk = g2.mul(isk.into_repr()).into_affine();
        Self { g1, h, h1, h2, g2, ipk }
    }

    /// Sample every generator uniformly (the non-deterministic `setup`
    /// path). `isk` is sampled alongside by the caller since `ipk`
    /// depends on it.
    pub fn generate_using_rng<R: RngCore>(rng: &mut R, isk: &E::Fr) -> Self {
        let g1 = E::G1Projective::rand(rng).into_affine();
        let h = E::G1Projective::rand(rng).into_affine();
        let h1 = E::G1Projective::rand(rng).into_affine();
        let h2 = E::G1Projective::rand(rng).into_affine();
        let g2 = E::G2Projective::rand(rng).into_affine();
        let ipk = g2.mul(isk.into_repr()).into_affine();
        Self { g1, h, h1, h2, g2, ipk }
    }

    pub fn is_valid(&self) -> bool {
        !(self.g1.is_zero()
            || self.h.is_zero()
            || self.h1.is_zero()
            || self.h2.is_zero()
            || self.g2.is_zero()
            || self.ipk.is_zero())
    }
}

fn labelled(label: &[u8], suffix: &[u8]) -> ark_std::vec::Vec<u8> {
    let mut out = ark_std::vec::Vec::with_capacity(label.len() + suffix.len() + 3);
    out.extend_from_slice(label);
    out.extend_from_slice(b" : ");
    out.extend_from_slice(suffix);
    out
}

/// The issuer's secret share. Zeroized on drop like every scalar secret in
/// this crate (grounded on `bbs_plus::setup::SecretKey`'s `Zeroize`/`Drop`
/// pair).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Zeroize)]
pub struct IssuerSecretKey<F: PrimeField>(#[cfg_attr(feature = "use-serde", serde_as(as = "FieldBytes"))] pub F);

impl<F: PrimeField> Drop for IssuerSecretKey<F> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<F: PrimeField> IssuerSecretKey<F> {
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        Self(F::rand(rng))
    }
}

/// A BBS+-style credential `(A, x)`: `A = (g1 * h^y)^{1/(isk + x)}`, the
/// issuer's signature on the member's hidden identifier `y` (spec 3, 4.3).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Credential<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub a: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "ScalarFieldBytes"))]
    pub x: E::Fr,
}

/// Issuer-side: given the member's commitment `f = h^y` and a fresh `x`,
/// compute `A = (g1 * f)^{1/(isk + x)}`. Returns `None` on the
/// negligible-probability event `isk + x == 0` (the caller should resample
/// `x` and retry; a correct random `x` makes this effectively unreachable).
pub fn issue_credential<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    isk: &E::Fr,
    f: E::G1Affine,
    x: E::Fr,
) -> Option<Credential<E>> {
    let denom = *isk + x;
    if denom.is_zero() {
        return None;
    }
    let exponent = denom.inverse()?;
    let base = (core.g1.into_projective() + f.into_projective()).into_affine();
    let a = base.mul(exponent.into_repr()).into_affine();
    Some(Credential { a, x })
}

/// Member/verifier-side: `e(A, ipk * g2^x) == e(g1 * h^y, g2)` (spec 4.3).
pub fn verify_credential<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    y: &E::Fr,
    cred: &Credential<E>,
) -> bool {
    let f = core.h.mul(y.into_repr());
    let lhs_base = (core.g1.into_projective() + f).into_affine();
    let rhs_exp = (core.ipk.into_projective() + core.g2.mul(cred.x.into_repr())).into_affine();
    E::pairing(cred.a, rhs_exp) == E::pairing(lhs_base, core.g2)
}

/// Commitment `F = h^y` the member sends during Join seq 1.
pub fn identifier_commitment<E: PairingEngine>(core: &CoreGroupKey<E>, y: &E::Fr) -> E::G1Affine {
    core.h.mul(y.into_repr()).into_affine()
}

/// Re-randomise a credential for one signature: `Â = A^a`,
/// `Ã = Â^{-x} · (g1·h^y)^a`. Computable by the member alone (no issuer
/// secret needed — see `groupsig::schemes`'s module docs for the identity
/// this relies on): `Â,Ã` leak nothing about `A` beyond "some valid
/// credential produced these", which is exactly the BBS+ unforgeability
/// guarantee spec 4.4's Sign step 2 is built on.
pub fn randomize_credential<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    cred: &Credential<E>,
    y: &E::Fr,
    a: &E::Fr,
) -> (E::G1Affine, E::G1Affine) {
    let a_hat = cred.a.mul(a.into_repr()).into_affine();
    let base = (core.g1.into_projective() + core.h.mul(y.into_repr())).into_affine();
    let a_tilde = (base.mul(a.into_repr()) - a_hat.mul(cred.x.into_repr())).into_affine();
    (a_hat, a_tilde)
}

/// The credential-validity half of Verify: `e(Â, ipk) == e(Ã, g2)`. This
/// check alone is sufficient (and message-independent — it is not itself
/// "the signature"; binding to a specific message is the SPK's job, built
/// on top in `schemes`) because `Ã = Â^{isk}` holds for re-randomised
/// `Â = A^a` of a genuinely-issued `A` and nothing else, under the same
/// hardness assumption that makes the underlying BBS+ credential
/// unforgeable.
pub fn verify_randomized_credential<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    a_hat: &E::G1Affine,
    a_tilde: &E::G1Affine,
) -> bool {
    if a_hat.is_zero() {
        return false;
    }
    E::pairing(*a_hat, core.ipk) == E::pairing(*a_tilde, core.g2)
}

/// Batched form of [`verify_randomized_credential`]: checks every pair at
/// once via one random linear combination, collapsing `2n` pairings into 2
/// (spec 8's testable property 5: `verify_batch` must be numerically
/// equivalent to calling `verify` `n` times, not merely faster on average —
/// the linear combination is why a forged pair can't slip through: its
/// random coefficient is drawn after every pair is fixed).
pub fn verify_randomized_credentials_batch<E: PairingEngine, R: RngCore>(
    core: &CoreGroupKey<E>,
    pairs: &[(E::G1Affine, E::G1Affine)],
    rng: &mut R,
) -> bool {
    if pairs.iter().any(|(a_hat, _)| a_hat.is_zero()) {
        return false;
    }
    let mut hat_sum = E::G1Projective::zero();
    let mut tilde_sum = E::G1Projective::zero();
    for (a_hat, a_tilde) in pairs {
        let r = E::Fr::rand(rng);
        hat_sum += a_hat.mul(r.into_repr());
        tilde_sum += a_tilde.mul(r.into_repr());
    }
    E::pairing(hat_sum.into_affine(), core.ipk) == E::pairing(tilde_sum.into_affine(), core.g2)
}

/// Bytes of everything that must be hashed for a Fiat-Shamir challenge
/// bound to a message and an arbitrary set of public elements — every
/// scheme's Sign/Join/Open/Link proof funnels its transcript through this,
/// mirroring `bbs_plus`'s use of `ark_ff::to_bytes!` plus
/// `challenge_contribution` for the same purpose.
pub fn write_canonical<T: ToBytes>(buf: &mut ark_std::vec::Vec<u8>, value: &T) {
    value
        .write(buf)
        .expect("writing to a Vec<u8> cannot fail");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use blake2::Blake2b;

    type Fr = <Bls12_381 as PairingEngine>::Fr;

    #[test]
    fn credential_round_trip_verifies() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);
        assert!(core.is_valid());

        let y = Fr::rand(&mut rng);
        let f = identifier_commitment(&core, &y);
        let x = Fr::rand(&mut rng);
        let cred = issue_credential(&core, &isk, f, x).unwrap();

        assert!(verify_credential(&core, &y, &cred));
    }

    #[test]
    fn tampered_x_fails_verification() {
        let mut rng = StdRng::seed_from_u64(2u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);
        let y = Fr::rand(&mut rng);
        let f = identifier_commitment(&core, &y);
        let x = Fr::rand(&mut rng);
        let mut cred = issue_credential(&core, &isk, f, x).unwrap();
        cred.x += Fr::from(1u64);
        assert!(!verify_credential(&core, &y, &cred));
    }

    #[test]
    fn randomized_credential_passes_pairing_check() {
        let mut rng = StdRng::seed_from_u64(4u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);
        let y = Fr::rand(&mut rng);
        let f = identifier_commitment(&core, &y);
        let x = Fr::rand(&mut rng);
        let cred = issue_credential(&core, &isk, f, x).unwrap();

        let a_blind = Fr::rand(&mut rng);
        let (a_hat, a_tilde) = randomize_credential(&core, &cred, &y, &a_blind);
        assert!(verify_randomized_credential(&core, &a_hat, &a_tilde));
    }

    #[test]
    fn randomized_credential_with_wrong_y_fails() {
        let mut rng = StdRng::seed_from_u64(5u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);
        let y = Fr::rand(&mut rng);
        let f = identifier_commitment(&core, &y);
        let x = Fr::rand(&mut rng);
        let cred = issue_credential(&core, &isk, f, x).unwrap();

        let a_blind = Fr::rand(&mut rng);
        let wrong_y = y + Fr::from(1u64);
        let (a_hat, a_tilde) = randomize_credential(&core, &cred, &wrong_y, &a_blind);
        assert!(!verify_randomized_credential(&core, &a_hat, &a_tilde));
    }

    #[test]
    fn batch_verification_matches_one_at_a_time() {
        let mut rng = StdRng::seed_from_u64(6u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);

        let mut pairs = Vec::new();
        for _ in 0..4 {
            let y = Fr::rand(&mut rng);
            let f = identifier_commitment(&core, &y);
            let x = Fr::rand(&mut rng);
            let cred = issue_credential(&core, &isk, f, x).unwrap();
            let a_blind = Fr::rand(&mut rng);
            pairs.push(randomize_credential(&core, &cred, &y, &a_blind));
        }
        assert!(pairs
            .iter()
            .all(|(a_hat, a_tilde)| verify_randomized_credential(&core, a_hat, a_tilde)));
        assert!(verify_randomized_credentials_batch(&core, &pairs, &mut rng));

        pairs[1].0 = pairs[0].0;
        assert!(!verify_randomized_credentials_batch(&core, &pairs, &mut rng));
    }

    #[test]
    fn deterministic_generators_agree_on_same_label() {
        let mut rng = StdRng::seed_from_u64(3u64);
        let isk = Fr::rand(&mut rng);
        let a = CoreGroupKey::<Bls12_381>::generate_using_label::<Blake2b>(b"test-group", &isk);
        let b = CoreGroupKey::<Bls12_381>::generate_using_label::<Blake2b>(b"test-group", &isk);
        assert_eq!(a, b);
        let c = CoreGroupKey::<Bls12_381>::generate_using_label::<Blake2b>(b"other-group", &isk);
        assert_ne!(a, c);
    }
}
