//! Shared plumbing every scheme core in this module uses: assembling the
//! Fiat-Shamir transcript bytes a Sign/Open/Link proof binds to (spec 4.1:
//! "All hashes MUST include the canonical byte-serialisation of every
//! element in a fixed, documented order"). Grounded on `join.rs`'s
//! `join_challenge`, generalised from one nonce and one commitment to an
//! arbitrary ordered list of public elements.

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use ark_std::vec::Vec;
use schnorr_pok::representation::{Equation, EquationG1};

use crate::credential::CoreGroupKey;

/// Starts a transcript with the raw message bytes, to be followed by every
/// public group/field element the caller's equations reference, each pushed
/// through [`push`].
pub fn transcript(msg: &[u8]) -> Vec<u8> {
    msg.to_vec()
}

/// Appends one canonical element's unchecked serialisation to `buf`. Uses
/// `serialize_unchecked` rather than the compressed/checked form, matching
/// `schnorr_pok`'s own `challenge_contribution` convention — the transcript
/// is hashed, never parsed back, so there is nothing to validate.
pub fn push<T: CanonicalSerialize>(buf: &mut Vec<u8>, value: &T) {
    value
        .serialize_unchecked(buf)
        .expect("serializing to a Vec<u8> cannot fail");
}

/// The two equations every BBS+-style scheme core proves about a freshly
/// randomised credential `(a_hat, a_tilde)` plus a fresh commitment `d`:
///
/// - `a_tilde = a_hat^(-x) · h^y' · g1^a_blind`, witnesses `(x, y', a_blind)`
///   at indices 0..=2 — this is exactly `credential::randomize_credential`'s
///   own construction (`a_tilde = base^a_blind · a_hat^(-x)` with
///   `base = g1·h^y`, `y' = y·a_blind`) rearranged to expose every exponent
///   as a witness.
/// - `d = h1^a_blind · h^b`, sharing witness index 2 (`a_blind`) with the
///   first equation and introducing `b` at index 3 — a fresh Pedersen
///   commitment a scheme core can fold further auxiliaries into without
///   perturbing the credential relation above.
///
/// Shared witness vector layout every caller builds on: `[x, y', a_blind, b,
/// ..scheme-specific from index 4]`. See [`credential_commitment`] for `d`'s
/// construction on the signer's side.
pub fn credential_equations<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    a_hat: E::G1Affine,
    a_tilde: E::G1Affine,
    d: E::G1Affine,
) -> Vec<Equation<E>> {
    let neg_a_hat = (-a_hat.into_projective()).into_affine();
    ark_std::vec![
        Equation::G1(EquationG1 {
            bases: ark_std::vec![neg_a_hat, core.h, core.g1],
            witness_indices: ark_std::vec![0, 1, 2],
            value: a_tilde,
        }),
        Equation::G1(EquationG1 {
            bases: ark_std::vec![core.h1, core.h],
            witness_indices: ark_std::vec![2, 3],
            value: d,
        }),
    ]
}

/// Signer-side construction of `d = h1^a_blind · h^b`, matching
/// [`credential_equations`]'s second relation exactly.
pub fn credential_commitment<E: PairingEngine>(
    core: &CoreGroupKey<E>,
    a_blind: E::Fr,
    b: E::Fr,
) -> E::G1Affine {
    (core.h1.mul(a_blind.into_repr()) + core.h.mul(b.into_repr())).into_affine()
}
