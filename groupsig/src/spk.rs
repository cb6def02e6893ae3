//! The wire-visible SPK object (spec 6: `len(c)‖c ‖ n(uint64) ‖
//! len(s₁)‖s₁ ‖ … ‖ len(sₙ)‖sₙ`). `schnorr_pok::representation::RepProof`
//! carries the per-equation commitments `t_j` for convenient in-process
//! verification (the crate's general-purpose L1 API, good for composing
//! several sub-protocols' transcripts the way `bbs_plus`'s own
//! `challenge_contribution` machinery does); this module is the thin
//! adapter that produces and consumes the *exported* form, which per spec
//! only ever carries the challenge `c` plus the responses — the `t_j` are
//! always recomputed from `(c, {s_i})` and the equations, never shipped.

use ark_ec::PairingEngine;
use ark_std::vec::Vec;
use schnorr_pok::compute_random_oracle_challenge;
use schnorr_pok::representation::{Commitment, Equation, RepProtocol};

use crate::codec::{write_elem, write_u64, Reader};
use crate::error::GroupSigError;
use crate::DefaultDigest;

/// A signature/opening/link proof-of-knowledge, ready to serialise per
/// spec 6 or to verify against a freshly-supplied set of equations.
#[derive(Clone, Debug, PartialEq)]
pub struct Spk<E: PairingEngine> {
    pub challenge: E::Fr,
    pub responses: Vec<E::Fr>,
}

impl<E: PairingEngine> Spk<E> {
    /// Fiat-Shamir's `protocol` into a non-interactive proof bound to
    /// `transcript` (the caller-assembled bytes of the message and every
    /// public element the equations reference, per spec 4.1's "All hashes
    /// MUST include the canonical byte-serialisation of every element in
    /// a fixed, documented order").
    pub fn prove(protocol: RepProtocol<E>, transcript: &[u8]) -> Result<Self, GroupSigError> {
        let mut bytes = transcript.to_vec();
        protocol.challenge_contribution(&mut bytes)?;
        let challenge = compute_random_oracle_challenge::<E::Fr, DefaultDigest>(&bytes);
        let proof = protocol.gen_proof(&challenge);
        Ok(Self {
            challenge,
            responses: proof.responses,
        })
    }

    /// Recomputes every `t_j'` from `(challenge, responses)` and
    /// `equations`, re-derives the challenge from `transcript ‖ {t_j'}`,
    /// and checks it equals `self.challenge` (spec 4.1's SPK-REP Verify).
    pub fn verify(
        &self,
        equations: &[Equation<E>],
        transcript: &[u8],
    ) -> Result<(), GroupSigError> {
        let mut bytes = transcript.to_vec();
        for eqn in equations {
            let t_prime = Commitment::recompute(eqn, &self.responses, &self.challenge)?;
            t_prime.challenge_contribution(&mut bytes)?;
        }
        let recomputed = compute_random_oracle_challenge::<E::Fr, DefaultDigest>(&bytes);
        if recomputed == self.challenge {
            Ok(())
        } else {
            Err(GroupSigError::CryptoFail("SPK challenge mismatch"))
        }
    }

    pub fn response(&self, witness_index: usize) -> Result<&E::Fr, GroupSigError> {
        self.responses
            .get(witness_index)
            .ok_or(GroupSigError::InvalidArgument("SPK response index out of bounds"))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_elem(&mut out, &self.challenge);
        write_u64(&mut out, self.responses.len() as u64);
        for s in &self.responses {
            write_elem(&mut out, s);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut reader = Reader::new(bytes);
        let challenge = reader.read_elem()?;
        let n = reader.read_u64()? as usize;
        let mut responses = Vec::with_capacity(n);
        for _ in 0..n {
            responses.push(reader.read_elem()?);
        }
        Ok(Self {
            challenge,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_ec::{AffineCurve, ProjectiveCurve};
    use ark_ff::PrimeField;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;
    use schnorr_pok::representation::EquationG1;

    type Fr = <Bls12_381 as PairingEngine>::Fr;
    type G1Projective = <Bls12_381 as PairingEngine>::G1Projective;

    #[test]
    fn prove_then_verify_without_commitments_on_the_wire() {
        let mut rng = StdRng::seed_from_u64(42u64);
        let base = G1Projective::rand(&mut rng).into_affine();
        let x = Fr::rand(&mut rng);
        let y = base.mul(x.into_repr()).into_affine();
        let equations = ark_std::vec![Equation::G1(EquationG1::<Bls12_381> {
            bases: ark_std::vec![base],
            witness_indices: ark_std::vec![0],
            value: y,
        })];
        let protocol =
            RepProtocol::<Bls12_381>::init(ark_std::vec![x], ark_std::vec![Fr::rand(&mut rng)], equations.clone())
                .unwrap();
        let spk = Spk::prove(protocol, b"message").unwrap();
        spk.verify(&equations, b"message").unwrap();

        let bytes = spk.to_bytes();
        let decoded = Spk::<Bls12_381>::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, spk);
        decoded.verify(&equations, b"message").unwrap();
    }

    #[test]
    fn wrong_transcript_is_rejected() {
        let mut rng = StdRng::seed_from_u64(43u64);
        let base = G1Projective::rand(&mut rng).into_affine();
        let x = Fr::rand(&mut rng);
        let y = base.mul(x.into_repr()).into_affine();
        let equations = ark_std::vec![Equation::G1(EquationG1::<Bls12_381> {
            bases: ark_std::vec![base],
            witness_indices: ark_std::vec![0],
            value: y,
        })];
        let protocol =
            RepProtocol::<Bls12_381>::init(ark_std::vec![x], ark_std::vec![Fr::rand(&mut rng)], equations.clone())
                .unwrap();
        let spk = Spk::prove(protocol, b"message").unwrap();
        assert!(spk.verify(&equations, b"different message").is_err());
    }
}
