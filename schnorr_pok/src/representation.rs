//! SPK-REP: a Fiat-Shamir proof of knowledge of scalars `x_1..x_n` satisfying
//! a conjunction of linear equations `y_j = prod_i g_ji^{x_i}`, where some
//! `x_i` may be shared across equations and equations may live in either
//! `G1` or `G2` of the same pairing engine. This is the primitive every
//! scheme's sign/open/link proof is built from (spec 4.4-4.7): the
//! credential-randomisation relations, the opener's escrow equations, the
//! blinded-pseudonym equations and the per-scope nym equation are each one
//! `Equation`, proved together as a single conjunction bound to the message.

use crate::error::SchnorrError;
use ark_ec::msm::VariableBaseMSM;
use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use ark_std::io::Write;
use ark_std::{vec, vec::Vec};

/// One equation of the conjunction, `value = prod bases[k]^{witness[index[k]]}`,
/// living in `G1`.
#[derive(Clone, Debug)]
pub struct EquationG1<E: PairingEngine> {
    pub bases: Vec<E::G1Affine>,
    pub witness_indices: Vec<usize>,
    pub value: E::G1Affine,
}

/// Same shape as [`EquationG1`] but living in `G2`.
#[derive(Clone, Debug)]
pub struct EquationG2<E: PairingEngine> {
    pub bases: Vec<E::G2Affine>,
    pub witness_indices: Vec<usize>,
    pub value: E::G2Affine,
}

/// A single equation of the conjunction, in either group.
#[derive(Clone, Debug)]
pub enum Equation<E: PairingEngine> {
    G1(EquationG1<E>),
    G2(EquationG2<E>),
}

impl<E: PairingEngine> Equation<E> {
    fn check_shape(&self) -> Result<(), SchnorrError> {
        let (bases_len, idx_len) = match self {
            Equation::G1(e) => (e.bases.len(), e.witness_indices.len()),
            Equation::G2(e) => (e.bases.len(), e.witness_indices.len()),
        };
        if bases_len != idx_len {
            return Err(SchnorrError::ExpectedSameSizeSequences(bases_len, idx_len));
        }
        Ok(())
    }
}

/// The per-equation commitment `t_j`, in whichever group the equation lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Commitment<E: PairingEngine> {
    G1(E::G1Affine),
    G2(E::G2Affine),
}

impl<E: PairingEngine> Commitment<E> {
    /// This commitment's contribution to the overall Fiat-Shamir challenge.
    /// As with [`crate::SchnorrChallengeContributor`], bases and values are
    /// not included here and must be fed to the hash separately.
    pub fn challenge_contribution<W: Write>(&self, mut writer: W) -> Result<(), SchnorrError> {
        match self {
            Commitment::G1(t) => t.serialize_unchecked(&mut writer)?,
            Commitment::G2(t) => t.serialize_unchecked(&mut writer)?,
        }
        Ok(())
    }

    /// Recompute `t_j' = (prod bases[k]^{response[index[k]]}) * value^{-c}`
    /// for one equation given only its responses and the challenge — what
    /// a verifier who was only handed `(c, {s_i})` on the wire (spec 6's
    /// SPK layout has no room for the `t_j`) must do before it can check
    /// `c` against the Fiat-Shamir hash.
    pub fn recompute(
        eqn: &Equation<E>,
        responses: &[E::Fr],
        challenge: &E::Fr,
    ) -> Result<Self, SchnorrError> {
        eqn.check_shape()?;
        match eqn {
            Equation::G1(e) => {
                let scalars = gather(responses, &e.witness_indices)?;
                let mut bases = e.bases.clone();
                bases.push(e.value);
                let mut repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                repr.push((-*challenge).into_repr());
                Ok(Commitment::G1(
                    VariableBaseMSM::multi_scalar_mul(&bases, &repr).into_affine(),
                ))
            }
            Equation::G2(e) => {
                let scalars = gather(responses, &e.witness_indices)?;
                let mut bases = e.bases.clone();
                bases.push(e.value);
                let mut repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                repr.push((-*challenge).into_repr());
                Ok(Commitment::G2(
                    VariableBaseMSM::multi_scalar_mul(&bases, &repr).into_affine(),
                ))
            }
        }
    }
}

fn gather<F: Copy>(values: &[F], indices: &[usize]) -> Result<Vec<F>, SchnorrError> {
    let mut out = Vec::with_capacity(indices.len());
    for &i in indices {
        out.push(*values.get(i).ok_or(SchnorrError::UnknownWitnessRef(i))?);
    }
    Ok(out)
}

/// Step-1/2 prover state: the witnesses, their blindings and the equations
/// they must satisfy.
pub struct RepProtocol<E: PairingEngine> {
    witnesses: Vec<E::Fr>,
    blindings: Vec<E::Fr>,
    equations: Vec<Equation<E>>,
    commitments: Vec<Commitment<E>>,
}

/// The non-interactive proof: one response per witness plus the commitments,
/// to be checked against a challenge the verifier recomputes independently.
#[derive(Clone, Debug, PartialEq)]
pub struct RepProof<E: PairingEngine> {
    pub commitments: Vec<Commitment<E>>,
    pub responses: Vec<E::Fr>,
}

impl<E: PairingEngine> RepProtocol<E> {
    /// `witnesses[i]` is the value of shared witness `i`; `blindings[i]` its
    /// step-1 randomness (sampled by the caller so tests can be
    /// deterministic). `equations` is the conjunction to prove, each
    /// equation's `witness_indices` indexing into `witnesses`/`blindings`.
    pub fn init(
        witnesses: Vec<E::Fr>,
        blindings: Vec<E::Fr>,
        equations: Vec<Equation<E>>,
    ) -> Result<Self, SchnorrError> {
        if witnesses.len() != blindings.len() {
            return Err(SchnorrError::ExpectedSameSizeSequences(
                witnesses.len(),
                blindings.len(),
            ));
        }
        let mut commitments = Vec::with_capacity(equations.len());
        for eqn in &equations {
            eqn.check_shape()?;
            commitments.push(Self::commit_one(&blindings, eqn)?);
        }
        Ok(Self {
            witnesses,
            blindings,
            equations,
            commitments,
        })
    }

    fn commit_one(
        blindings: &[E::Fr],
        eqn: &Equation<E>,
    ) -> Result<Commitment<E>, SchnorrError> {
        match eqn {
            Equation::G1(e) => {
                let scalars = Self::gather(blindings, &e.witness_indices)?;
                let repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                Ok(Commitment::G1(
                    VariableBaseMSM::multi_scalar_mul(&e.bases, &repr).into_affine(),
                ))
            }
            Equation::G2(e) => {
                let scalars = Self::gather(blindings, &e.witness_indices)?;
                let repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                Ok(Commitment::G2(
                    VariableBaseMSM::multi_scalar_mul(&e.bases, &repr).into_affine(),
                ))
            }
        }
    }

    fn gather(values: &[E::Fr], indices: &[usize]) -> Result<Vec<E::Fr>, SchnorrError> {
        let mut out = Vec::with_capacity(indices.len());
        for &i in indices {
            out.push(*values.get(i).ok_or(SchnorrError::UnknownWitnessRef(i))?);
        }
        Ok(out)
    }

    /// Commitments `t_j`, in equation order; this plus the bases/values of
    /// each equation is what the challenge hash must cover.
    pub fn commitments(&self) -> &[Commitment<E>] {
        &self.commitments
    }

    /// Writes every commitment's contribution to the challenge transcript,
    /// in equation order. The caller still owes the hash the bases/values
    /// of each equation and the bound message (see spec 4.1/6): only the
    /// `c` this challenge reduces to, not these `t_j`, ends up on the wire.
    pub fn challenge_contribution<W: Write>(&self, mut writer: W) -> Result<(), SchnorrError> {
        for c in &self.commitments {
            c.challenge_contribution(&mut writer)?;
        }
        Ok(())
    }

    /// Step-3: given the Fiat-Shamir challenge, produce the final proof.
    pub fn gen_proof(self, challenge: &E::Fr) -> RepProof<E> {
        let responses = self
            .witnesses
            .iter()
            .zip(self.blindings.iter())
            .map(|(w, b)| *b + (*w * *challenge))
            .collect();
        RepProof {
            commitments: self.commitments,
            responses,
        }
    }
}

impl<E: PairingEngine> RepProof<E> {
    /// Recompute each `t_j' = (prod bases[k]^{response[index[k]]}) - value*challenge`
    /// and check it matches the commitment carried in the proof. The caller
    /// is responsible for recomputing the Fiat-Shamir challenge from
    /// `equations`/`self.commitments`/the bound message and checking it
    /// equals `challenge`.
    pub fn verify(&self, equations: &[Equation<E>], challenge: &E::Fr) -> Result<(), SchnorrError> {
        if equations.len() != self.commitments.len() {
            return Err(SchnorrError::ExpectedSameSizeSequences(
                equations.len(),
                self.commitments.len(),
            ));
        }
        for (eqn, t) in equations.iter().zip(self.commitments.iter()) {
            eqn.check_shape()?;
            match (eqn, t) {
                (Equation::G1(e), Commitment::G1(t)) => {
                    let scalars = Self::gather_responses(&self.responses, &e.witness_indices)?;
                    let mut bases = e.bases.clone();
                    bases.push(e.value);
                    let mut repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                    repr.push((-*challenge).into_repr());
                    let got = VariableBaseMSM::multi_scalar_mul(&bases, &repr).into_affine();
                    if got != *t {
                        return Err(SchnorrError::InvalidResponse);
                    }
                }
                (Equation::G2(e), Commitment::G2(t)) => {
                    let scalars = Self::gather_responses(&self.responses, &e.witness_indices)?;
                    let mut bases = e.bases.clone();
                    bases.push(e.value);
                    let mut repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
                    repr.push((-*challenge).into_repr());
                    let got = VariableBaseMSM::multi_scalar_mul(&bases, &repr).into_affine();
                    if got != *t {
                        return Err(SchnorrError::InvalidResponse);
                    }
                }
                _ => return Err(SchnorrError::InvalidResponse),
            }
        }
        Ok(())
    }

    fn gather_responses(
        responses: &[E::Fr],
        indices: &[usize],
    ) -> Result<Vec<E::Fr>, SchnorrError> {
        let mut out = Vec::with_capacity(indices.len());
        for &i in indices {
            out.push(*responses.get(i).ok_or(SchnorrError::UnknownWitnessRef(i))?);
        }
        Ok(out)
    }

    pub fn response(&self, witness_index: usize) -> Result<&E::Fr, SchnorrError> {
        self.responses
            .get(witness_index)
            .ok_or(SchnorrError::IndexOutOfBounds(witness_index, self.responses.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_ec::ProjectiveCurve;
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    type Fr = <Bls12_381 as PairingEngine>::Fr;
    type G1Projective = <Bls12_381 as PairingEngine>::G1Projective;
    type G2Projective = <Bls12_381 as PairingEngine>::G2Projective;

    #[test]
    fn conjunction_with_shared_witness_across_g1_and_g2() {
        let mut rng = StdRng::seed_from_u64(9u64);
        // witness 0 shared between a G1 equation and a G2 equation; witness 1 only in G1.
        let g1_a = G1Projective::rand(&mut rng).into_affine();
        let g1_b = G1Projective::rand(&mut rng).into_affine();
        let g2_a = G2Projective::rand(&mut rng).into_affine();

        let x0 = Fr::rand(&mut rng);
        let x1 = Fr::rand(&mut rng);

        let y1 = (g1_a.mul(x0.into_repr()) + g1_b.mul(x1.into_repr())).into_affine();
        let y2 = g2_a.mul(x0.into_repr()).into_affine();

        let equations = vec![
            Equation::G1(EquationG1::<Bls12_381> {
                bases: vec![g1_a, g1_b],
                witness_indices: vec![0, 1],
                value: y1,
            }),
            Equation::G2(EquationG2::<Bls12_381> {
                bases: vec![g2_a],
                witness_indices: vec![0],
                value: y2,
            }),
        ];

        let blindings = vec![Fr::rand(&mut rng), Fr::rand(&mut rng)];
        let protocol =
            RepProtocol::<Bls12_381>::init(vec![x0, x1], blindings, equations.clone()).unwrap();

        let challenge = Fr::rand(&mut rng);
        let proof = protocol.gen_proof(&challenge);
        proof.verify(&equations, &challenge).unwrap();
    }

    #[test]
    fn tampered_response_is_rejected() {
        let mut rng = StdRng::seed_from_u64(10u64);
        let base = G1Projective::rand(&mut rng).into_affine();
        let x = Fr::rand(&mut rng);
        let y = base.mul(x.into_repr()).into_affine();
        let equations = vec![Equation::G1(EquationG1::<Bls12_381> {
            bases: vec![base],
            witness_indices: vec![0],
            value: y,
        })];
        let protocol =
            RepProtocol::<Bls12_381>::init(vec![x], vec![Fr::rand(&mut rng)], equations.clone())
                .unwrap();
        let challenge = Fr::rand(&mut rng);
        let mut proof = protocol.gen_proof(&challenge);
        proof.responses[0] += Fr::from(1u64);
        assert!(proof.verify(&equations, &challenge).is_err());
    }
}
