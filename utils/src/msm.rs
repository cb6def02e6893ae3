//! Thin wrapper over `ark_ec`'s variable-base multi-scalar multiplication so
//! callers don't have to repeat the `into_repr()` dance at every call site.

use ark_ec::msm::VariableBaseMSM;
use ark_ec::AffineCurve;
use ark_ff::PrimeField;

/// Compute `sum_i bases[i] * scalars[i]`. Extra `bases` or `scalars` beyond
/// the shorter of the two are ignored, matching `VariableBaseMSM`'s own
/// behaviour.
pub fn variable_base_msm<G: AffineCurve>(bases: &[G], scalars: &[G::ScalarField]) -> G::Projective {
    let repr: Vec<_> = scalars.iter().map(|s| s.into_repr()).collect();
    VariableBaseMSM::multi_scalar_mul(bases, &repr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Affine, G1Projective};
    use ark_ec::ProjectiveCurve;
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    #[test]
    fn agrees_with_naive_sum() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let bases: Vec<G1Affine> = (0..6)
            .map(|_| G1Projective::rand(&mut rng).into_affine())
            .collect();
        let scalars: Vec<Fr> = (0..6).map(|_| Fr::rand(&mut rng)).collect();
        let got = variable_base_msm(&bases, &scalars);
        let mut want = G1Projective::default();
        for (b, s) in bases.iter().zip(scalars.iter()) {
            want += &b.mul(s.into_repr());
        }
        assert_eq!(got, want);
    }
}
