//! Hashing a seed or arbitrary bytes into a field element or a group element
//! using try-and-increment. Vulnerable to timing side-channels; fine for
//! public, non-secret-dependent inputs (labels, domain separators, scopes).

use ark_ec::AffineCurve;
use ark_ff::Field;
use digest::Digest;

/// Hash `bytes` into a field element by repeatedly re-hashing with an
/// incrementing counter until `F::from_random_bytes` succeeds.
pub fn field_elem_from_try_and_incr<F: Field, D: Digest>(bytes: &[u8]) -> F {
    let mut input = bytes.to_vec();
    input.push(0);
    let ctr_idx = input.len() - 1;
    loop {
        let hashed = D::digest(&input);
        if let Some(elem) = F::from_random_bytes(&hashed) {
            return elem;
        }
        input[ctr_idx] = input[ctr_idx].wrapping_add(1);
    }
}

/// Derive a field element deterministically from a secret `seed`, domain
/// separated by `salt` (e.g. `b"BBS-SIG-KEYGEN-SALT-"`).
pub fn field_elem_from_seed<F: Field, D: Digest>(seed: &[u8], salt: &[u8]) -> F {
    let mut input = salt.to_vec();
    input.extend_from_slice(seed);
    field_elem_from_try_and_incr::<F, D>(&input)
}

/// Hash `bytes` into a group element of the prime-order subgroup by
/// try-and-increment followed by cofactor clearing.
pub fn projective_group_elem_from_try_and_incr<G: AffineCurve, D: Digest>(
    bytes: &[u8],
) -> G::Projective {
    let mut input = bytes.to_vec();
    input.push(0);
    let ctr_idx = input.len() - 1;
    loop {
        let hashed = D::digest(&input);
        if let Some(pt) = G::from_random_bytes(&hashed) {
            return pt.mul_by_cofactor_to_projective();
        }
        input[ctr_idx] = input[ctr_idx].wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Affine};
    use blake2::Blake2b;

    #[test]
    fn deterministic_field_elem() {
        let a = field_elem_from_seed::<Fr, Blake2b>(b"seed", b"salt-");
        let b = field_elem_from_seed::<Fr, Blake2b>(b"seed", b"salt-");
        assert_eq!(a, b);
        let c = field_elem_from_seed::<Fr, Blake2b>(b"other-seed", b"salt-");
        assert_ne!(a, c);
    }

    #[test]
    fn deterministic_group_elem() {
        let a = projective_group_elem_from_try_and_incr::<G1Affine, Blake2b>(b"label : g1");
        let b = projective_group_elem_from_try_and_incr::<G1Affine, Blake2b>(b"label : g1");
        assert_eq!(a, b);
    }
}
