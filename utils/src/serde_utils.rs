//! `serde_with` adaptors that delegate to `ark_serialize`'s canonical,
//! bit-exact encoding, so `#[serde_as(as = "AffineGroupBytes")]`-annotated
//! fields serialize identically under `serde` and under `CanonicalSerialize`.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::vec::Vec;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

/// Adaptor for any field element (`PrimeField`), serialized via
/// `ark_serialize`'s canonical compressed form.
pub struct FieldBytes;

/// Same encoding as `FieldBytes`; kept as a distinct name at call sites to
/// document intent (scalar field of the curve in use) the way the teacher's
/// codebase distinguishes `FieldBytes` from `ScalarFieldBytes`.
pub type ScalarFieldBytes = FieldBytes;

/// Adaptor for any affine group element (`AffineCurve`), serialized via
/// `ark_serialize`'s canonical compressed form.
pub struct AffineGroupBytes;

macro_rules! impl_canonical_adaptor {
    ($name:ident) => {
        impl<T> SerializeAs<T> for $name
        where
            T: CanonicalSerialize,
        {
            fn serialize_as<S>(val: &T, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut bytes = Vec::with_capacity(val.serialized_size());
                val.serialize(&mut bytes)
                    .map_err(|e| S::Error::custom(format!("{:?}", e)))?;
                serializer.serialize_bytes(&bytes)
            }
        }

        impl<'de, T> DeserializeAs<'de, T> for $name
        where
            T: CanonicalDeserialize,
        {
            fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
            where
                D: Deserializer<'de>,
            {
                let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
                T::deserialize(&bytes[..]).map_err(|e| D::Error::custom(format!("{:?}", e)))
            }
        }
    };
}

impl_canonical_adaptor!(FieldBytes);
impl_canonical_adaptor!(AffineGroupBytes);

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Affine, G1Projective};
    use ark_ec::ProjectiveCurve;
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };
    use serde::{Deserialize, Serialize};
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde_as(as = "FieldBytes")]
        f: Fr,
        #[serde_as(as = "AffineGroupBytes")]
        g: G1Affine,
    }

    #[test]
    fn round_trips_through_bincode_like_json() {
        let mut rng = StdRng::seed_from_u64(7u64);
        let w = Wrapper {
            f: Fr::rand(&mut rng),
            g: G1Projective::rand(&mut rng).into_affine(),
        };
        let json = serde_json::to_vec(&w).unwrap();
        let back: Wrapper = serde_json::from_slice(&json).unwrap();
        assert_eq!(w, back);
    }
}
