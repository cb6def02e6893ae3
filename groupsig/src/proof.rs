//! The two proof kinds this crate produces outside of a signature's own
//! embedded SPK (spec 4.5-4.7): KLAP20's verifiable-opening proof and the
//! DL21-family link proof. Grounded on
//! `examples/original_source/src/groupsig/klap20/proof.h`'s
//! `klap20_spk1_t` being its own object kind, distinct from the signature's
//! `pi` (see `DESIGN.md`'s supplemented-feature note).

use ark_ec::PairingEngine;
use ark_std::vec::Vec;

use crate::codec::{write_len_prefixed, write_u8, Reader};
use crate::error::GroupSigError;
use crate::scheme::SchemeId;
use crate::spk::Spk;

#[derive(Clone, Debug, PartialEq)]
pub enum Proof<E: PairingEngine> {
    /// KLAP20 `open`'s verifiable-opening proof (spec 4.5): an SPK-REP
    /// proving the same `xi` is certified by the group key's `Y` and `Z`
    /// and was the one used to decrypt the signature's escrow.
    Klap20Open { spk: Spk<E> },
    /// DL21/DL21-SEQ `link`'s proof (spec 4.7): an SPK-DLOG proving a
    /// single `y` is the discrete log of every pseudonym in the batch
    /// under its respective scope base, bound to the caller's message.
    DlLink { scheme: SchemeId, spk: Spk<E> },
}

impl<E: PairingEngine> Proof<E> {
    pub fn scheme_of(&self, klap20_scheme: SchemeId) -> SchemeId {
        match self {
            Proof::Klap20Open { .. } => klap20_scheme,
            Proof::DlLink { scheme, .. } => *scheme,
        }
    }

    pub fn spk(&self) -> &Spk<E> {
        match self {
            Proof::Klap20Open { spk } => spk,
            Proof::DlLink { spk, .. } => spk,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Proof::Klap20Open { spk } => {
                write_u8(&mut out, SchemeId::Klap20.code());
                write_u8(&mut out, 0); // kind tag: opening proof
                write_len_prefixed(&mut out, &spk.to_bytes());
            }
            Proof::DlLink { scheme, spk } => {
                write_u8(&mut out, scheme.code());
                write_u8(&mut out, 1); // kind tag: link proof
                write_len_prefixed(&mut out, &spk.to_bytes());
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let kind = r.read_u8()?;
        let spk = Spk::from_bytes(&r.read_bytes()?)?;
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after proof"));
        }
        match (scheme, kind) {
            (SchemeId::Klap20, 0) => Ok(Proof::Klap20Open { spk }),
            (SchemeId::Dl21, 1) | (SchemeId::Dl21Seq, 1) => Ok(Proof::DlLink { scheme, spk }),
            _ => Err(GroupSigError::InvalidArgument("unrecognised proof scheme/kind combination")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;

    type Fr = <Bls12_381 as PairingEngine>::Fr;

    #[test]
    fn open_proof_round_trips() {
        let mut rng = StdRng::seed_from_u64(40u64);
        let proof = Proof::<Bls12_381>::Klap20Open {
            spk: Spk {
                challenge: Fr::rand(&mut rng),
                responses: ark_std::vec![Fr::rand(&mut rng)],
            },
        };
        assert_eq!(Proof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }

    #[test]
    fn link_proof_round_trips_per_scheme() {
        let mut rng = StdRng::seed_from_u64(41u64);
        let proof = Proof::<Bls12_381>::DlLink {
            scheme: SchemeId::Dl21Seq,
            spk: Spk {
                challenge: Fr::rand(&mut rng),
                responses: ark_std::vec![Fr::rand(&mut rng), Fr::rand(&mut rng)],
            },
        };
        let back = Proof::from_bytes(&proof.to_bytes()).unwrap();
        assert_eq!(back, proof);
    }
}
