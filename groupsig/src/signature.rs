//! The tagged signature kind (spec 3: "a small tuple of group elements and
//! an SPK ... canonical shape across schemes: `(Â, Ã, d, π, aux)`"). Every
//! scheme but PS16 shares the `(a_hat, a_tilde, d, spk)` quadruple produced
//! by `credential::randomize_credential`; PS16's own rerandomised credential
//! has one extra element (`e`, see `schemes::ps16`) so it gets its own
//! variant shape instead of forcing a one-off field into the shared one.

use ark_ec::PairingEngine;
use ark_std::vec::Vec;

use crate::codec::{write_elem, write_len_prefixed, write_u8, Reader};
use crate::error::GroupSigError;
use crate::scheme::SchemeId;
use crate::spk::Spk;

#[derive(Clone, Debug, PartialEq)]
pub enum Signature<E: PairingEngine> {
    Bbs04 {
        a_hat: E::G1Affine,
        a_tilde: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
    },
    /// GL19 additionally carries the blinded pseudonym pair (spec 4.4:
    /// `(nym1, nym2, ehy1, ehy2)`) and the credential's expiration
    /// timestamp, checked by `verify` (spec 4.3: "verifier rejects
    /// expired").
    Gl19 {
        a_hat: E::G1Affine,
        a_tilde: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
        nym1: E::G1Affine,
        nym2: E::G1Affine,
        ehy1: E::G1Affine,
        ehy2: E::G1Affine,
        expiration: u64,
    },
    /// PS16's rerandomised credential is `(sigma1', e=sigma1h', sigma2')`
    /// rather than `(a_hat, a_tilde)` — see `schemes::ps16`'s module docs
    /// for the relation `e` stands in for.
    Ps16 {
        sigma1: E::G1Affine,
        e: E::G1Affine,
        sigma2: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
    },
    /// KLAP20 additionally carries the opener's escrow (spec 4.4: `(c1 =
    /// g^r, c2 = h^y·Y^r)`, G1 ElGamal of the same `h^y` commitment the
    /// GML stores, under the opener's public key `Y`; see `DESIGN.md`'s
    /// Open Question resolution).
    Klap20 {
        a_hat: E::G1Affine,
        a_tilde: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
        c1: E::G1Affine,
        c2: E::G1Affine,
    },
    /// DL21's per-scope pseudonym (spec 4.4/4.7: `nym = H_G1(scope)^y`).
    Dl21 {
        a_hat: E::G1Affine,
        a_tilde: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
        nym: E::G1Affine,
    },
    /// DL21-SEQ additionally carries the sequence triple (spec 4.4 step 5,
    /// spec 6's "DL21-SEQ signature aux": `seq1, seq2` are hash/PRF-derived
    /// byte strings, not group elements — see `DESIGN.md`'s supplemented
    /// feature on `seqinfo`'s wire shape).
    Dl21Seq {
        a_hat: E::G1Affine,
        a_tilde: E::G1Affine,
        d: E::G1Affine,
        spk: Spk<E>,
        nym: E::G1Affine,
        seq1: Vec<u8>,
        seq2: Vec<u8>,
        seq3: Vec<u8>,
    },
}

impl<E: PairingEngine> Signature<E> {
    pub fn scheme(&self) -> SchemeId {
        match self {
            Signature::Bbs04 { .. } => SchemeId::Bbs04,
            Signature::Gl19 { .. } => SchemeId::Gl19,
            Signature::Ps16 { .. } => SchemeId::Ps16,
            Signature::Klap20 { .. } => SchemeId::Klap20,
            Signature::Dl21 { .. } => SchemeId::Dl21,
            Signature::Dl21Seq { .. } => SchemeId::Dl21Seq,
        }
    }

    pub fn spk(&self) -> &Spk<E> {
        match self {
            Signature::Bbs04 { spk, .. }
            | Signature::Gl19 { spk, .. }
            | Signature::Klap20 { spk, .. }
            | Signature::Dl21 { spk, .. }
            | Signature::Dl21Seq { spk, .. } => spk,
            Signature::Ps16 { spk, .. } => spk,
        }
    }

    /// Spec 6's "Signature (BBS04/PS16/KLAP20)": `code ‖ len(Â)‖Â ‖
    /// len(Ã)‖Ã ‖ len(d)‖d ‖ len(π)‖π ‖ [aux]`, generalised to every scheme.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme().code());
        match self {
            Signature::Bbs04 { a_hat, a_tilde, d, spk } => {
                write_elem(&mut out, a_hat);
                write_elem(&mut out, a_tilde);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
            }
            Signature::Gl19 {
                a_hat,
                a_tilde,
                d,
                spk,
                nym1,
                nym2,
                ehy1,
                ehy2,
                expiration,
            } => {
                write_elem(&mut out, a_hat);
                write_elem(&mut out, a_tilde);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
                write_elem(&mut out, nym1);
                write_elem(&mut out, nym2);
                write_elem(&mut out, ehy1);
                write_elem(&mut out, ehy2);
                crate::codec::write_u64(&mut out, *expiration);
            }
            Signature::Ps16 { sigma1, e, sigma2, d, spk } => {
                write_elem(&mut out, sigma1);
                write_elem(&mut out, e);
                write_elem(&mut out, sigma2);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
            }
            Signature::Klap20 { a_hat, a_tilde, d, spk, c1, c2 } => {
                write_elem(&mut out, a_hat);
                write_elem(&mut out, a_tilde);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
                write_elem(&mut out, c1);
                write_elem(&mut out, c2);
            }
            Signature::Dl21 { a_hat, a_tilde, d, spk, nym } => {
                write_elem(&mut out, a_hat);
                write_elem(&mut out, a_tilde);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
                write_elem(&mut out, nym);
            }
            Signature::Dl21Seq {
                a_hat,
                a_tilde,
                d,
                spk,
                nym,
                seq1,
                seq2,
                seq3,
            } => {
                write_elem(&mut out, a_hat);
                write_elem(&mut out, a_tilde);
                write_elem(&mut out, d);
                write_len_prefixed(&mut out, &spk.to_bytes());
                write_elem(&mut out, nym);
                write_len_prefixed(&mut out, seq1);
                write_len_prefixed(&mut out, seq2);
                write_len_prefixed(&mut out, seq3);
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let sig = match scheme {
            SchemeId::Bbs04 => Signature::Bbs04 {
                a_hat: r.read_elem()?,
                a_tilde: r.read_elem()?,
                d: r.read_elem()?,
                spk: Spk::from_bytes(&r.read_bytes()?)?,
            },
            SchemeId::Gl19 => {
                let a_hat = r.read_elem()?;
                let a_tilde = r.read_elem()?;
                let d = r.read_elem()?;
                let spk = Spk::from_bytes(&r.read_bytes()?)?;
                let nym1 = r.read_elem()?;
                let nym2 = r.read_elem()?;
                let ehy1 = r.read_elem()?;
                let ehy2 = r.read_elem()?;
                let expiration = r.read_u64()?;
                Signature::Gl19 {
                    a_hat,
                    a_tilde,
                    d,
                    spk,
                    nym1,
                    nym2,
                    ehy1,
                    ehy2,
                    expiration,
                }
            }
            SchemeId::Ps16 => Signature::Ps16 {
                sigma1: r.read_elem()?,
                e: r.read_elem()?,
                sigma2: r.read_elem()?,
                d: r.read_elem()?,
                spk: Spk::from_bytes(&r.read_bytes()?)?,
            },
            SchemeId::Klap20 => {
                let a_hat = r.read_elem()?;
                let a_tilde = r.read_elem()?;
                let d = r.read_elem()?;
                let spk = Spk::from_bytes(&r.read_bytes()?)?;
                let c1 = r.read_elem()?;
                let c2 = r.read_elem()?;
                Signature::Klap20 {
                    a_hat,
                    a_tilde,
                    d,
                    spk,
                    c1,
                    c2,
                }
            }
            SchemeId::Dl21 => {
                let a_hat = r.read_elem()?;
                let a_tilde = r.read_elem()?;
                let d = r.read_elem()?;
                let spk = Spk::from_bytes(&r.read_bytes()?)?;
                let nym = r.read_elem()?;
                Signature::Dl21 { a_hat, a_tilde, d, spk, nym }
            }
            SchemeId::Dl21Seq => {
                let a_hat = r.read_elem()?;
                let a_tilde = r.read_elem()?;
                let d = r.read_elem()?;
                let spk = Spk::from_bytes(&r.read_bytes()?)?;
                let nym = r.read_elem()?;
                let seq1 = r.read_bytes()?;
                let seq2 = r.read_bytes()?;
                let seq3 = r.read_bytes()?;
                Signature::Dl21Seq {
                    a_hat,
                    a_tilde,
                    d,
                    spk,
                    nym,
                    seq1,
                    seq2,
                    seq3,
                }
            }
        };
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after signature"));
        }
        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_ec::{AffineCurve, ProjectiveCurve};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;

    type Fr = <Bls12_381 as PairingEngine>::Fr;
    type G1Projective = <Bls12_381 as PairingEngine>::G1Projective;

    fn dummy_spk(rng: &mut StdRng) -> Spk<Bls12_381> {
        Spk {
            challenge: Fr::rand(rng),
            responses: ark_std::vec![Fr::rand(rng), Fr::rand(rng)],
        }
    }

    #[test]
    fn bbs04_signature_round_trips() {
        let mut rng = StdRng::seed_from_u64(30u64);
        let sig = Signature::Bbs04 {
            a_hat: G1Projective::rand(&mut rng).into_affine(),
            a_tilde: G1Projective::rand(&mut rng).into_affine(),
            d: G1Projective::rand(&mut rng).into_affine(),
            spk: dummy_spk(&mut rng),
        };
        assert_eq!(Signature::from_bytes(&sig.to_bytes()).unwrap(), sig);
    }

    #[test]
    fn dl21seq_signature_round_trips_with_byte_aux() {
        let mut rng = StdRng::seed_from_u64(31u64);
        let sig = Signature::Dl21Seq {
            a_hat: G1Projective::rand(&mut rng).into_affine(),
            a_tilde: G1Projective::rand(&mut rng).into_affine(),
            d: G1Projective::rand(&mut rng).into_affine(),
            spk: dummy_spk(&mut rng),
            nym: G1Projective::rand(&mut rng).into_affine(),
            seq1: ark_std::vec![1, 2, 3],
            seq2: ark_std::vec![4, 5, 6, 7],
            seq3: ark_std::vec![8],
        };
        assert_eq!(Signature::from_bytes(&sig.to_bytes()).unwrap(), sig);
    }

    #[test]
    fn cross_scheme_bytes_reject_as_wrong_variant() {
        let mut rng = StdRng::seed_from_u64(32u64);
        let sig = Signature::Dl21 {
            a_hat: G1Projective::rand(&mut rng).into_affine(),
            a_tilde: G1Projective::rand(&mut rng).into_affine(),
            d: G1Projective::rand(&mut rng).into_affine(),
            spk: dummy_spk(&mut rng),
            nym: G1Projective::rand(&mut rng).into_affine(),
        };
        let bytes = sig.to_bytes();
        let decoded = Signature::<Bls12_381>::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.scheme(), SchemeId::Dl21);
        assert_ne!(decoded.scheme(), SchemeId::Bbs04);
    }
}
