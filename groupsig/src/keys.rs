//! Tagged key kinds (spec 3): group public key, manager private key, member
//! private key, and GL19's blinding keypair. Each is a sum type over the six
//! schemes rather than a tagged `void*` (spec 9's "Polymorphic dispatch
//! without inheritance"); `.scheme()` is the dispatch tag every façade entry
//! point checks before delegating (spec 4.2).
//!
//! Grounded on `bbs_plus::setup`'s `SignatureParamsG1`/`SecretKey`/`Keypair`
//! split (group-wide params vs. per-party secret vs. derived public data),
//! generalised from one signer to the Issuer/Opener/Converter roles spec 3
//! assigns per scheme.

use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::PrimeField;
use ark_std::vec::Vec;
use zeroize::Zeroize;

#[cfg(feature = "use-serde")]
use gs_crypto_utils::serde_utils::*;
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "use-serde")]
use serde_with::serde_as;

use gs_crypto_utils::prf::PrfKey;

use crate::codec::{write_elem, write_len_prefixed, write_u64, write_u8, Reader};
use crate::credential::{CoreGroupKey, IssuerSecretKey};
use crate::error::GroupSigError;
use crate::scheme::SchemeId;

/// KLAP20's opener-specific tail: `g ∈ G1` (escrow base), `y_pub = g^xi ∈
/// G1` (opener public key) and `z = g2^xi ∈ G2` (the same secret certified
/// in G2, spec 3's "KLAP20 additionally carries `g, Y, Z`" — see
/// `DESIGN.md`'s Open Question resolution for why the escrow itself stays
/// entirely in G1 while `z` exists purely so the verifiable-opening SPK can
/// bind the two certifications of the same `xi` together).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, ark_serialize::CanonicalSerialize, ark_serialize::CanonicalDeserialize)]
pub struct Klap20Tail<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub g: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub y_pub: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub z: E::G2Affine,
}

/// GL19's converter-specific tail: `Z1, Z2, Y ∈ G1` (spec 3).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, ark_serialize::CanonicalSerialize, ark_serialize::CanonicalDeserialize)]
pub struct Gl19Tail<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub z1: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub z2: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub y: E::G1Affine,
}

/// PS16's own group key shape: it has no BBS+-style `h1,h2` commitment
/// bases (no multi-attribute commitment, just the hidden identifier `y`),
/// but carries two issuer public shares in G2 (spec 4.3 "PS16 uses a PS
/// signature"; see `schemes::ps16`'s module docs for the exact relation
/// these are used in).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, ark_serialize::CanonicalSerialize, ark_serialize::CanonicalDeserialize)]
pub struct Ps16GroupKey<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub g1: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub h: E::G1Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub g2: E::G2Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub xx: E::G2Affine,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub yy: E::G2Affine,
}

impl<E: PairingEngine> Ps16GroupKey<E> {
    pub fn generate_using_rng<R: ark_std::rand::RngCore>(
        rng: &mut R,
        xis: &E::Fr,
        yis: &E::Fr,
    ) -> Self {
        let g1 = E::G1Projective::rand(rng).into_affine();
        let h = E::G1Projective::rand(rng).into_affine();
        let g2 = E::G2Projective::rand(rng).into_affine();
        let xx = g2.mul(xis.into_repr()).into_affine();
        let yy = g2.mul(yis.into_repr()).into_affine();
        Self { g1, h, g2, xx, yy }
    }
}

/// The group's public key, tagged by scheme (spec 3). BBS04/DL21/DL21-SEQ
/// share the same core shape with no tail; KLAP20/GL19/PS16 each add their
/// own.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupPublicKey<E: PairingEngine> {
    Bbs04(CoreGroupKey<E>),
    Gl19(CoreGroupKey<E>, Gl19Tail<E>),
    Ps16(Ps16GroupKey<E>),
    Klap20(CoreGroupKey<E>, Klap20Tail<E>),
    Dl21(CoreGroupKey<E>),
    Dl21Seq(CoreGroupKey<E>),
}

impl<E: PairingEngine> GroupPublicKey<E> {
    pub fn scheme(&self) -> SchemeId {
        match self {
            GroupPublicKey::Bbs04(_) => SchemeId::Bbs04,
            GroupPublicKey::Gl19(..) => SchemeId::Gl19,
            GroupPublicKey::Ps16(_) => SchemeId::Ps16,
            GroupPublicKey::Klap20(..) => SchemeId::Klap20,
            GroupPublicKey::Dl21(_) => SchemeId::Dl21,
            GroupPublicKey::Dl21Seq(_) => SchemeId::Dl21Seq,
        }
    }

    /// The shared BBS+-style core, for every scheme but PS16 (spec 4.3).
    pub fn core(&self) -> Result<&CoreGroupKey<E>, GroupSigError> {
        match self {
            GroupPublicKey::Bbs04(c)
            | GroupPublicKey::Gl19(c, _)
            | GroupPublicKey::Klap20(c, _)
            | GroupPublicKey::Dl21(c)
            | GroupPublicKey::Dl21Seq(c) => Ok(c),
            GroupPublicKey::Ps16(_) => Err(GroupSigError::InvalidArgument(
                "PS16 has no BBS+-style core group key",
            )),
        }
    }

    /// Export per spec 6's "Group key" layout: the shared core fields,
    /// followed by a scheme-specific tail.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme().code());
        match self {
            GroupPublicKey::Bbs04(c) | GroupPublicKey::Dl21(c) | GroupPublicKey::Dl21Seq(c) => {
                write_core(&mut out, c);
            }
            GroupPublicKey::Gl19(c, tail) => {
                write_core(&mut out, c);
                write_elem(&mut out, &tail.z1);
                write_elem(&mut out, &tail.z2);
                write_elem(&mut out, &tail.y);
            }
            GroupPublicKey::Klap20(c, tail) => {
                write_core(&mut out, c);
                write_elem(&mut out, &tail.g);
                write_elem(&mut out, &tail.y_pub);
                write_elem(&mut out, &tail.z);
            }
            GroupPublicKey::Ps16(k) => {
                write_elem(&mut out, &k.g1);
                write_elem(&mut out, &k.h);
                write_elem(&mut out, &k.g2);
                write_elem(&mut out, &k.xx);
                write_elem(&mut out, &k.yy);
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code)
            .ok_or(GroupSigError::UnsupportedScheme(code))?;
        let key = match scheme {
            SchemeId::Bbs04 => GroupPublicKey::Bbs04(read_core(&mut r)?),
            SchemeId::Dl21 => GroupPublicKey::Dl21(read_core(&mut r)?),
            SchemeId::Dl21Seq => GroupPublicKey::Dl21Seq(read_core(&mut r)?),
            SchemeId::Gl19 => {
                let core = read_core(&mut r)?;
                let tail = Gl19Tail {
                    z1: r.read_elem()?,
                    z2: r.read_elem()?,
                    y: r.read_elem()?,
                };
                GroupPublicKey::Gl19(core, tail)
            }
            SchemeId::Klap20 => {
                let core = read_core(&mut r)?;
                let tail = Klap20Tail {
                    g: r.read_elem()?,
                    y_pub: r.read_elem()?,
                    z: r.read_elem()?,
                };
                GroupPublicKey::Klap20(core, tail)
            }
            SchemeId::Ps16 => GroupPublicKey::Ps16(Ps16GroupKey {
                g1: r.read_elem()?,
                h: r.read_elem()?,
                g2: r.read_elem()?,
                xx: r.read_elem()?,
                yy: r.read_elem()?,
            }),
        };
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after group key"));
        }
        Ok(key)
    }
}

fn write_core<E: PairingEngine>(out: &mut Vec<u8>, core: &CoreGroupKey<E>) {
    write_elem(out, &core.g1);
    write_elem(out, &core.h);
    write_elem(out, &core.h1);
    write_elem(out, &core.h2);
    write_elem(out, &core.g2);
    write_elem(out, &core.ipk);
}

fn read_core<E: PairingEngine>(r: &mut Reader) -> Result<CoreGroupKey<E>, GroupSigError> {
    Ok(CoreGroupKey {
        g1: r.read_elem()?,
        h: r.read_elem()?,
        h1: r.read_elem()?,
        h2: r.read_elem()?,
        g2: r.read_elem()?,
        ipk: r.read_elem()?,
    })
}

/// PS16's secret key is a pair of scalars rather than the single `isk` the
/// other schemes use (spec 4.3's PS-signature credential needs two
/// independent issuer shares, one per "slot" of the signed pair — see
/// `schemes::ps16`).
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, ark_serialize::CanonicalSerialize, ark_serialize::CanonicalDeserialize, Zeroize)]
pub struct Ps16IssuerKey<F: PrimeField> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "FieldBytes"))]
    pub xis: F,
    #[cfg_attr(feature = "use-serde", serde_as(as = "FieldBytes"))]
    pub yis: F,
}

impl<F: PrimeField> Drop for Ps16IssuerKey<F> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// The manager's private key (spec 3): the Issuer's share `isk`, plus a
/// second share `xi` for schemes declaring an inspector role (Opener for
/// KLAP20, Converter for GL19 — added by a second `setup` call).
#[derive(Clone, Debug)]
pub enum ManagerKey<E: PairingEngine> {
    Bbs04 { isk: IssuerSecretKey<E::Fr> },
    Gl19 { isk: IssuerSecretKey<E::Fr>, xi: E::Fr },
    Ps16 { isk: Ps16IssuerKey<E::Fr> },
    Klap20 { isk: IssuerSecretKey<E::Fr>, xi: E::Fr },
    Dl21 { isk: IssuerSecretKey<E::Fr> },
    Dl21Seq { isk: IssuerSecretKey<E::Fr> },
}

impl<E: PairingEngine> ManagerKey<E> {
    pub fn scheme(&self) -> SchemeId {
        match self {
            ManagerKey::Bbs04 { .. } => SchemeId::Bbs04,
            ManagerKey::Gl19 { .. } => SchemeId::Gl19,
            ManagerKey::Ps16 { .. } => SchemeId::Ps16,
            ManagerKey::Klap20 { .. } => SchemeId::Klap20,
            ManagerKey::Dl21 { .. } => SchemeId::Dl21,
            ManagerKey::Dl21Seq { .. } => SchemeId::Dl21Seq,
        }
    }

    pub fn issuer_isk(&self) -> Option<&E::Fr> {
        match self {
            ManagerKey::Bbs04 { isk }
            | ManagerKey::Gl19 { isk, .. }
            | ManagerKey::Klap20 { isk, .. }
            | ManagerKey::Dl21 { isk }
            | ManagerKey::Dl21Seq { isk } => Some(&isk.0),
            ManagerKey::Ps16 { .. } => None,
        }
    }

    pub fn inspector_share(&self) -> Option<&E::Fr> {
        match self {
            ManagerKey::Gl19 { xi, .. } | ManagerKey::Klap20 { xi, .. } => Some(xi),
            _ => None,
        }
    }

    /// Spec 6's "Manager key": `code ‖ len(isk)‖isk ‖ [len(xi)‖xi]?`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme().code());
        match self {
            ManagerKey::Bbs04 { isk } | ManagerKey::Dl21 { isk } | ManagerKey::Dl21Seq { isk } => {
                write_elem(&mut out, &isk.0);
            }
            ManagerKey::Gl19 { isk, xi } | ManagerKey::Klap20 { isk, xi } => {
                write_elem(&mut out, &isk.0);
                write_elem(&mut out, xi);
            }
            ManagerKey::Ps16 { isk } => {
                write_elem(&mut out, &isk.xis);
                write_elem(&mut out, &isk.yis);
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let key = match scheme {
            SchemeId::Bbs04 => ManagerKey::Bbs04 {
                isk: IssuerSecretKey(r.read_elem()?),
            },
            SchemeId::Dl21 => ManagerKey::Dl21 {
                isk: IssuerSecretKey(r.read_elem()?),
            },
            SchemeId::Dl21Seq => ManagerKey::Dl21Seq {
                isk: IssuerSecretKey(r.read_elem()?),
            },
            SchemeId::Gl19 => ManagerKey::Gl19 {
                isk: IssuerSecretKey(r.read_elem()?),
                xi: r.read_elem()?,
            },
            SchemeId::Klap20 => ManagerKey::Klap20 {
                isk: IssuerSecretKey(r.read_elem()?),
                xi: r.read_elem()?,
            },
            SchemeId::Ps16 => ManagerKey::Ps16 {
                isk: Ps16IssuerKey {
                    xis: r.read_elem()?,
                    yis: r.read_elem()?,
                },
            },
        };
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after manager key"));
        }
        Ok(key)
    }
}

/// The member's private key (spec 3): a BBS+-style credential `(A, x)` plus
/// the hidden identifier `y`, with scheme-specific extras (GL19's
/// expiration, DL21-SEQ's PRF key material).
#[derive(Clone, Debug)]
pub enum MemberKey<E: PairingEngine> {
    Bbs04 { a: E::G1Affine, x: E::Fr, y: E::Fr },
    Gl19 { a: E::G1Affine, x: E::Fr, y: E::Fr, expiration: u64 },
    Ps16 { sigma1: E::G1Affine, sigma1h: E::G1Affine, sigma2: E::G1Affine, y: E::Fr },
    Klap20 { a: E::G1Affine, x: E::Fr, y: E::Fr },
    Dl21 { a: E::G1Affine, x: E::Fr, y: E::Fr },
    Dl21Seq { a: E::G1Affine, x: E::Fr, y: E::Fr, prf_key: PrfKey },
}

impl<E: PairingEngine> MemberKey<E> {
    pub fn scheme(&self) -> SchemeId {
        match self {
            MemberKey::Bbs04 { .. } => SchemeId::Bbs04,
            MemberKey::Gl19 { .. } => SchemeId::Gl19,
            MemberKey::Ps16 { .. } => SchemeId::Ps16,
            MemberKey::Klap20 { .. } => SchemeId::Klap20,
            MemberKey::Dl21 { .. } => SchemeId::Dl21,
            MemberKey::Dl21Seq { .. } => SchemeId::Dl21Seq,
        }
    }

    pub fn y(&self) -> E::Fr {
        match self {
            MemberKey::Bbs04 { y, .. }
            | MemberKey::Gl19 { y, .. }
            | MemberKey::Ps16 { y, .. }
            | MemberKey::Klap20 { y, .. }
            | MemberKey::Dl21 { y, .. }
            | MemberKey::Dl21Seq { y, .. } => *y,
        }
    }

    /// Spec 6's "Member key": `code ‖ len(A)‖A ‖ len(x)‖x ‖ len(y)‖y ‖
    /// [scheme-specific tail]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme().code());
        match self {
            MemberKey::Bbs04 { a, x, y } | MemberKey::Klap20 { a, x, y } | MemberKey::Dl21 { a, x, y } => {
                write_elem(&mut out, a);
                write_elem(&mut out, x);
                write_elem(&mut out, y);
            }
            MemberKey::Gl19 { a, x, y, expiration } => {
                write_elem(&mut out, a);
                write_elem(&mut out, x);
                write_elem(&mut out, y);
                write_u64(&mut out, *expiration);
            }
            MemberKey::Dl21Seq { a, x, y, prf_key } => {
                write_elem(&mut out, a);
                write_elem(&mut out, x);
                write_elem(&mut out, y);
                write_len_prefixed(&mut out, &prf_key.0);
            }
            MemberKey::Ps16 { sigma1, sigma1h, sigma2, y } => {
                write_elem(&mut out, sigma1);
                write_elem(&mut out, sigma1h);
                write_elem(&mut out, sigma2);
                write_elem(&mut out, y);
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let key = match scheme {
            SchemeId::Bbs04 => MemberKey::Bbs04 {
                a: r.read_elem()?,
                x: r.read_elem()?,
                y: r.read_elem()?,
            },
            SchemeId::Klap20 => MemberKey::Klap20 {
                a: r.read_elem()?,
                x: r.read_elem()?,
                y: r.read_elem()?,
            },
            SchemeId::Dl21 => MemberKey::Dl21 {
                a: r.read_elem()?,
                x: r.read_elem()?,
                y: r.read_elem()?,
            },
            SchemeId::Gl19 => MemberKey::Gl19 {
                a: r.read_elem()?,
                x: r.read_elem()?,
                y: r.read_elem()?,
                expiration: r.read_u64()?,
            },
            SchemeId::Dl21Seq => {
                let a = r.read_elem()?;
                let x = r.read_elem()?;
                let y = r.read_elem()?;
                let key_bytes = r.read_bytes()?;
                MemberKey::Dl21Seq {
                    a,
                    x,
                    y,
                    prf_key: PrfKey(key_bytes),
                }
            }
            SchemeId::Ps16 => MemberKey::Ps16 {
                sigma1: r.read_elem()?,
                sigma1h: r.read_elem()?,
                sigma2: r.read_elem()?,
                y: r.read_elem()?,
            },
        };
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after member key"));
        }
        Ok(key)
    }
}

/// GL19's blinding keypair (spec 3): `bsk ∈ Fr`, `bpk = g1^bsk ∈ G1`. Used
/// by `blind`/`unblind`, never by any other scheme.
#[cfg_attr(feature = "use-serde", serde_as)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, ark_serialize::CanonicalSerialize, ark_serialize::CanonicalDeserialize)]
pub struct BlindingKeyPair<E: PairingEngine> {
    #[cfg_attr(feature = "use-serde", serde_as(as = "ScalarFieldBytes"))]
    pub bsk: E::Fr,
    #[cfg_attr(feature = "use-serde", serde_as(as = "AffineGroupBytes"))]
    pub bpk: E::G1Affine,
}

impl<E: PairingEngine> BlindingKeyPair<E> {
    pub fn generate<R: ark_std::rand::RngCore>(rng: &mut R, g1: E::G1Affine) -> Self {
        let bsk = E::Fr::rand(rng);
        let bpk = g1.mul(bsk.into_repr()).into_affine();
        Self { bsk, bpk }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    type Fr = <Bls12_381 as PairingEngine>::Fr;

    #[test]
    fn group_public_key_round_trips_for_every_scheme() {
        let mut rng = StdRng::seed_from_u64(11u64);
        let isk = Fr::rand(&mut rng);
        let core = CoreGroupKey::<Bls12_381>::generate_using_rng(&mut rng, &isk);

        let bbs04 = GroupPublicKey::Bbs04(core.clone());
        assert_eq!(GroupPublicKey::from_bytes(&bbs04.to_bytes()).unwrap(), bbs04);

        let dl21 = GroupPublicKey::Dl21(core.clone());
        assert_eq!(GroupPublicKey::from_bytes(&dl21.to_bytes()).unwrap(), dl21);

        let gl19 = GroupPublicKey::Gl19(
            core.clone(),
            Gl19Tail {
                z1: core.g1,
                z2: core.h,
                y: core.h1,
            },
        );
        assert_eq!(GroupPublicKey::from_bytes(&gl19.to_bytes()).unwrap(), gl19);

        let klap20 = GroupPublicKey::Klap20(
            core.clone(),
            Klap20Tail {
                g: core.g1,
                y_pub: core.h,
                z: core.g2,
            },
        );
        assert_eq!(GroupPublicKey::from_bytes(&klap20.to_bytes()).unwrap(), klap20);

        let ps16 = GroupPublicKey::Ps16(Ps16GroupKey::generate_using_rng(
            &mut rng,
            &Fr::rand(&mut rng),
            &Fr::rand(&mut rng),
        ));
        assert_eq!(GroupPublicKey::from_bytes(&ps16.to_bytes()).unwrap(), ps16);
    }

    #[test]
    fn manager_key_round_trips_with_and_without_inspector_share() {
        let mut rng = StdRng::seed_from_u64(12u64);
        let bbs04 = ManagerKey::<Bls12_381>::Bbs04 {
            isk: IssuerSecretKey::generate(&mut rng),
        };
        let bytes = bbs04.to_bytes();
        match ManagerKey::<Bls12_381>::from_bytes(&bytes).unwrap() {
            ManagerKey::Bbs04 { isk } => assert_eq!(isk.0, bbs04.issuer_isk().copied().unwrap()),
            _ => panic!("wrong variant"),
        }

        let klap20 = ManagerKey::<Bls12_381>::Klap20 {
            isk: IssuerSecretKey::generate(&mut rng),
            xi: Fr::rand(&mut rng),
        };
        let bytes = klap20.to_bytes();
        let back = ManagerKey::<Bls12_381>::from_bytes(&bytes).unwrap();
        assert_eq!(back.inspector_share().copied(), klap20.inspector_share().copied());
    }

    #[test]
    fn wrong_scheme_code_is_rejected() {
        let bytes = vec![255u8, 0, 0, 0, 0];
        assert!(GroupPublicKey::<Bls12_381>::from_bytes(&bytes).is_err());
    }
}
