//! The Group Membership List (spec 3: "an append-only, ordered sequence of
//! entries each holding at minimum a scheme tag, a 64-bit index, a
//! traceable commitment/identifier ... and arbitrary per-scheme
//! metadata"). Grounded on `examples/original_source/src/groupsig/gml.c`'s
//! insert-is-append-only design and `gml_handles.h`'s per-scheme entry
//! shape, reworked as a plain `Vec`-backed ledger rather than a linked list
//! of `void*` entries.
//!
//! Concurrency (spec 5): this type itself is `!Sync` by ordinary Rust
//! borrowing rules once placed behind `&mut`; callers who need concurrent
//! `gml_insert`/`open` from multiple threads are expected to wrap a `Gml`
//! in a `RwLock` themselves (spec 5's "reader-writer discipline sufficient"
//! — the crate does not impose a particular lock type).

use ark_ec::PairingEngine;
use ark_std::vec::Vec;

use crate::codec::{write_elem, write_len_prefixed, write_u64, write_u8, Reader};
use crate::error::GroupSigError;
use crate::scheme::SchemeId;

/// One append-only entry: the traceable commitment contributed during Join
/// (`τ = g1^y`/`h^y` for the BBS+-style schemes) plus opaque per-scheme
/// metadata (currently unused by any scheme in scope, but present per spec
/// 3's "arbitrary per-scheme metadata" and `gml_handles.h`'s generic entry
/// shape).
#[derive(Clone, Debug, PartialEq)]
pub struct GmlEntry<E: PairingEngine> {
    pub scheme: SchemeId,
    pub index: u64,
    pub tau: E::G1Affine,
    pub metadata: Vec<u8>,
}

impl<E: PairingEngine> GmlEntry<E> {
    /// Spec 6's "GML entry": `code ‖ index(uint64) ‖ [scheme-specific
    /// payload]`; the payload here is `tau` followed by the metadata blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme.code());
        write_u64(&mut out, self.index);
        write_elem(&mut out, &self.tau);
        write_len_prefixed(&mut out, &self.metadata);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let entry = Self::read(&mut r)?;
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after GML entry"));
        }
        Ok(entry)
    }

    fn read(r: &mut Reader) -> Result<Self, GroupSigError> {
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let index = r.read_u64()?;
        let tau = r.read_elem()?;
        let metadata = r.read_bytes()?;
        Ok(Self {
            scheme,
            index,
            tau,
            metadata,
        })
    }
}

/// An ordered, append-only ledger of [`GmlEntry`], owned by the Issuer for
/// the lifetime of the group (spec 3). Every scheme with `has_gml == true`
/// (BBS04, GL19, PS16, KLAP20) shares this same structure; DL21/DL21-SEQ
/// never construct one.
#[derive(Clone, Debug, PartialEq)]
pub struct Gml<E: PairingEngine> {
    pub scheme: SchemeId,
    entries: Vec<GmlEntry<E>>,
}

impl<E: PairingEngine> Gml<E> {
    pub fn new(scheme: SchemeId) -> Self {
        Self {
            scheme,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GmlEntry<E>] {
        &self.entries
    }

    /// Append a new entry, atomic with credential issuance per spec's
    /// "GML append is atomic with successful `seq=2` production on the
    /// manager side" (`join_mgr` constructs and appends the entry in the
    /// same call, see `facade::join_mgr_step`). Indices are dense and
    /// monotone: the next entry always gets `self.len()` as its index.
    pub fn insert(&mut self, tau: E::G1Affine) -> Result<u64, GroupSigError> {
        if tau.is_zero_check() {
            return Err(GroupSigError::InvalidArgument("GML entry's tau must not be the identity"));
        }
        let index = self.entries.len() as u64;
        self.entries.push(GmlEntry {
            scheme: self.scheme,
            index,
            tau,
            metadata: Vec::new(),
        });
        log::debug!("gml: appended entry {} for {}", index, self.scheme);
        Ok(index)
    }

    /// Linear scan for the entry whose `tau` equals the opener's recovered
    /// identifier (spec 4.5's `open`). Returns `None` — callers map this to
    /// `NotFound` — if the signature was produced by a member since pruned
    /// (administrative reset; spec 3's "removal is destructive").
    pub fn find_by_tau(&self, tau: &E::G1Affine) -> Option<u64> {
        self.entries.iter().find(|e| &e.tau == tau).map(|e| e.index)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_u8(&mut out, self.scheme.code());
        write_u64(&mut out, self.entries.len() as u64);
        for e in &self.entries {
            write_elem(&mut out, &e.tau);
            write_len_prefixed(&mut out, &e.metadata);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupSigError> {
        let mut r = Reader::new(bytes);
        let code = r.read_u8()?;
        let scheme = SchemeId::from_code(code).ok_or(GroupSigError::UnsupportedScheme(code))?;
        let count = r.read_u64()?;
        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let tau = r.read_elem()?;
            let metadata = r.read_bytes()?;
            entries.push(GmlEntry {
                scheme,
                index,
                tau,
                metadata,
            });
        }
        if !r.is_empty() {
            return Err(GroupSigError::Serialisation("trailing bytes after GML"));
        }
        Ok(Self { scheme, entries })
    }
}

/// Small shim so `Gml::insert` can reject the identity element without
/// pulling in `ark_ec::AffineCurve` at every call site that only cares
/// about this one check.
trait ZeroCheck {
    fn is_zero_check(&self) -> bool;
}

impl<G: ark_ec::AffineCurve> ZeroCheck for G {
    fn is_zero_check(&self) -> bool {
        self.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Bls12_381;
    use ark_ec::{AffineCurve, ProjectiveCurve};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;

    type G1Projective = <Bls12_381 as PairingEngine>::G1Projective;

    #[test]
    fn indices_are_dense_monotone_and_unique() {
        let mut rng = StdRng::seed_from_u64(20u64);
        let mut gml = Gml::<Bls12_381>::new(SchemeId::Bbs04);
        let taus: Vec<_> = (0..3)
            .map(|_| G1Projective::rand(&mut rng).into_affine())
            .collect();
        for (i, tau) in taus.iter().enumerate() {
            let idx = gml.insert(*tau).unwrap();
            assert_eq!(idx, i as u64);
        }
        assert_eq!(gml.len(), 3);
        for (i, tau) in taus.iter().enumerate() {
            assert_eq!(gml.find_by_tau(tau), Some(i as u64));
        }
    }

    #[test]
    fn find_by_tau_misses_pruned_entries() {
        let mut rng = StdRng::seed_from_u64(21u64);
        let mut gml = Gml::<Bls12_381>::new(SchemeId::Klap20);
        gml.insert(G1Projective::rand(&mut rng).into_affine()).unwrap();
        let unrelated = G1Projective::rand(&mut rng).into_affine();
        assert_eq!(gml.find_by_tau(&unrelated), None);
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut rng = StdRng::seed_from_u64(22u64);
        let mut gml = Gml::<Bls12_381>::new(SchemeId::Gl19);
        for _ in 0..4 {
            gml.insert(G1Projective::rand(&mut rng).into_affine()).unwrap();
        }
        let bytes = gml.to_bytes();
        assert_eq!(Gml::from_bytes(&bytes).unwrap(), gml);
    }
}
