//! The error taxonomy every façade entry point returns, grounded on the
//! `BBSPlusError`/`SchnorrError` style the rest of the corpus uses: a flat
//! enum, a hand-written `Display`, `From` impls for the errors of the
//! layers underneath.

use ark_serialize::SerializationError;
use ark_std::fmt;
use schnorr_pok::error::SchnorrError;

/// Errors a façade entry point can return. Verification predicates signal
/// cryptographic rejection through their own `bool`/`Outcome` return value,
/// not through this enum — `CryptoFail` is reserved for a pairing check or
/// SPK verification that fails *inside* an operation that must otherwise
/// succeed (e.g. `open`'s internal re-verification of the signature before
/// it attempts to decrypt).
#[derive(Debug)]
pub enum GroupSigError {
    /// Null/missing input, wrong scheme code on a sub-object, mismatched
    /// vector lengths, or any other caller error detectable without
    /// cryptography.
    InvalidArgument(&'static str),
    /// No handle registered for the given scheme code.
    UnsupportedScheme(u8),
    /// A pairing check, SPK verification, or subgroup check failed where
    /// the calling operation required it to succeed.
    CryptoFail(&'static str),
    /// Join/issuance state machine violation: wrong `seq`, or a
    /// scheme-specific postcondition (e.g. an expired GL19 credential).
    ProtocolFail(&'static str),
    /// `open` found no GML entry matching the recovered identifier.
    NotFound,
    /// Truncated or structurally ill-formed input bytes.
    Serialisation(&'static str),
    /// Allocator/CSPRNG failure, or an invariant the implementation itself
    /// is responsible for upholding.
    Internal(&'static str),
}

impl fmt::Display for GroupSigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSigError::InvalidArgument(m) => write!(f, "invalid argument: {}", m),
            GroupSigError::UnsupportedScheme(c) => write!(f, "no handle for scheme code {}", c),
            GroupSigError::CryptoFail(m) => write!(f, "cryptographic check failed: {}", m),
            GroupSigError::ProtocolFail(m) => write!(f, "protocol violation: {}", m),
            GroupSigError::NotFound => write!(f, "no matching GML entry"),
            GroupSigError::Serialisation(m) => write!(f, "malformed input: {}", m),
            GroupSigError::Internal(m) => write!(f, "internal error: {}", m),
        }
    }
}

impl From<SchnorrError> for GroupSigError {
    fn from(e: SchnorrError) -> Self {
        match e {
            SchnorrError::Serialization(_) => GroupSigError::Serialisation("malformed SPK bytes"),
            SchnorrError::InvalidResponse => GroupSigError::CryptoFail("SPK response invalid"),
            _ => GroupSigError::CryptoFail("SPK malformed"),
        }
    }
}

impl From<SerializationError> for GroupSigError {
    fn from(_: SerializationError) -> Self {
        GroupSigError::Serialisation("malformed canonical bytes")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GroupSigError {}
