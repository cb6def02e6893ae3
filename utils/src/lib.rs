#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

//! Common code shared by the SPK engine and the scheme cores: hashing a seed
//! or label into a field/group element, multi-scalar multiplication, canonical
//! `serde` adaptors over `ark_serialize`, and the PRF used by DL21-SEQ.

pub mod error;
pub mod hashing_utils;
pub mod msm;
pub mod prf;
pub mod serde_utils;
