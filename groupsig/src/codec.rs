//! Byte-exact wire layout (spec 6): every exported object starts with its
//! one-byte scheme code, integers are big-endian fixed-width, and group
//! elements are the curve library's canonical compressed form prefixed by
//! a `uint32` length. This is deliberately *not* `CanonicalSerialize`'s own
//! framing (which length-prefixes collections as a `u64` and has no
//! per-scheme leading tag) — the derive is kept on every type in this
//! crate for convenient equality-based tests, but the functions here are
//! what `export`/`import` in the façade actually calls.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::vec::Vec;

use crate::error::GroupSigError;

/// Appends `len(bytes) as u32 big-endian ‖ bytes` to `out`.
pub fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = bytes.len() as u32;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Serialises `elem` in canonical compressed form and appends it
/// length-prefixed.
pub fn write_elem<T: CanonicalSerialize>(out: &mut Vec<u8>, elem: &T) {
    let mut bytes = Vec::new();
    elem.serialize(&mut bytes)
        .expect("serializing to a Vec<u8> cannot fail");
    write_len_prefixed(out, &bytes);
}

pub fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Cursor over an import buffer; every `read_*` advances it and errors with
/// [`GroupSigError::Serialisation`] on truncation rather than panicking.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn read_u8(&mut self) -> Result<u8, GroupSigError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(GroupSigError::Serialisation("truncated: expected a u8"))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u64(&mut self) -> Result<u64, GroupSigError> {
        let slice = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(slice);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, GroupSigError> {
        let slice = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(slice);
        Ok(u32::from_be_bytes(buf))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], GroupSigError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(GroupSigError::Serialisation("length overflow"))?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(GroupSigError::Serialisation("truncated input"))?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a `uint32`-length-prefixed canonical element.
    pub fn read_elem<T: CanonicalDeserialize>(&mut self) -> Result<T, GroupSigError> {
        let len = self.read_u32()? as usize;
        let slice = self.take(len)?;
        T::deserialize(slice).map_err(|_| GroupSigError::Serialisation("malformed group element"))
    }

    /// Reads a `uint32`-length-prefixed opaque byte string (PRF keys, hash
    /// outputs — anything that isn't a canonical group/field element).
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, GroupSigError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}
