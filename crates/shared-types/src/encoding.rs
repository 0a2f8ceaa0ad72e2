//! # Canonical Encoding
//!
//! Stable byte layout used for hashing. Fields are written in declaration
//! order, integers big-endian, variable-length byte strings and sequences are
//! prefixed with a `u32` length. Derived values (hashes) are never encoded.

use crate::entities::Hash;
use shared_crypto::sha256;

/// Append-only canonical byte writer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    /// Write a big-endian `u32`.
    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Write a big-endian `i32`.
    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Write a big-endian `u64`.
    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Write a big-endian `i64`.
    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Write a fixed 32-byte hash.
    pub fn write_hash(&mut self, h: &Hash) -> &mut Self {
        self.buf.extend_from_slice(h);
        self
    }

    /// Write fixed-width bytes without a length prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Write length-prefixed bytes.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len(bytes.len());
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Write a sequence length prefix.
    pub fn write_len(&mut self, len: usize) -> &mut Self {
        // Lengths above u32::MAX cannot occur for in-memory ledger records.
        self.write_u32(len as u32)
    }

    /// Consume the encoder.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Types with a canonical byte encoding.
pub trait CanonicalEncode {
    /// Write this value's canonical fields into `enc`.
    fn encode_canonical(&self, enc: &mut CanonicalEncoder);

    /// Canonical bytes of this value.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        self.encode_canonical(&mut enc);
        enc.into_bytes()
    }
}

/// SHA-256 of a value's canonical encoding.
pub fn canonical_hash<T: CanonicalEncode + ?Sized>(value: &T) -> Hash {
    sha256(&value.canonical_bytes())
}
