//! Byte-level payload codecs.
//!
//! A [`ByteCodec`] transforms the serialized payload as a whole before it
//! is wrapped in the envelope, leaving room for compression or encryption
//! layers without touching the value encoding. The default
//! [`IdentityCodec`] copies bytes through unchanged. The envelope checksum
//! always covers the transformed payload.

/// A reversible byte-level transform applied to whole payloads.
pub trait ByteCodec {
    /// Transforms payload bytes on the encode path.
    fn encode(&self, input: &[u8]) -> Vec<u8>;

    /// Reverses [`encode`](Self::encode) on the decode path.
    fn decode(&self, input: &[u8]) -> Vec<u8>;
}

/// The pass-through codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCodec;

impl ByteCodec for IdentityCodec {
    fn encode(&self, input: &[u8]) -> Vec<u8> {
        input.to_vec()
    }

    fn decode(&self, input: &[u8]) -> Vec<u8> {
        input.to_vec()
    }
}
