//! The outermost packing layer: version, checksum, and payload length.
//!
//! [`serialize`] and [`deserialize`] wrap and unwrap a single payload in a
//! ten-byte envelope. Decoding refuses payloads whose version does not
//! match exactly or whose checksum does not verify; at the soft surface a
//! refusal, like any other decode failure, yields the default value of the
//! requested type. The `try_` family reports the same failures as
//! [`std::io::Error`] values instead.

use std::io;

use crate::{
    buffer::{BoundedReader, Reader, SliceReader, SliceWriter, VecWriter, Writer},
    checksum::{Checksum, NoChecksum},
    codec::ByteCodec,
    decode::Decode,
    encode::{Encode, DEFAULT_RESERVE},
};

/// Major half of the format version.
pub const VERSION_MAJOR: u8 = 0;

/// Minor half of the format version.
pub const VERSION_MINOR: u8 = 1;

/// Packed wire version: major in the high byte, minor in the low byte.
pub const VERSION: u16 = ((VERSION_MAJOR as u16) << 8) | VERSION_MINOR as u16;

/// The ten-byte header prepended exactly once per serialized payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Packed major/minor version.
    pub version: u16,
    /// Digest of the payload bytes under the chosen checksum strategy.
    pub crc: u32,
    /// Payload byte count, excluding this header.
    pub length: u32,
}

impl EnvelopeHeader {
    /// Encoded width of the envelope header.
    pub const SIZE: usize = 10;

    /// Writes the header fields in wire order.
    ///
    /// Like any scalar write, the header is all-or-nothing on bounded
    /// sinks.
    pub fn emit<W: Writer + ?Sized>(self, writer: &mut W) {
        if writer.can_write(Self::SIZE) {
            writer.emit_u16(self.version);
            writer.emit_u32(self.crc);
            writer.emit_u32(self.length);
        }
    }

    /// Reads the header fields in wire order.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than [`Self::SIZE`] bytes remain.
    pub fn read<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            version: reader.read_u16()?,
            crc: reader.read_u32()?,
            length: reader.read_u32()?,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn wrap_envelope(payload: &[u8], crc: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(EnvelopeHeader::SIZE + payload.len());
    let mut writer = VecWriter::new(&mut out);
    EnvelopeHeader { version: VERSION, crc, length: payload.len() as u32 }
        .emit(&mut writer);
    writer.emit_raw_bytes(payload);
    out
}

// =============================================================================
// Serialization entry points
// =============================================================================

/// Serializes `value` into an enveloped byte vector with no checksum.
#[must_use]
pub fn serialize<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    serialize_with(value, &NoChecksum)
}

/// Serializes `value` into an enveloped byte vector, digesting the payload
/// with `checksum`.
#[must_use]
pub fn serialize_with<T, C>(value: &T, checksum: &C) -> Vec<u8>
where
    T: Encode + ?Sized,
    C: Checksum + ?Sized,
{
    let mut payload = Vec::with_capacity(DEFAULT_RESERVE);
    let mut writer = VecWriter::new(&mut payload);
    value.encode(&mut writer);
    let crc = checksum.digest(&payload);
    wrap_envelope(&payload, crc)
}

/// Serializes `value` through a caller-provided bounded scratch buffer.
///
/// The payload is written into `buffer` under the bounded-writer policy
/// (truncating silently at capacity), then the written prefix is wrapped
/// in an envelope. Size the buffer with [`get_size`](crate::get_size) to
/// avoid truncation.
#[must_use]
pub fn serialize_bounded<T, C>(
    buffer: &mut [u8],
    value: &T,
    checksum: &C,
) -> Vec<u8>
where
    T: Encode + ?Sized,
    C: Checksum + ?Sized,
{
    let mut writer = SliceWriter::new(buffer);
    value.encode(&mut writer);
    let length = writer.count();
    let payload = &buffer[..length];
    let crc = checksum.digest(payload);
    wrap_envelope(payload, crc)
}

/// Serializes `value`, passing the payload through `codec` before the
/// envelope is applied.
///
/// The checksum covers the transformed payload.
#[must_use]
pub fn serialize_codec<T, D, C>(value: &T, codec: &D, checksum: &C) -> Vec<u8>
where
    T: Encode + ?Sized,
    D: ByteCodec + ?Sized,
    C: Checksum + ?Sized,
{
    let mut raw = Vec::with_capacity(DEFAULT_RESERVE);
    let mut writer = VecWriter::new(&mut raw);
    value.encode(&mut writer);
    let payload = codec.encode(&raw);
    let crc = checksum.digest(&payload);
    wrap_envelope(&payload, crc)
}

// =============================================================================
// Deserialization entry points
// =============================================================================

fn validate_envelope<'a, R>(
    reader: &mut R,
    data: &'a [u8],
    checksum: &(impl Checksum + ?Sized),
) -> io::Result<&'a [u8]>
where
    R: Reader + ?Sized,
{
    let header = EnvelopeHeader::read(reader)?;
    if header.version != VERSION {
        tracing::debug!(
            expected = VERSION,
            observed = header.version,
            "refusing envelope with mismatched version"
        );
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "envelope version {:#06x} does not match {:#06x}",
                header.version, VERSION
            ),
        ));
    }
    let length = header.length as usize;
    if length > reader.remaining() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "envelope declares more payload bytes than the source holds",
        ));
    }
    let start = reader.count();
    let payload = &data[start..start + length];
    let crc = checksum.digest(payload);
    if crc != header.crc {
        tracing::debug!(
            expected = header.crc,
            observed = crc,
            "refusing envelope with mismatched checksum"
        );
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "payload checksum mismatch",
        ));
    }
    Ok(payload)
}

/// Deserializes an enveloped value, returning `T::default()` on any
/// failure.
#[must_use]
pub fn deserialize<T: Decode + Default>(data: &[u8]) -> T {
    deserialize_with(data, &NoChecksum)
}

/// Deserializes an enveloped value, verifying the payload with `checksum`
/// and returning `T::default()` on any failure.
#[must_use]
pub fn deserialize_with<T, C>(data: &[u8], checksum: &C) -> T
where
    T: Decode + Default,
    C: Checksum + ?Sized,
{
    try_deserialize_with(data, checksum).unwrap_or_default()
}

/// Deserializes from the first `length` bytes of `data` through a bounded
/// reader, returning `T::default()` on any failure.
#[must_use]
pub fn deserialize_bounded<T, C>(data: &[u8], length: usize, checksum: &C) -> T
where
    T: Decode + Default,
    C: Checksum + ?Sized,
{
    try_deserialize_bounded(data, length, checksum).unwrap_or_default()
}

/// Deserializes an enveloped value that was transformed by `codec`,
/// returning `T::default()` on any failure.
#[must_use]
pub fn deserialize_codec<T, D, C>(data: &[u8], codec: &D, checksum: &C) -> T
where
    T: Decode + Default,
    D: ByteCodec + ?Sized,
    C: Checksum + ?Sized,
{
    try_deserialize_codec(data, codec, checksum).unwrap_or_default()
}

/// Deserializes an enveloped value with no checksum, reporting failures.
///
/// # Errors
///
/// Returns an error if the envelope or the payload fails validation.
pub fn try_deserialize<T: Decode>(data: &[u8]) -> io::Result<T> {
    try_deserialize_with(data, &NoChecksum)
}

/// Deserializes an enveloped value, reporting failures.
///
/// # Errors
///
/// Returns an error if the version or checksum does not match, or if the
/// payload fails decoding.
pub fn try_deserialize_with<T, C>(data: &[u8], checksum: &C) -> io::Result<T>
where
    T: Decode,
    C: Checksum + ?Sized,
{
    let mut reader = SliceReader::new(data);
    validate_envelope(&mut reader, data, checksum)?;
    T::decode(&mut reader)
}

/// Deserializes from the first `length` bytes of `data` through a bounded
/// reader, reporting failures.
///
/// # Errors
///
/// Returns an error if the version or checksum does not match, or if the
/// payload fails decoding.
pub fn try_deserialize_bounded<T, C>(
    data: &[u8],
    length: usize,
    checksum: &C,
) -> io::Result<T>
where
    T: Decode,
    C: Checksum + ?Sized,
{
    let mut reader = BoundedReader::new(data, length);
    validate_envelope(&mut reader, data, checksum)?;
    T::decode(&mut reader)
}

/// Deserializes an enveloped value that was transformed by `codec`,
/// reporting failures.
///
/// # Errors
///
/// Returns an error if the version or checksum does not match, or if the
/// transformed payload fails decoding.
pub fn try_deserialize_codec<T, D, C>(
    data: &[u8],
    codec: &D,
    checksum: &C,
) -> io::Result<T>
where
    T: Decode,
    D: ByteCodec + ?Sized,
    C: Checksum + ?Sized,
{
    let mut reader = SliceReader::new(data);
    let payload = validate_envelope(&mut reader, data, checksum)?;
    let decoded = codec.decode(payload);
    let mut body = SliceReader::new(&decoded);
    T::decode(&mut body)
}
