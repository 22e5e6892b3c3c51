//! Byte-buffer abstractions: cursor-carrying writers and readers.
//!
//! Four buffers obey a uniform capability surface. On the write side,
//! [`VecWriter`] appends to a growing vector and [`SliceWriter`] fills a
//! fixed-capacity slice; on the read side, [`SliceReader`] walks the full
//! extent of a borrowed source and [`BoundedReader`] walks a fixed-length
//! prefix of one. Backing storage is owned by the caller and borrowed for
//! the duration of an operation; `reset` rebinds a buffer to a new source
//! or sink and zeroes the cursor.
//!
//! Writes never report failure: bounded sinks truncate silently, and
//! [`Writer::count`] reveals how far progress actually went. Reads of whole
//! scalars fail with [`std::io::ErrorKind::UnexpectedEof`] when fewer bytes
//! remain than the value needs.

use std::io;

fn eof(needed: usize, remaining: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("needed {needed} bytes but only {remaining} remain"),
    )
}

// =============================================================================
// Writer
// =============================================================================

/// A cursor-carrying byte sink.
///
/// Scalar writes are all-or-nothing: when a bounded sink cannot fit the
/// whole value, the write is dropped and the cursor does not advance. Raw
/// spans instead truncate at capacity. Callers that need transactional
/// behaviour size the sink with [`get_size`](crate::get_size) up front and
/// compare [`count`](Self::count) afterwards.
pub trait Writer {
    /// Appends raw bytes, truncating at capacity for bounded sinks.
    fn emit_raw_bytes(&mut self, bytes: &[u8]);

    /// Total bytes in the sink so far.
    fn count(&self) -> usize;

    /// Whether `len` more bytes fit in the sink.
    fn can_write(&self, len: usize) -> bool;

    /// Emits a single unsigned byte.
    fn emit_u8(&mut self, v: u8) {
        if self.can_write(1) {
            self.emit_raw_bytes(&[v]);
        }
    }

    /// Emits a 16-bit unsigned integer in host byte order.
    fn emit_u16(&mut self, v: u16) {
        if self.can_write(2) {
            self.emit_raw_bytes(&v.to_ne_bytes());
        }
    }

    /// Emits a 32-bit unsigned integer in host byte order.
    fn emit_u32(&mut self, v: u32) {
        if self.can_write(4) {
            self.emit_raw_bytes(&v.to_ne_bytes());
        }
    }

    /// Emits a 64-bit unsigned integer in host byte order.
    fn emit_u64(&mut self, v: u64) {
        if self.can_write(8) {
            self.emit_raw_bytes(&v.to_ne_bytes());
        }
    }

    /// Emits a platform-sized unsigned integer as 8 bytes.
    fn emit_usize(&mut self, v: usize) {
        self.emit_u64(v as u64);
    }

    /// Emits a single signed byte.
    #[allow(clippy::cast_sign_loss)]
    fn emit_i8(&mut self, v: i8) {
        self.emit_u8(v as u8);
    }

    /// Emits a 16-bit signed integer in host byte order.
    #[allow(clippy::cast_sign_loss)]
    fn emit_i16(&mut self, v: i16) {
        self.emit_u16(v as u16);
    }

    /// Emits a 32-bit signed integer in host byte order.
    #[allow(clippy::cast_sign_loss)]
    fn emit_i32(&mut self, v: i32) {
        self.emit_u32(v as u32);
    }

    /// Emits a 64-bit signed integer in host byte order.
    #[allow(clippy::cast_sign_loss)]
    fn emit_i64(&mut self, v: i64) {
        self.emit_u64(v as u64);
    }

    /// Emits a platform-sized signed integer as 8 bytes.
    fn emit_isize(&mut self, v: isize) {
        self.emit_i64(v as i64);
    }

    /// Emits a 32-bit float through its IEEE 754 bit pattern.
    fn emit_f32(&mut self, v: f32) {
        self.emit_u32(v.to_bits());
    }

    /// Emits a 64-bit float through its IEEE 754 bit pattern.
    fn emit_f64(&mut self, v: f64) {
        self.emit_u64(v.to_bits());
    }

    /// Emits a boolean as a single byte.
    fn emit_bool(&mut self, v: bool) {
        self.emit_u8(u8::from(v));
    }

    /// Emits a character as its 32-bit Unicode scalar value.
    fn emit_char(&mut self, v: char) {
        self.emit_u32(v as u32);
    }
}

// =============================================================================
// Reader
// =============================================================================

/// A cursor-carrying view over an immutable byte source.
///
/// The cursor advances monotonically under reads and [`skip`](Self::skip);
/// [`seek`](Self::seek) may move it backward.
pub trait Reader {
    /// Borrows up to `len` bytes from the source, advancing the cursor by
    /// the number actually taken.
    fn take_raw_bytes(&mut self, len: usize) -> &[u8];

    /// Bytes left between the cursor and the end of the source.
    fn remaining(&self) -> usize;

    /// Bytes consumed so far; equivalently, the cursor position.
    fn count(&self) -> usize;

    /// Advances the cursor by `len` bytes if that many remain.
    fn skip(&mut self, len: usize);

    /// Moves the cursor to `pos` if it lies within the source.
    fn seek(&mut self, pos: usize);

    /// Whether `len` more bytes remain.
    fn can_read(&self, len: usize) -> bool {
        self.remaining() >= len
    }

    /// Copies up to `len` bytes out of the source.
    fn read_bytes(&mut self, len: usize) -> Vec<u8> {
        self.take_raw_bytes(len).to_vec()
    }

    /// Reads a single unsigned byte.
    fn read_u8(&mut self) -> io::Result<u8> {
        if !self.can_read(1) {
            return Err(eof(1, self.remaining()));
        }
        Ok(self.take_raw_bytes(1)[0])
    }

    /// Reads a 16-bit unsigned integer in host byte order.
    fn read_u16(&mut self) -> io::Result<u16> {
        if !self.can_read(2) {
            return Err(eof(2, self.remaining()));
        }
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.take_raw_bytes(2));
        Ok(u16::from_ne_bytes(buf))
    }

    /// Reads a 32-bit unsigned integer in host byte order.
    fn read_u32(&mut self) -> io::Result<u32> {
        if !self.can_read(4) {
            return Err(eof(4, self.remaining()));
        }
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take_raw_bytes(4));
        Ok(u32::from_ne_bytes(buf))
    }

    /// Reads a 64-bit unsigned integer in host byte order.
    fn read_u64(&mut self) -> io::Result<u64> {
        if !self.can_read(8) {
            return Err(eof(8, self.remaining()));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take_raw_bytes(8));
        Ok(u64::from_ne_bytes(buf))
    }

    /// Reads a platform-sized unsigned integer from 8 bytes.
    fn read_usize(&mut self) -> io::Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "value out of range for usize on this platform",
            )
        })
    }

    /// Reads a single signed byte.
    #[allow(clippy::cast_possible_wrap)]
    fn read_i8(&mut self) -> io::Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a 16-bit signed integer in host byte order.
    #[allow(clippy::cast_possible_wrap)]
    fn read_i16(&mut self) -> io::Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Reads a 32-bit signed integer in host byte order.
    #[allow(clippy::cast_possible_wrap)]
    fn read_i32(&mut self) -> io::Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a 64-bit signed integer in host byte order.
    #[allow(clippy::cast_possible_wrap)]
    fn read_i64(&mut self) -> io::Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Reads a platform-sized signed integer from 8 bytes.
    fn read_isize(&mut self) -> io::Result<isize> {
        let value = self.read_i64()?;
        isize::try_from(value).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "value out of range for isize on this platform",
            )
        })
    }

    /// Reads a 32-bit float from its IEEE 754 bit pattern.
    fn read_f32(&mut self) -> io::Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a 64-bit float from its IEEE 754 bit pattern.
    fn read_f64(&mut self) -> io::Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a boolean from a single byte; any non-zero value is `true`.
    fn read_bool(&mut self) -> io::Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a character from its 32-bit Unicode scalar value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid Unicode scalar value.
    fn read_char(&mut self) -> io::Result<char> {
        let code = self.read_u32()?;
        char::from_u32(code).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid Unicode scalar value: {code}"),
            )
        })
    }
}

// =============================================================================
// Writer implementations
// =============================================================================

/// An append-only writer over a growing byte vector.
///
/// Capacity is delegated to the vector, so every write fits.
#[derive(Debug)]
pub struct VecWriter<'a> {
    data: &'a mut Vec<u8>,
}

impl<'a> VecWriter<'a> {
    /// Creates a writer appending to `data`.
    #[must_use]
    pub fn new(data: &'a mut Vec<u8>) -> Self {
        Self { data }
    }

    /// Rebinds the writer to a different sink.
    pub fn reset(&mut self, data: &'a mut Vec<u8>) {
        self.data = data;
    }
}

impl Writer for VecWriter<'_> {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn count(&self) -> usize {
        self.data.len()
    }

    fn can_write(&self, _len: usize) -> bool {
        true
    }
}

/// A bounded writer over a fixed-capacity byte slice.
///
/// Writes past capacity are silently dropped or truncated; the cursor stops
/// at the end of the slice.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    /// Creates a writer filling `data` from the front.
    #[must_use]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Unwritten capacity left in the sink.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Rebinds the writer to a different sink and zeroes the cursor.
    pub fn reset(&mut self, data: &'a mut [u8]) {
        self.pos = 0;
        self.data = data;
    }
}

impl Writer for SliceWriter<'_> {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) {
        let copy_len = bytes.len().min(self.remaining());
        if copy_len > 0 {
            self.data[self.pos..self.pos + copy_len]
                .copy_from_slice(&bytes[..copy_len]);
            self.pos += copy_len;
        }
    }

    fn count(&self) -> usize {
        self.pos
    }

    fn can_write(&self, len: usize) -> bool {
        self.remaining() >= len
    }
}

// =============================================================================
// Reader implementations
// =============================================================================

/// A reader over the full extent of a borrowed byte source.
#[derive(Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Creates a reader at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Rebinds the reader to a different source and zeroes the cursor.
    pub fn reset(&mut self, data: &'a [u8]) {
        self.pos = 0;
        self.data = data;
    }
}

impl Reader for SliceReader<'_> {
    fn take_raw_bytes(&mut self, len: usize) -> &[u8] {
        let available = len.min(self.data.len() - self.pos);
        let bytes = &self.data[self.pos..self.pos + available];
        self.pos += available;
        bytes
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn count(&self) -> usize {
        self.pos
    }

    fn skip(&mut self, len: usize) {
        if self.remaining() >= len {
            self.pos += len;
        }
    }

    fn seek(&mut self, pos: usize) {
        if pos <= self.data.len() {
            self.pos = pos;
        }
    }
}

/// A reader over a fixed-length prefix of a byte source.
///
/// The declared length caps every read, independent of how much data the
/// underlying slice holds.
#[derive(Debug)]
pub struct BoundedReader<'a> {
    data: &'a [u8],
    len: usize,
    pos: usize,
}

impl<'a> BoundedReader<'a> {
    /// Creates a reader over the first `len` bytes of `data`.
    ///
    /// The bound is clamped to the slice length.
    #[must_use]
    pub fn new(data: &'a [u8], len: usize) -> Self {
        Self { data, len: len.min(data.len()), pos: 0 }
    }

    /// Rebinds the reader to a different source and zeroes the cursor.
    pub fn reset(&mut self, data: &'a [u8], len: usize) {
        self.pos = 0;
        self.len = len.min(data.len());
        self.data = data;
    }
}

impl Reader for BoundedReader<'_> {
    fn take_raw_bytes(&mut self, len: usize) -> &[u8] {
        let available = len.min(self.len - self.pos);
        let bytes = &self.data[self.pos..self.pos + available];
        self.pos += available;
        bytes
    }

    fn remaining(&self) -> usize {
        self.len - self.pos
    }

    fn count(&self) -> usize {
        self.pos
    }

    fn skip(&mut self, len: usize) {
        if self.remaining() >= len {
            self.pos += len;
        }
    }

    fn seek(&mut self, pos: usize) {
        if pos <= self.len {
            self.pos = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_writer_appends() {
        let mut data = Vec::new();
        let mut writer = VecWriter::new(&mut data);
        writer.emit_u8(0xAB);
        writer.emit_u32(0xDEAD_BEEF);
        writer.emit_raw_bytes(&[1, 2, 3]);
        assert_eq!(writer.count(), 8);
        assert!(writer.can_write(usize::MAX));
        assert_eq!(&data[5..], &[1, 2, 3]);
    }

    #[test]
    fn test_slice_writer_scalar_is_all_or_nothing() {
        let mut buf = [0u8; 6];
        let mut writer = SliceWriter::new(&mut buf);
        writer.emit_u32(1);
        // Only two bytes remain, so the whole write is dropped.
        writer.emit_u32(2);
        assert_eq!(writer.count(), 4);
        assert_eq!(writer.remaining(), 2);
    }

    #[test]
    fn test_slice_writer_span_truncates() {
        let mut buf = [0u8; 4];
        let mut writer = SliceWriter::new(&mut buf);
        writer.emit_raw_bytes(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(writer.count(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_reader_cursor_ops() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut reader = SliceReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        reader.skip(3);
        assert_eq!(reader.count(), 4);
        assert_eq!(reader.remaining(), 4);
        reader.seek(0);
        assert_eq!(reader.read_u8().unwrap(), 1);
        // Seeking past the end leaves the cursor alone.
        reader.seek(9);
        assert_eq!(reader.count(), 1);
        // Seeking to the end is allowed.
        reader.seek(8);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_short_scalar_fails_without_advancing() {
        let data = [1u8, 2];
        let mut reader = SliceReader::new(&data);
        assert!(reader.read_u32().is_err());
        assert_eq!(reader.count(), 0);
        assert_eq!(reader.read_u16().unwrap(), u16::from_ne_bytes([1, 2]));
    }

    #[test]
    fn test_read_bytes_returns_available_prefix() {
        let data = [1u8, 2, 3];
        let mut reader = SliceReader::new(&data);
        assert_eq!(reader.read_bytes(8), vec![1, 2, 3]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_bounded_reader_stops_at_declared_length() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut reader = BoundedReader::new(&data, 4);
        assert_eq!(reader.remaining(), 4);
        assert_eq!(reader.read_u32().unwrap(), u32::from_ne_bytes([1, 2, 3, 4]));
        assert!(reader.read_u8().is_err());
        assert_eq!(reader.read_bytes(4), Vec::<u8>::new());
    }

    #[test]
    fn test_reader_reset_rebinds_and_zeroes() {
        let first = [1u8, 2];
        let second = [9u8, 8, 7, 6];
        let mut reader = SliceReader::new(&first);
        reader.skip(2);
        reader.reset(&second);
        assert_eq!(reader.count(), 0);
        assert_eq!(reader.remaining(), 4);
        assert_eq!(reader.read_u8().unwrap(), 9);
    }

    #[test]
    fn test_writer_reset_rebinds() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        {
            let mut writer = VecWriter::new(&mut first);
            writer.emit_u8(1);
            writer.reset(&mut second);
            writer.emit_u8(2);
        }
        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![2]);
    }
}
