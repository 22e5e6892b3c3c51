//! Raw-byte serialization for trivially-copyable aggregates.
//!
//! A pod aggregate travels as a header carrying its byte width followed by
//! its in-memory bytes in host layout. Types opt in through the unsafe
//! [`Pod`] marker, most conveniently via the [`impl_pod!`](crate::impl_pod)
//! macro.

use std::{io, mem::size_of, slice};

use crate::{
    buffer::{Reader, Writer},
    kind::{DataHeader, Kind},
};

/// Aggregates that may travel as their in-memory bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` with no padding, contain no pointers
/// or references, and be valid for every bit pattern of their size.
/// Violating this makes [`encode_pod`] read uninitialized bytes or
/// [`decode_pod`] build invalid values.
pub unsafe trait Pod: Copy + Sized + 'static {}

fn bytes_of<T: Pod>(value: &T) -> &[u8] {
    // SAFETY: Pod implementors guarantee a padding-free plain-data layout.
    unsafe {
        slice::from_raw_parts((value as *const T).cast::<u8>(), size_of::<T>())
    }
}

/// Emits a pod header followed by the aggregate's raw bytes.
pub fn encode_pod<W, T>(writer: &mut W, value: &T)
where
    W: Writer + ?Sized,
    T: Pod,
{
    #[allow(clippy::cast_possible_truncation)]
    DataHeader::new(Kind::Pod, size_of::<T>() as u32).emit(writer);
    writer.emit_raw_bytes(bytes_of(value));
}

/// Reads a pod header and materializes the aggregate from raw bytes.
///
/// # Errors
///
/// Returns an error if the header is not a pod header, declares fewer
/// bytes than the aggregate's static width, or the source runs short.
pub fn decode_pod<R, T>(reader: &mut R) -> io::Result<T>
where
    R: Reader + ?Sized,
    T: Pod,
{
    let header = DataHeader::read(reader)?.expect_main(Kind::Pod)?;
    if (header.length as usize) < size_of::<T>() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "pod header declares {} bytes but {} are required",
                header.length,
                size_of::<T>()
            ),
        ));
    }
    if !reader.can_read(size_of::<T>()) {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "pod body extends past the end of the source",
        ));
    }
    let bytes = reader.take_raw_bytes(size_of::<T>());
    // SAFETY: The length was checked above and Pod implementors accept any
    // bit pattern.
    Ok(unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast::<T>()) })
}

/// Implements the serialization traits for trivially-copyable aggregates.
///
/// Each listed type travels as a pod header followed by its in-memory
/// bytes. Invoking the macro asserts the layout contract of [`Pod`] for
/// every listed type: `#[repr(C)]`, no padding, no pointers, valid for any
/// bit pattern.
#[macro_export]
macro_rules! impl_pod {
    ($($ty:ty),+ $(,)?) => {$(
        unsafe impl $crate::pod::Pod for $ty {}

        impl $crate::encode::Encode for $ty {
            const KIND: $crate::kind::Kind = $crate::kind::Kind::Pod;

            fn encode<W: $crate::buffer::Writer + ?Sized>(
                &self,
                writer: &mut W,
            ) {
                $crate::pod::encode_pod(writer, self);
            }

            fn byte_size(&self) -> usize {
                $crate::kind::DataHeader::SIZE + ::std::mem::size_of::<$ty>()
            }
        }

        impl $crate::decode::Decode for $ty {
            const KIND: $crate::kind::Kind = $crate::kind::Kind::Pod;

            fn decode<R: $crate::buffer::Reader + ?Sized>(
                reader: &mut R,
            ) -> ::std::io::Result<Self> {
                $crate::pod::decode_pod(reader)
            }
        }
    )+};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{SliceReader, VecWriter};

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    #[repr(C)]
    struct Extent {
        offset: u32,
        length: u32,
    }

    unsafe impl Pod for Extent {}

    #[test]
    fn test_pod_roundtrip() {
        let value = Extent { offset: 0x1000, length: 512 };

        let mut data = Vec::new();
        let mut writer = VecWriter::new(&mut data);
        encode_pod(&mut writer, &value);
        assert_eq!(data.len(), DataHeader::SIZE + size_of::<Extent>());

        let mut reader = SliceReader::new(&data);
        let decoded: Extent = decode_pod(&mut reader).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_pod_narrow_header_is_rejected() {
        let value = 7u16;

        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        #[repr(C)]
        struct Narrow {
            v: u16,
        }
        unsafe impl Pod for Narrow {}

        let mut data = Vec::new();
        let mut writer = VecWriter::new(&mut data);
        encode_pod(&mut writer, &Narrow { v: value });

        // The decoded aggregate is wider than the two bytes on the wire.
        let mut reader = SliceReader::new(&data);
        assert!(decode_pod::<_, Extent>(&mut reader).is_err());
    }
}
