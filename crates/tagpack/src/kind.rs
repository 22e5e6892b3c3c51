//! Wire categories and the tagged data header.
//!
//! Every value on the wire belongs to one of fourteen categories. The
//! fixed-width numeric categories (`Byte8` through `Float64`) travel as raw
//! bytes with no prefix; everything else is preceded by a five-byte
//! [`DataHeader`] whose type byte packs a [`Kind`] into each nibble: the
//! *main* category in the low nibble and, where meaningful, a *sub*
//! category in the high nibble (the element category of a container, or the
//! active alternative of a variant).

use std::io;

use crate::buffer::{Reader, Writer};

/// The wire category of an encoded value.
///
/// The numeric categories form an ordered prefix (`Byte8` < `Byte16` <
/// `Byte32` < `Byte64` < `Float32` < `Float64`) that the
/// [subtype-compatibility rule](Kind::accepts) is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Reserved / unused.
    Empty = 0,
    /// 1-byte integer.
    Byte8 = 1,
    /// 2-byte integer.
    Byte16 = 2,
    /// 4-byte integer.
    Byte32 = 3,
    /// 8-byte integer.
    Byte64 = 4,
    /// IEEE-754 single-precision float.
    Float32 = 5,
    /// IEEE-754 double-precision float.
    Float64 = 6,
    /// Trivially-copyable compound aggregate.
    Pod = 7,
    /// Two-element heterogeneous product.
    Pair = 8,
    /// Tagged discriminated union.
    Variant = 9,
    /// N-element heterogeneous product.
    Tuple = 10,
    /// Ordered homogeneous sequence.
    Seq = 11,
    /// Keyed or set-like homogeneous container.
    Assoc = 12,
    /// User-defined aggregate serialized through its own hooks.
    Custom = 13,
}

impl Kind {
    /// Decodes a nibble into a category, if it names one.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Empty,
            1 => Self::Byte8,
            2 => Self::Byte16,
            3 => Self::Byte32,
            4 => Self::Byte64,
            5 => Self::Float32,
            6 => Self::Float64,
            7 => Self::Pod,
            8 => Self::Pair,
            9 => Self::Variant,
            10 => Self::Tuple,
            11 => Self::Seq,
            12 => Self::Assoc,
            13 => Self::Custom,
            _ => return None,
        })
    }

    /// Returns `true` for the fixed-width numeric categories.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        (self as u8) >= (Self::Byte8 as u8)
            && (self as u8) <= (Self::Float64 as u8)
    }

    /// Byte width of a fixed-width numeric category, `None` otherwise.
    #[must_use]
    pub const fn scalar_width(self) -> Option<usize> {
        match self {
            Self::Byte8 => Some(1),
            Self::Byte16 => Some(2),
            Self::Byte32 | Self::Float32 => Some(4),
            Self::Byte64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// The subtype-compatibility rule.
    ///
    /// A slot declared with category `self` accepts a wire sub-category
    /// `wire` when both lie in the numeric prefix and `wire >= self`, or
    /// when the two categories are exactly equal.
    #[must_use]
    pub const fn accepts(self, wire: Self) -> bool {
        if self.is_scalar() && wire.is_scalar() {
            wire as u8 >= self as u8
        } else {
            wire as u8 == self as u8
        }
    }
}

/// The five-byte header preceding every non-primitive encoded value.
///
/// `length` holds the element count for containers, tuples, pairs, and
/// variants, and the byte width for pod aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    ty: u8,
    /// Element count, or byte width for pod aggregates.
    pub length: u32,
}

impl DataHeader {
    /// Encoded width of the header: one type byte plus a 4-byte length.
    pub const SIZE: usize = 5;

    /// Creates a header with the given main category and an empty sub
    /// nibble.
    #[must_use]
    pub const fn new(main: Kind, length: u32) -> Self {
        Self { ty: main as u8, length }
    }

    /// Creates a header carrying both category nibbles.
    #[must_use]
    pub const fn with_sub(main: Kind, sub: Kind, length: u32) -> Self {
        Self { ty: (main as u8) | ((sub as u8) << 4), length }
    }

    /// The main category, decoded from the low nibble.
    ///
    /// # Errors
    ///
    /// Returns an error if the nibble does not name a category.
    pub fn main(self) -> io::Result<Kind> {
        Kind::from_raw(self.ty & 0x0F).ok_or_else(|| unknown_kind(self.ty & 0x0F))
    }

    /// The sub category, decoded from the high nibble.
    ///
    /// # Errors
    ///
    /// Returns an error if the nibble does not name a category.
    pub fn sub(self) -> io::Result<Kind> {
        Kind::from_raw(self.ty >> 4).ok_or_else(|| unknown_kind(self.ty >> 4))
    }

    /// Errors unless the main category matches `expected`.
    pub fn expect_main(self, expected: Kind) -> io::Result<Self> {
        let observed = self.main()?;
        if observed == expected {
            Ok(self)
        } else {
            tracing::debug!(?expected, ?observed, "header category mismatch");
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "expected a {expected:?} header but found {observed:?}"
                ),
            ))
        }
    }

    /// Writes the header fields in wire order.
    ///
    /// Like any scalar write, the header is all-or-nothing on bounded
    /// sinks.
    pub fn emit<W: Writer + ?Sized>(self, writer: &mut W) {
        if writer.can_write(Self::SIZE) {
            writer.emit_u8(self.ty);
            writer.emit_u32(self.length);
        }
    }

    /// Reads the header fields in wire order.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than [`Self::SIZE`] bytes remain.
    pub fn read<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let ty = reader.read_u8()?;
        let length = reader.read_u32()?;
        Ok(Self { ty, length })
    }
}

fn unknown_kind(raw: u8) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("nibble {raw:#x} does not name a wire category"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{SliceReader, VecWriter};

    #[test]
    fn test_nibble_packing() {
        let header = DataHeader::with_sub(Kind::Seq, Kind::Byte32, 4);
        assert_eq!(header.main().unwrap(), Kind::Seq);
        assert_eq!(header.sub().unwrap(), Kind::Byte32);
        assert_eq!(header.length, 4);
    }

    #[test]
    fn test_header_wire_roundtrip() {
        let mut data = Vec::new();
        let mut writer = VecWriter::new(&mut data);
        DataHeader::with_sub(Kind::Assoc, Kind::Pair, 3).emit(&mut writer);
        assert_eq!(data.len(), DataHeader::SIZE);

        let mut reader = SliceReader::new(&data);
        let header = DataHeader::read(&mut reader).unwrap();
        assert_eq!(header.main().unwrap(), Kind::Assoc);
        assert_eq!(header.sub().unwrap(), Kind::Pair);
        assert_eq!(header.length, 3);
    }

    #[test]
    fn test_scalar_prefix_compatibility() {
        // A wider wire element decodes into the declared slot; the reverse
        // direction is refused.
        assert!(Kind::Byte8.accepts(Kind::Byte64));
        assert!(Kind::Byte32.accepts(Kind::Byte32));
        assert!(Kind::Byte32.accepts(Kind::Float64));
        assert!(!Kind::Byte64.accepts(Kind::Byte8));
        assert!(!Kind::Float64.accepts(Kind::Byte32));
    }

    #[test]
    fn test_compound_compatibility_is_exact() {
        assert!(Kind::Seq.accepts(Kind::Seq));
        assert!(!Kind::Seq.accepts(Kind::Assoc));
        assert!(!Kind::Pair.accepts(Kind::Tuple));
        assert!(!Kind::Byte8.accepts(Kind::Pod));
        assert!(!Kind::Pod.accepts(Kind::Byte8));
    }

    #[test]
    fn test_unknown_nibble_is_rejected() {
        assert!(Kind::from_raw(14).is_none());
        assert!(Kind::from_raw(15).is_none());

        let header = DataHeader { ty: 0x0E, length: 0 };
        assert!(header.main().is_err());
    }
}
