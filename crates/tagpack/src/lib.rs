//! Self-describing binary serialization with tolerant type tags.
//!
//! This crate maps structured in-memory values to a compact byte stream
//! that carries enough type metadata to round-trip tolerantly and to
//! substitute containers on decode.
//!
//! # Wire format
//!
//! Fixed-width numerics travel as raw bytes in host order. Every other
//! value is preceded by a five-byte [`DataHeader`] whose type byte packs a
//! [`Kind`] into each nibble: the main category in the low nibble and,
//! where meaningful, a sub category in the high nibble (the element
//! category of a container, or the active alternative of a variant). The
//! outermost [`serialize`] call prepends a ten-byte [`EnvelopeHeader`]
//! carrying the format version, a checksum of the payload, and the payload
//! length.
//!
//! Because the decoder dispatches on the *target* type and validates wire
//! tags against it, a sequence encoded from one container decodes into any
//! other sequence container with a compatible element category:
//!
//! ```
//! use std::collections::VecDeque;
//!
//! let encoded = tagpack::serialize(&vec![1i32, 2, 3, 4]);
//! let decoded: VecDeque<i32> = tagpack::deserialize(&encoded);
//! assert_eq!(decoded, VecDeque::from([1, 2, 3, 4]));
//! ```
//!
//! # Failure model
//!
//! Decode failures are soft at the top level: [`deserialize`] returns the
//! default value of the requested type when a header, version, checksum,
//! or element count fails validation. The `try_` family reports the same
//! failures as [`std::io::Error`] values. Writes through bounded buffers
//! truncate silently; [`Writer::count`] reveals actual progress.
//!
//! # User aggregates
//!
//! A type becomes serializable by implementing [`Encode`] (the encode hook
//! plus an exact size hook) and [`Decode`] (the decode hook), most
//! conveniently through the derive macros re-exported at the crate root:
//!
//! ```
//! use tagpack::{Decode, Encode};
//!
//! #[derive(Debug, PartialEq, Default, Encode, Decode)]
//! struct Endpoint {
//!     host: String,
//!     port: u16,
//! }
//!
//! let value = Endpoint { host: "localhost".to_owned(), port: 8080 };
//! let bytes = tagpack::serialize(&value);
//! assert_eq!(tagpack::get_size(&value), bytes.len() - 10);
//! assert_eq!(tagpack::deserialize::<Endpoint>(&bytes), value);
//! ```
//!
//! Derived structs serialize as headerless field sequences (the *custom*
//! category); derived enums use the tagged *variant* format. Trivially
//! copyable aggregates can instead travel as raw bytes via
//! [`impl_pod!`].

// Allow derive macros to reference this crate as `tagpack` internally.
extern crate self as tagpack;

pub mod buffer;
pub mod checksum;
pub mod codec;
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod kind;
pub mod pod;

pub use buffer::{
    BoundedReader, Reader, SliceReader, SliceWriter, VecWriter, Writer,
};
pub use checksum::{Checksum, Crc16, Crc32, Crc8, NoChecksum};
pub use codec::{ByteCodec, IdentityCodec};
pub use decode::{AssocInsert, Decode, SeqInsert};
pub use encode::{get_size, Encode, IterSeq};
pub use envelope::{
    deserialize, deserialize_bounded, deserialize_codec, deserialize_with,
    serialize, serialize_bounded, serialize_codec, serialize_with,
    try_deserialize, try_deserialize_bounded, try_deserialize_codec,
    try_deserialize_with, EnvelopeHeader, VERSION, VERSION_MAJOR,
    VERSION_MINOR,
};
pub use kind::{DataHeader, Kind};
pub use pod::Pod;
// Re-export the derive macros.
pub use tagpack_derive::{Decode, Encode};
