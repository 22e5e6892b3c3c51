//! Decoding: mirrors the encoder, validating tags against the target's
//! static category.
//!
//! [`Decode`] reads the header a category expects, checks it against the
//! target type, and materializes the value. Containers are rebuilt through
//! the [`SeqInsert`] and [`AssocInsert`] capabilities, which is what makes
//! cross-container substitution work: any sequence on the wire decodes
//! into any sequence container whose element category is compatible, and
//! likewise for associative containers.
//!
//! Failures are reported as [`std::io::Error`]; the soft top-level surface
//! in [`envelope`](crate::envelope) maps them to default values.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    hash::{BuildHasher, Hash},
    io,
    rc::Rc,
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    buffer::Reader,
    kind::{DataHeader, Kind},
};

/// A trait for values that can rebuild themselves from tagged bytes.
pub trait Decode: Sized {
    /// The wire category this type is classified as.
    const KIND: Kind;

    /// Decodes a value from the provided reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a header fails validation or the source runs
    /// short.
    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self>;
}

// =============================================================================
// Container rebuild capabilities
// =============================================================================

/// Back- or front-insertion capability used to rebuild sequences.
///
/// Implementors append decoded elements in wire order through whichever
/// insertion end they support.
pub trait SeqInsert: Default {
    /// The element type inserted into the container.
    type Item;

    /// Pre-allocates room for `extra` further elements where supported.
    fn reserve_items(&mut self, extra: usize) {
        let _ = extra;
    }

    /// Inserts one decoded element.
    fn insert_item(&mut self, item: Self::Item);
}

/// Keyed or value insertion capability used to rebuild associative
/// containers.
pub trait AssocInsert: Default {
    /// The element type inserted into the container.
    type Item;

    /// Inserts one decoded element through the keyed entry point.
    fn insert_item(&mut self, item: Self::Item);
}

impl<T> SeqInsert for Vec<T> {
    type Item = T;

    fn reserve_items(&mut self, extra: usize) {
        self.reserve(extra);
    }

    fn insert_item(&mut self, item: T) {
        self.push(item);
    }
}

impl<T> SeqInsert for VecDeque<T> {
    type Item = T;

    fn reserve_items(&mut self, extra: usize) {
        self.reserve(extra);
    }

    fn insert_item(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<T> SeqInsert for LinkedList<T> {
    type Item = T;

    fn insert_item(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<K, V, S> AssocInsert for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    type Item = (K, V);

    fn insert_item(&mut self, (key, value): (K, V)) {
        self.insert(key, value);
    }
}

impl<K: Ord, V> AssocInsert for BTreeMap<K, V> {
    type Item = (K, V);

    fn insert_item(&mut self, (key, value): (K, V)) {
        self.insert(key, value);
    }
}

impl<T, S> AssocInsert for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    type Item = T;

    fn insert_item(&mut self, item: T) {
        self.insert(item);
    }
}

impl<T: Ord> AssocInsert for BTreeSet<T> {
    type Item = T;

    fn insert_item(&mut self, item: T) {
        self.insert(item);
    }
}

impl<K, V, S> AssocInsert for DashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default + Clone,
{
    type Item = (K, V);

    fn insert_item(&mut self, (key, value): (K, V)) {
        self.insert(key, value);
    }
}

// =============================================================================
// Shared decoding helpers
// =============================================================================

/// Errors unless the variant header's sub category names the selected
/// alternative's category.
pub fn expect_alternative(observed: Kind, expected: Kind) -> io::Result<()> {
    if observed == expected {
        Ok(())
    } else {
        tracing::debug!(?expected, ?observed, "variant alternative mismatch");
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "variant alternative encoded as {observed:?} but the \
                 selected alternative is {expected:?}"
            ),
        ))
    }
}

fn invalid_length(what: &str, expected: usize, observed: u32) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{what} header declares {observed} elements, expected {expected}"),
    )
}

fn incompatible_element(target: Kind, wire: Kind) -> io::Error {
    tracing::debug!(?target, ?wire, "container element mismatch");
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "container of {wire:?} elements cannot fill a container of \
             {target:?} elements"
        ),
    )
}

/// Reads a container header and rebuilds the target element by element.
fn decode_container<R, C, T>(
    reader: &mut R,
    main: Kind,
    reserve: impl FnOnce(&mut C, usize),
    insert: impl Fn(&mut C, T),
) -> io::Result<C>
where
    R: Reader + ?Sized,
    C: Default,
    T: Decode,
{
    let header = DataHeader::read(reader)?.expect_main(main)?;
    let sub = header.sub()?;
    if !T::KIND.accepts(sub) {
        return Err(incompatible_element(T::KIND, sub));
    }
    let mut container = C::default();
    reserve(&mut container, header.length as usize);
    for _ in 0..header.length {
        insert(&mut container, T::decode(reader)?);
    }
    Ok(container)
}

/// Rebuilds a sequence container through its insertion capability.
pub(crate) fn decode_seq<R, C>(reader: &mut R) -> io::Result<C>
where
    R: Reader + ?Sized,
    C: SeqInsert,
    C::Item: Decode,
{
    decode_container(reader, Kind::Seq, C::reserve_items, C::insert_item)
}

/// Rebuilds an associative container through its keyed insertion
/// capability.
pub(crate) fn decode_assoc<R, C>(reader: &mut R) -> io::Result<C>
where
    R: Reader + ?Sized,
    C: AssocInsert,
    C::Item: Decode,
{
    decode_container(reader, Kind::Assoc, |_, _| (), C::insert_item)
}

// =============================================================================
// Implementations for primitive scalars
// =============================================================================

impl Decode for u8 {
    const KIND: Kind = Kind::Byte8;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u8()
    }
}

impl Decode for u16 {
    const KIND: Kind = Kind::Byte16;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u16()
    }
}

impl Decode for u32 {
    const KIND: Kind = Kind::Byte32;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u32()
    }
}

impl Decode for u64 {
    const KIND: Kind = Kind::Byte64;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u64()
    }
}

impl Decode for usize {
    const KIND: Kind = Kind::Byte64;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_usize()
    }
}

impl Decode for i8 {
    const KIND: Kind = Kind::Byte8;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_i8()
    }
}

impl Decode for i16 {
    const KIND: Kind = Kind::Byte16;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_i16()
    }
}

impl Decode for i32 {
    const KIND: Kind = Kind::Byte32;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_i32()
    }
}

impl Decode for i64 {
    const KIND: Kind = Kind::Byte64;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_i64()
    }
}

impl Decode for isize {
    const KIND: Kind = Kind::Byte64;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_isize()
    }
}

impl Decode for f32 {
    const KIND: Kind = Kind::Float32;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_f32()
    }
}

impl Decode for f64 {
    const KIND: Kind = Kind::Float64;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_f64()
    }
}

impl Decode for bool {
    const KIND: Kind = Kind::Byte8;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_bool()
    }
}

impl Decode for char {
    const KIND: Kind = Kind::Byte32;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_char()
    }
}

// =============================================================================
// Implementations for strings
// =============================================================================

impl Decode for String {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = DataHeader::read(reader)?.expect_main(Kind::Seq)?;
        let sub = header.sub()?;
        if !Kind::Byte8.accepts(sub) {
            return Err(incompatible_element(Kind::Byte8, sub));
        }
        let len = header.length as usize;
        let bytes = reader.read_bytes(len);
        if bytes.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "string body extends past the end of the source",
            ));
        }
        Self::from_utf8(bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {e}"),
            )
        })
    }
}

// =============================================================================
// Implementations for smart pointers
// =============================================================================

impl<T: Decode> Decode for Box<T> {
    const KIND: Kind = T::KIND;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self::new(T::decode(reader)?))
    }
}

impl<T: Decode> Decode for Rc<T> {
    const KIND: Kind = T::KIND;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self::new(T::decode(reader)?))
    }
}

impl<T: Decode> Decode for Arc<T> {
    const KIND: Kind = T::KIND;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self::new(T::decode(reader)?))
    }
}

impl<T: Decode> Decode for Box<[T]> {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Vec::<T>::decode(reader)?.into_boxed_slice())
    }
}

impl Decode for Box<str> {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(String::decode(reader)?.into_boxed_str())
    }
}

impl<T: ToOwned + ?Sized> Decode for Cow<'_, T>
where
    T::Owned: Decode,
{
    const KIND: Kind = <T::Owned as Decode>::KIND;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Cow::Owned(T::Owned::decode(reader)?))
    }
}

// =============================================================================
// Implementations for pairs and tuples
// =============================================================================

impl<A: Decode, B: Decode> Decode for (A, B) {
    const KIND: Kind = Kind::Pair;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = DataHeader::read(reader)?.expect_main(Kind::Pair)?;
        if header.length != 2 {
            return Err(invalid_length("pair", 2, header.length));
        }
        Ok((A::decode(reader)?, B::decode(reader)?))
    }
}

macro_rules! impl_decode_tuple {
    ($arity:literal => $($name:ident),+) => {
        impl<$($name: Decode),+> Decode for ($($name,)+) {
            const KIND: Kind = Kind::Tuple;

            fn decode<R: Reader + ?Sized>(
                reader: &mut R,
            ) -> io::Result<Self> {
                let header =
                    DataHeader::read(reader)?.expect_main(Kind::Tuple)?;
                if header.length != $arity {
                    return Err(invalid_length(
                        "tuple",
                        $arity,
                        header.length,
                    ));
                }
                Ok(($($name::decode(reader)?,)+))
            }
        }
    };
}

impl_decode_tuple!(1 => A);
impl_decode_tuple!(3 => A, B, C);
impl_decode_tuple!(4 => A, B, C, D);
impl_decode_tuple!(5 => A, B, C, D, E);
impl_decode_tuple!(6 => A, B, C, D, E, F);
impl_decode_tuple!(7 => A, B, C, D, E, F, G);
impl_decode_tuple!(8 => A, B, C, D, E, F, G, H);
impl_decode_tuple!(9 => A, B, C, D, E, F, G, H, I);
impl_decode_tuple!(10 => A, B, C, D, E, F, G, H, I, J);
impl_decode_tuple!(11 => A, B, C, D, E, F, G, H, I, J, K);
impl_decode_tuple!(12 => A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Implementations for variants
// =============================================================================

impl<T: Decode> Decode for Option<T> {
    const KIND: Kind = Kind::Variant;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = DataHeader::read(reader)?.expect_main(Kind::Variant)?;
        if header.length != 2 {
            return Err(invalid_length("variant", 2, header.length));
        }
        let sub = header.sub()?;
        match reader.read_u32()? {
            0 => {
                expect_alternative(sub, Kind::Empty)?;
                Ok(None)
            }
            1 => {
                expect_alternative(sub, T::KIND)?;
                Ok(Some(T::decode(reader)?))
            }
            index => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("variant discriminator {index} is out of range"),
            )),
        }
    }
}

impl<T: Decode, E: Decode> Decode for Result<T, E> {
    const KIND: Kind = Kind::Variant;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = DataHeader::read(reader)?.expect_main(Kind::Variant)?;
        if header.length != 2 {
            return Err(invalid_length("variant", 2, header.length));
        }
        let sub = header.sub()?;
        match reader.read_u32()? {
            0 => {
                expect_alternative(sub, T::KIND)?;
                Ok(Ok(T::decode(reader)?))
            }
            1 => {
                expect_alternative(sub, E::KIND)?;
                Ok(Err(E::decode(reader)?))
            }
            index => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("variant discriminator {index} is out of range"),
            )),
        }
    }
}

// =============================================================================
// Implementations for containers
// =============================================================================

impl<T: Decode> Decode for Vec<T> {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_seq(reader)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_seq(reader)
    }
}

impl<T: Decode> Decode for LinkedList<T> {
    const KIND: Kind = Kind::Seq;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_seq(reader)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    const KIND: Kind = Kind::Assoc;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_assoc(reader)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    const KIND: Kind = Kind::Assoc;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_assoc(reader)
    }
}

impl<T, S> Decode for HashSet<T, S>
where
    T: Decode + Eq + Hash,
    S: BuildHasher + Default,
{
    const KIND: Kind = Kind::Assoc;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_assoc(reader)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    const KIND: Kind = Kind::Assoc;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_assoc(reader)
    }
}

impl<K, V, S> Decode for DashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + Clone,
{
    const KIND: Kind = Kind::Assoc;

    fn decode<R: Reader + ?Sized>(reader: &mut R) -> io::Result<Self> {
        decode_assoc(reader)
    }
}
