//! Encoding: the type-directed dispatch that turns values into tagged
//! bytes.
//!
//! [`Encode`] pairs the encode hook with an exact size hook and carries the
//! type's wire category as an associated constant, which is how values are
//! classified at compile time. Fixed-width numerics travel as raw bytes in
//! host order; every other category emits a [`DataHeader`] before its
//! element stream.
//!
//! Explicit implementations cover the primitive scalars, strings, pairs and
//! tuples, the std containers, and delegating wrappers. User aggregates
//! implement the trait by hand or through the `#[derive(Encode)]` macro
//! from [`tagpack_derive`]; trivially-copyable aggregates go through
//! [`impl_pod!`](crate::impl_pod). Types without an implementation (raw
//! pointers, 128-bit integers) fail to compile at the call site.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    hash::{BuildHasher, Hash},
    mem::size_of,
    rc::Rc,
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    buffer::{VecWriter, Writer},
    kind::{DataHeader, Kind},
};

/// Scratch capacity for staging buffers whose final size is unknown.
pub(crate) const DEFAULT_RESERVE: usize = 4096;

/// A trait for values that can serialize themselves into tagged bytes.
pub trait Encode {
    /// The wire category this type is classified as.
    const KIND: Kind;

    /// Encodes this value through the provided writer.
    ///
    /// Writes never report failure; bounded sinks truncate silently and
    /// reveal progress through [`Writer::count`].
    fn encode<W: Writer + ?Sized>(&self, writer: &mut W);

    /// Exact number of bytes [`encode`](Self::encode) will emit for this
    /// value, computed without materializing the encoding.
    fn byte_size(&self) -> usize;
}

/// Returns the exact encoded size of `value` in bytes, excluding the
/// envelope.
#[must_use]
pub fn get_size<T: Encode + ?Sized>(value: &T) -> usize {
    value.byte_size()
}

/// Emits a container header followed by each element in iteration order.
pub(crate) fn encode_elements<'a, W, T, I>(
    writer: &mut W,
    main: Kind,
    len: usize,
    items: I,
) where
    W: Writer + ?Sized,
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    #[allow(clippy::cast_possible_truncation)]
    DataHeader::with_sub(main, T::KIND, len as u32).emit(writer);
    for item in items {
        item.encode(writer);
    }
}

/// Exact size of an encoded container, taking the `count * width` fast
/// path when the element category has a fixed width.
pub(crate) fn elements_size<'a, T, I>(len: usize, items: I) -> usize
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    match T::KIND.scalar_width() {
        Some(width) => DataHeader::SIZE + len * width,
        None => {
            DataHeader::SIZE
                + items.into_iter().map(Encode::byte_size).sum::<usize>()
        }
    }
}

fn encode_pair_parts<W, A, B>(writer: &mut W, first: &A, second: &B)
where
    W: Writer + ?Sized,
    A: Encode,
    B: Encode,
{
    DataHeader::new(Kind::Pair, 2).emit(writer);
    first.encode(writer);
    second.encode(writer);
}

fn pair_parts_size<A, B>(first: &A, second: &B) -> usize
where
    A: Encode,
    B: Encode,
{
    DataHeader::SIZE + first.byte_size() + second.byte_size()
}

// =============================================================================
// Implementations for primitive scalars
// =============================================================================

impl Encode for u8 {
    const KIND: Kind = Kind::Byte8;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_u8(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for u16 {
    const KIND: Kind = Kind::Byte16;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_u16(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for u32 {
    const KIND: Kind = Kind::Byte32;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_u32(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for u64 {
    const KIND: Kind = Kind::Byte64;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_u64(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for usize {
    const KIND: Kind = Kind::Byte64;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_usize(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<u64>()
    }
}

impl Encode for i8 {
    const KIND: Kind = Kind::Byte8;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_i8(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for i16 {
    const KIND: Kind = Kind::Byte16;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_i16(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for i32 {
    const KIND: Kind = Kind::Byte32;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_i32(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for i64 {
    const KIND: Kind = Kind::Byte64;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_i64(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for isize {
    const KIND: Kind = Kind::Byte64;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_isize(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<i64>()
    }
}

impl Encode for f32 {
    const KIND: Kind = Kind::Float32;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_f32(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for f64 {
    const KIND: Kind = Kind::Float64;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_f64(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
    }
}

impl Encode for bool {
    const KIND: Kind = Kind::Byte8;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_bool(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<u8>()
    }
}

impl Encode for char {
    const KIND: Kind = Kind::Byte32;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        writer.emit_char(*self);
    }

    fn byte_size(&self) -> usize {
        size_of::<u32>()
    }
}

// =============================================================================
// Implementations for strings
// =============================================================================

impl Encode for str {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        #[allow(clippy::cast_possible_truncation)]
        DataHeader::with_sub(Kind::Seq, Kind::Byte8, self.len() as u32)
            .emit(writer);
        writer.emit_raw_bytes(self.as_bytes());
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE + self.len()
    }
}

impl Encode for String {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        self.as_str().encode(writer);
    }

    fn byte_size(&self) -> usize {
        self.as_str().byte_size()
    }
}

// =============================================================================
// Implementations for references and smart pointers
// =============================================================================

impl<T: Encode + ?Sized> Encode for &T {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: Encode + ?Sized> Encode for &mut T {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: Encode + ?Sized> Encode for Rc<T> {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: Encode + ?Sized> Encode for Arc<T> {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: Encode + ToOwned + ?Sized> Encode for Cow<'_, T> {
    const KIND: Kind = T::KIND;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        (**self).encode(writer);
    }

    fn byte_size(&self) -> usize {
        (**self).byte_size()
    }
}

// =============================================================================
// Implementations for pairs and tuples
// =============================================================================

impl<A: Encode, B: Encode> Encode for (A, B) {
    const KIND: Kind = Kind::Pair;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_pair_parts(writer, &self.0, &self.1);
    }

    fn byte_size(&self) -> usize {
        pair_parts_size(&self.0, &self.1)
    }
}

macro_rules! impl_encode_tuple {
    ($arity:literal => $($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            const KIND: Kind = Kind::Tuple;

            #[allow(non_snake_case)]
            fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
                let ($($name,)+) = self;
                DataHeader::new(Kind::Tuple, $arity).emit(writer);
                $($name.encode(writer);)+
            }

            #[allow(non_snake_case)]
            fn byte_size(&self) -> usize {
                let ($($name,)+) = self;
                DataHeader::SIZE $(+ $name.byte_size())+
            }
        }
    };
}

impl_encode_tuple!(1 => A);
impl_encode_tuple!(3 => A, B, C);
impl_encode_tuple!(4 => A, B, C, D);
impl_encode_tuple!(5 => A, B, C, D, E);
impl_encode_tuple!(6 => A, B, C, D, E, F);
impl_encode_tuple!(7 => A, B, C, D, E, F, G);
impl_encode_tuple!(8 => A, B, C, D, E, F, G, H);
impl_encode_tuple!(9 => A, B, C, D, E, F, G, H, I);
impl_encode_tuple!(10 => A, B, C, D, E, F, G, H, I, J);
impl_encode_tuple!(11 => A, B, C, D, E, F, G, H, I, J, K);
impl_encode_tuple!(12 => A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Implementations for variants
// =============================================================================

impl<T: Encode> Encode for Option<T> {
    const KIND: Kind = Kind::Variant;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        match self {
            None => {
                DataHeader::with_sub(Kind::Variant, Kind::Empty, 2)
                    .emit(writer);
                writer.emit_u32(0);
            }
            Some(value) => {
                DataHeader::with_sub(Kind::Variant, T::KIND, 2).emit(writer);
                writer.emit_u32(1);
                value.encode(writer);
            }
        }
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + size_of::<u32>()
            + self.as_ref().map_or(0, Encode::byte_size)
    }
}

impl<T: Encode, E: Encode> Encode for Result<T, E> {
    const KIND: Kind = Kind::Variant;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        match self {
            Ok(value) => {
                DataHeader::with_sub(Kind::Variant, T::KIND, 2).emit(writer);
                writer.emit_u32(0);
                value.encode(writer);
            }
            Err(error) => {
                DataHeader::with_sub(Kind::Variant, E::KIND, 2).emit(writer);
                writer.emit_u32(1);
                error.encode(writer);
            }
        }
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + size_of::<u32>()
            + match self {
                Ok(value) => value.byte_size(),
                Err(error) => error.byte_size(),
            }
    }
}

// =============================================================================
// Implementations for sequence containers
// =============================================================================

impl<T: Encode> Encode for [T] {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_elements(writer, Kind::Seq, self.len(), self);
    }

    fn byte_size(&self) -> usize {
        elements_size(self.len(), self)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        self.as_slice().encode(writer);
    }

    fn byte_size(&self) -> usize {
        self.as_slice().byte_size()
    }
}

impl<T: Encode> Encode for Vec<T> {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        self.as_slice().encode(writer);
    }

    fn byte_size(&self) -> usize {
        self.as_slice().byte_size()
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_elements(writer, Kind::Seq, self.len(), self);
    }

    fn byte_size(&self) -> usize {
        elements_size(self.len(), self)
    }
}

impl<T: Encode> Encode for LinkedList<T> {
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_elements(writer, Kind::Seq, self.len(), self);
    }

    fn byte_size(&self) -> usize {
        elements_size(self.len(), self)
    }
}

/// Adapter that encodes the items of a cloneable iterator as a sequence
/// whose length is not known up front.
///
/// Elements are staged in a scratch buffer while they are counted, then
/// the header and the staged bytes are spliced into the target writer.
/// This is the encode path for iteration-only sources such as
/// singly-linked structures.
#[derive(Debug, Clone)]
pub struct IterSeq<I>(pub I);

impl<I, T> Encode for IterSeq<I>
where
    I: Iterator<Item = T> + Clone,
    T: Encode,
{
    const KIND: Kind = Kind::Seq;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        let mut scratch = Vec::with_capacity(DEFAULT_RESERVE);
        let mut staged = VecWriter::new(&mut scratch);
        let mut len: u32 = 0;
        for item in self.0.clone() {
            item.encode(&mut staged);
            len += 1;
        }
        DataHeader::with_sub(Kind::Seq, T::KIND, len).emit(writer);
        writer.emit_raw_bytes(&scratch);
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + self.0.clone().map(|item| item.byte_size()).sum::<usize>()
    }
}

// =============================================================================
// Implementations for associative containers
// =============================================================================

impl<K: Encode, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    const KIND: Kind = Kind::Assoc;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        #[allow(clippy::cast_possible_truncation)]
        DataHeader::with_sub(Kind::Assoc, Kind::Pair, self.len() as u32)
            .emit(writer);
        for (key, value) in self {
            encode_pair_parts(writer, key, value);
        }
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + self
                .iter()
                .map(|(key, value)| pair_parts_size(key, value))
                .sum::<usize>()
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    const KIND: Kind = Kind::Assoc;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        #[allow(clippy::cast_possible_truncation)]
        DataHeader::with_sub(Kind::Assoc, Kind::Pair, self.len() as u32)
            .emit(writer);
        for (key, value) in self {
            encode_pair_parts(writer, key, value);
        }
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + self
                .iter()
                .map(|(key, value)| pair_parts_size(key, value))
                .sum::<usize>()
    }
}

impl<T: Encode, S: BuildHasher> Encode for HashSet<T, S> {
    const KIND: Kind = Kind::Assoc;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_elements(writer, Kind::Assoc, self.len(), self);
    }

    fn byte_size(&self) -> usize {
        elements_size(self.len(), self)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    const KIND: Kind = Kind::Assoc;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        encode_elements(writer, Kind::Assoc, self.len(), self);
    }

    fn byte_size(&self) -> usize {
        elements_size(self.len(), self)
    }
}

impl<K, V, S> Encode for DashMap<K, V, S>
where
    K: Encode + Eq + Hash,
    V: Encode,
    S: BuildHasher + Clone,
{
    const KIND: Kind = Kind::Assoc;

    fn encode<W: Writer + ?Sized>(&self, writer: &mut W) {
        #[allow(clippy::cast_possible_truncation)]
        DataHeader::with_sub(Kind::Assoc, Kind::Pair, self.len() as u32)
            .emit(writer);
        for entry in self.iter() {
            encode_pair_parts(writer, entry.key(), entry.value());
        }
    }

    fn byte_size(&self) -> usize {
        DataHeader::SIZE
            + self
                .iter()
                .map(|entry| pair_parts_size(entry.key(), entry.value()))
                .sum::<usize>()
    }
}
