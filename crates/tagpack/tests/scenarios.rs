//! End-to-end scenarios over the public surface.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tagpack::{
    deserialize, get_size, serialize, try_deserialize, Decode, Encode,
    EnvelopeHeader, IterSeq, VERSION,
};

/// A sequence of 32-bit integers produces the documented wire layout: a
/// `0x3B` header byte (main = seq, sub = byte32), a 4-element length, and
/// the raw integers, wrapped in a ten-byte envelope with a zero checksum.
#[test]
fn seq_of_byte32_wire_layout() {
    let value = vec![1i32, 2, 3, 4];
    let bytes = serialize(&value);

    assert_eq!(get_size(&value), 21);
    assert_eq!(bytes.len(), EnvelopeHeader::SIZE + 21);

    // Envelope: version, zero crc, payload length.
    assert_eq!(&bytes[..2], &VERSION.to_ne_bytes());
    assert_eq!(&bytes[2..6], &0u32.to_ne_bytes());
    assert_eq!(&bytes[6..10], &21u32.to_ne_bytes());

    // Payload: header then four host-order integers.
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0x3B);
    assert_eq!(&payload[1..5], &4u32.to_ne_bytes());
    for (i, expected) in (1i32..=4).enumerate() {
        let at = 5 + i * 4;
        assert_eq!(&payload[at..at + 4], &expected.to_ne_bytes());
    }

    assert_eq!(deserialize::<Vec<i32>>(&bytes), value);
}

/// A hash map of string scores decodes into the ordered keyed container,
/// with multiset-equivalent contents. A sequence container refuses the
/// associative wire category.
#[test]
fn string_keyed_map_substitution() {
    let mut scores = HashMap::new();
    scores.insert("Jacky".to_owned(), 68u32);
    scores.insert("Element".to_owned(), 97u32);
    scores.insert("Bob".to_owned(), 45u32);

    let bytes = serialize(&scores);
    assert_eq!(get_size(&scores), bytes.len() - EnvelopeHeader::SIZE);

    // Each element is a pair header followed by a byte8 sequence (the
    // string) and a byte32 value; the outer header records aso/pair.
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0x8C);
    assert_eq!(&payload[1..5], &3u32.to_ne_bytes());

    let ordered: BTreeMap<String, u32> = deserialize(&bytes);
    let expected: BTreeMap<String, u32> =
        scores.iter().map(|(k, &v)| (k.clone(), v)).collect();
    assert_eq!(ordered, expected);

    // Sequence containers do not accept the associative main category.
    assert!(try_deserialize::<Vec<(String, u32)>>(&bytes).is_err());
    assert_eq!(deserialize::<Vec<(String, u32)>>(&bytes), Vec::new());
}

#[derive(Debug, PartialEq, Encode, Decode)]
enum Scalar {
    Number(i32),
    Letter(char),
    Text(String),
}

/// A three-way variant holding its string alternative round-trips with the
/// discriminator preserved.
#[test]
fn variant_holding_string_alternative() {
    let value = Scalar::Text("serialization".to_owned());
    let bytes = serialize(&value);
    assert_eq!(get_size(&value), bytes.len() - EnvelopeHeader::SIZE);

    // Variant header: main = variant, sub = seq (the active alternative),
    // arity 3; then the 4-byte discriminator selecting index 2.
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0xB9);
    assert_eq!(&payload[1..5], &3u32.to_ne_bytes());
    assert_eq!(&payload[5..9], &2u32.to_ne_bytes());

    let decoded: Scalar = try_deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
}

/// A four-element address tuple preserves element order and values.
#[test]
fn address_tuple_roundtrip() {
    let value =
        ("192.168.10.1".to_owned(), 3768u32, "202.113.76.68".to_owned(), 80u32);
    let bytes = serialize(&value);
    assert_eq!(get_size(&value), bytes.len() - EnvelopeHeader::SIZE);

    let decoded: (String, u32, String, u32) = try_deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
}

struct Node {
    value: i32,
    next: Option<Box<Node>>,
}

/// A test-local singly-linked list: iterable, but with no cheap length.
struct SinglyLinked {
    head: Option<Box<Node>>,
}

impl SinglyLinked {
    fn from_slice(values: &[i32]) -> Self {
        let mut head = None;
        for &value in values.iter().rev() {
            head = Some(Box::new(Node { value, next: head }));
        }
        Self { head }
    }

    fn iter(&self) -> LinkIter<'_> {
        LinkIter { node: self.head.as_deref() }
    }
}

#[derive(Clone)]
struct LinkIter<'a> {
    node: Option<&'a Node>,
}

impl<'a> Iterator for LinkIter<'a> {
    type Item = &'a i32;

    fn next(&mut self) -> Option<&'a i32> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(&node.value)
    }
}

/// A singly-linked list encoded through the unsized-iterable path decodes
/// as a double-ended queue with the same element order.
#[test]
fn unsized_list_decodes_as_deque() {
    let list = SinglyLinked::from_slice(&[1, 2, 3, 4]);
    let adapter = IterSeq(list.iter());

    let bytes = serialize(&adapter);
    assert_eq!(get_size(&adapter), bytes.len() - EnvelopeHeader::SIZE);

    // The counted header matches the sized encoding of the same elements.
    assert_eq!(bytes, serialize(&vec![1i32, 2, 3, 4]));

    let decoded: VecDeque<i32> = deserialize(&bytes);
    assert_eq!(decoded, VecDeque::from([1, 2, 3, 4]));
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Row {
    value: u16,
    data: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Profile {
    name: String,
    rows: HashMap<u32, Row>,
}

/// A nested aggregate mixing user hooks, a keyed container, and sequences
/// round-trips through the derive path with exact size estimation.
#[test]
fn nested_aggregate_roundtrip() {
    let mut rows = HashMap::new();
    for i in 1..=5u32 {
        #[allow(clippy::cast_possible_truncation)]
        let value = i as u16;
        #[allow(clippy::cast_possible_wrap)]
        let element = i as i32;
        rows.insert(i, Row { value, data: vec![element; 3] });
    }
    let profile = Profile { name: "jacky".to_owned(), rows };

    let bytes = serialize(&profile);
    assert_eq!(get_size(&profile), bytes.len() - EnvelopeHeader::SIZE);

    let decoded: Profile = try_deserialize(&bytes).unwrap();
    assert_eq!(decoded, profile);
}
