//! Behaviour of the derive macros and the pod macro.

use std::collections::HashMap;

use tagpack::{
    deserialize, get_size, serialize, try_deserialize, Decode, Encode,
    EnvelopeHeader, Kind,
};

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Endpoint {
    host: String,
    port: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct RequestId(u64);

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Heartbeat;

#[test]
fn struct_shapes_roundtrip() {
    let endpoint = Endpoint { host: "localhost".to_owned(), port: 8080 };
    let bytes = serialize(&endpoint);
    // Custom aggregates are headerless field sequences.
    assert_eq!(
        get_size(&endpoint),
        get_size(&endpoint.host) + get_size(&endpoint.port)
    );
    assert_eq!(try_deserialize::<Endpoint>(&bytes).unwrap(), endpoint);
    assert_eq!(<Endpoint as Encode>::KIND, Kind::Custom);

    let id = RequestId(0xFEED);
    let bytes = serialize(&id);
    assert_eq!(get_size(&id), 8);
    assert_eq!(try_deserialize::<RequestId>(&bytes).unwrap(), id);

    let bytes = serialize(&Heartbeat);
    assert_eq!(get_size(&Heartbeat), 0);
    assert_eq!(bytes.len(), EnvelopeHeader::SIZE);
    assert_eq!(try_deserialize::<Heartbeat>(&bytes).unwrap(), Heartbeat);
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
enum Command {
    #[default]
    Quit,
    Move {
        x: i32,
        y: i32,
    },
    Write(String),
    Color(u8, u8, u8),
}

#[test]
fn enum_variant_shapes_roundtrip() {
    assert_eq!(<Command as Encode>::KIND, Kind::Variant);

    for command in [
        Command::Quit,
        Command::Move { x: -3, y: 9 },
        Command::Write("hello".to_owned()),
        Command::Color(1, 2, 3),
    ] {
        let bytes = serialize(&command);
        assert_eq!(get_size(&command), bytes.len() - EnvelopeHeader::SIZE);
        assert_eq!(try_deserialize::<Command>(&bytes).unwrap(), command);
    }
}

#[test]
fn enum_wire_shape() {
    // Unit variant: header with an empty sub nibble, discriminator, no
    // payload.
    let bytes = serialize(&Command::Quit);
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload.len(), 9);
    assert_eq!(payload[0], 0x09);
    assert_eq!(&payload[1..5], &4u32.to_ne_bytes());
    assert_eq!(&payload[5..9], &0u32.to_ne_bytes());

    // Single-field variant: the sub nibble records the field's category.
    let bytes = serialize(&Command::Write(String::new()));
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0xB9);
    assert_eq!(&payload[5..9], &2u32.to_ne_bytes());

    // Multi-field variant: the payload is a headerless field sequence.
    let bytes = serialize(&Command::Color(7, 8, 9));
    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0xD9);
    assert_eq!(&payload[9..], &[7, 8, 9]);
}

#[test]
fn out_of_range_discriminator_is_soft() {
    let bytes = serialize(&Command::Quit);
    let mut tampered = bytes;
    let at = EnvelopeHeader::SIZE + 5;
    tampered[at..at + 4].copy_from_slice(&9u32.to_ne_bytes());
    assert!(try_deserialize::<Command>(&tampered).is_err());
    assert_eq!(deserialize::<Command>(&tampered), Command::Quit);
}

#[test]
fn corrupted_alternative_category_is_soft() {
    let bytes = serialize(&Command::Write("x".to_owned()));
    let mut tampered = bytes;
    // Rewrite the sub nibble so it no longer names the selected
    // alternative's category.
    tampered[EnvelopeHeader::SIZE] = 0x19;
    assert!(try_deserialize::<Command>(&tampered).is_err());
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
enum Narrow {
    #[default]
    Off,
    Level(u8),
}

#[test]
fn variant_arity_mismatch_yields_default() {
    // Four alternatives on the wire, two in the target enum.
    let bytes = serialize(&Command::Quit);
    assert!(try_deserialize::<Narrow>(&bytes).is_err());
    assert_eq!(deserialize::<Narrow>(&bytes), Narrow::Off);
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Cached {
    name: String,
    #[pack(skip)]
    scratch: Vec<u8>,
}

#[test]
fn skipped_fields_are_defaulted() {
    let value =
        Cached { name: "keep".to_owned(), scratch: vec![1, 2, 3, 4, 5] };
    let bytes = serialize(&value);
    assert_eq!(get_size(&value), get_size(&value.name));

    let decoded: Cached = try_deserialize(&bytes).unwrap();
    assert_eq!(decoded.name, "keep");
    assert!(decoded.scratch.is_empty());
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Labelled<T> {
    label: String,
    inner: T,
}

#[test]
fn generic_aggregates_roundtrip() {
    let value = Labelled { label: "numbers".to_owned(), inner: vec![1u32, 2] };
    let bytes = serialize(&value);
    assert_eq!(get_size(&value), bytes.len() - EnvelopeHeader::SIZE);
    assert_eq!(try_deserialize::<Labelled<Vec<u32>>>(&bytes).unwrap(), value);
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct Directory {
    entries: HashMap<String, Endpoint>,
    fallback: Option<Endpoint>,
}

#[test]
fn aggregates_nest_inside_containers() {
    let mut entries = HashMap::new();
    entries.insert(
        "db".to_owned(),
        Endpoint { host: "10.0.0.1".to_owned(), port: 5432 },
    );
    entries.insert(
        "cache".to_owned(),
        Endpoint { host: "10.0.0.2".to_owned(), port: 6379 },
    );
    let value = Directory {
        entries,
        fallback: Some(Endpoint { host: "127.0.0.1".to_owned(), port: 80 }),
    };

    let bytes = serialize(&value);
    assert_eq!(get_size(&value), bytes.len() - EnvelopeHeader::SIZE);
    assert_eq!(try_deserialize::<Directory>(&bytes).unwrap(), value);
}

// =============================================================================
// Pod aggregates
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

tagpack::impl_pod!(Rgba);

#[test]
fn pod_aggregates_travel_as_raw_bytes() {
    let value = Rgba { r: 1, g: 2, b: 3, a: 255 };
    let bytes = serialize(&value);

    assert_eq!(get_size(&value), 9);
    assert_eq!(<Rgba as Encode>::KIND, Kind::Pod);

    let payload = &bytes[EnvelopeHeader::SIZE..];
    assert_eq!(payload[0], 0x07);
    assert_eq!(&payload[1..5], &4u32.to_ne_bytes());
    assert_eq!(&payload[5..], &[1, 2, 3, 255]);

    assert_eq!(try_deserialize::<Rgba>(&bytes).unwrap(), value);
}

#[test]
fn pods_nest_inside_containers() {
    let value = vec![
        Rgba { r: 1, g: 1, b: 1, a: 1 },
        Rgba { r: 2, g: 2, b: 2, a: 2 },
    ];
    let bytes = serialize(&value);
    assert_eq!(get_size(&value), bytes.len() - EnvelopeHeader::SIZE);

    let payload = &bytes[EnvelopeHeader::SIZE..];
    // Sequence of pods: main = seq, sub = pod.
    assert_eq!(payload[0], 0x7B);

    assert_eq!(try_deserialize::<Vec<Rgba>>(&bytes).unwrap(), value);
}
