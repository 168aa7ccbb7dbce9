//! Address-book entry ID codec.
//!
//! Entry IDs reference address-book objects on the wire. The binary layout
//! is a fixed header (4 flag bytes, 16-byte GUID, little-endian u32
//! version) followed by version-specific data. Only version 1 is in use:
//! a little-endian u32 type tag, a little-endian u32 numeric ID and a
//! trailing base64 text field holding the opaque external identifier,
//! optionally zero-padded up to the wire field's fixed size.
use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;

use crate::error::Error;

/// Standard base64, tolerant of missing padding on decode.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const HEADER_LEN: usize = 4 + 16 + 4;
const V1_DATA_LEN: usize = 4 + 4;

/// Build the little-endian byte representation of a GUID from its parts.
pub const fn define_guid(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> [u8; 16] {
    [
        data1 as u8,
        (data1 >> 8) as u8,
        (data1 >> 16) as u8,
        (data1 >> 24) as u8,
        data2 as u8,
        (data2 >> 8) as u8,
        data3 as u8,
        (data3 >> 8) as u8,
        data4[0],
        data4[1],
        data4[2],
        data4[3],
        data4[4],
        data4[5],
        data4[6],
        data4[7],
    ]
}

/// The well-known GUID carried by address-book entry IDs.
pub const MUIDECSAB: [u8; 16] = define_guid(
    0x50a9_21ac,
    0xd340,
    0x48ee,
    [0xb3, 0x19, 0xfb, 0xa7, 0x53, 0x30, 0x44, 0x25],
);

/// Object type tag inside an entry ID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapiType(pub u32);

impl MapiType {
    pub const MAILUSER: MapiType = MapiType(0x0000_0006);
}

impl fmt::Display for MapiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded address-book entry ID.
///
/// Equality considers the GUID, type tag and external identifier only; the
/// numeric ID and flag bytes are server-local and excluded.
#[derive(Clone, Debug)]
pub struct EntryId {
    ab_flags: [u8; 4],
    guid: [u8; 16],
    version: u32,
    typ: MapiType,
    id: u32,
    ex_id: Vec<u8>,
}

impl EntryId {
    /// Construct a version 1 entry ID with zeroed flag bytes.
    pub fn new(guid: [u8; 16], typ: MapiType, id: u32, ex_id: impl Into<Vec<u8>>) -> EntryId {
        EntryId {
            ab_flags: [0; 4],
            guid,
            version: 1,
            typ,
            id,
            ex_id: ex_id.into(),
        }
    }

    /// Decode an entry ID from its binary representation.
    pub fn from_bytes(value: &[u8]) -> Result<EntryId, Error> {
        if value.len() < HEADER_LEN {
            return Err(Error::MalformedEntryId(format!(
                "truncated header, got {} bytes",
                value.len()
            )));
        }
        let mut ab_flags = [0u8; 4];
        ab_flags.copy_from_slice(&value[0..4]);
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&value[4..20]);
        let version = u32::from_le_bytes([value[20], value[21], value[22], value[23]]);

        if version != 1 {
            return Err(Error::UnsupportedEntryIdVersion(version));
        }

        if value.len() < HEADER_LEN + V1_DATA_LEN {
            return Err(Error::MalformedEntryId(format!(
                "truncated version 1 data, got {} bytes",
                value.len()
            )));
        }
        let typ = u32::from_le_bytes([value[24], value[25], value[26], value[27]]);
        let id = u32::from_le_bytes([value[28], value[29], value[30], value[31]]);

        // The external ID field is base64 text, zero-padded up to the wire
        // field size.
        let ex_raw = &value[HEADER_LEN + V1_DATA_LEN..];
        let end = ex_raw.iter().rposition(|byte| *byte != 0).map_or(0, |p| p + 1);
        let ex_id = BASE64.decode(&ex_raw[..end]).map_err(|err| {
            Error::MalformedEntryId(format!("external ID field is not valid base64: {err}"))
        })?;

        Ok(EntryId {
            ab_flags,
            guid,
            version,
            typ: MapiType(typ),
            id,
            ex_id,
        })
    }

    /// Decode an entry ID from its hexadecimal text representation.
    /// Case-insensitive.
    pub fn from_hex(value: &str) -> Result<EntryId, Error> {
        let bytes = hex::decode(value)
            .map_err(|err| Error::MalformedEntryId(format!("invalid hex encoding: {err}")))?;
        EntryId::from_bytes(&bytes)
    }

    /// Decode an entry ID from its base64 text representation, with or
    /// without padding.
    pub fn from_base64(value: &str) -> Result<EntryId, Error> {
        let bytes = BASE64
            .decode(value)
            .map_err(|err| Error::MalformedEntryId(format!("invalid base64 encoding: {err}")))?;
        EntryId::from_bytes(&bytes)
    }

    /// The binary representation. The external ID field is emitted in its
    /// variable-length form without zero padding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let ex_field = BASE64.encode(&self.ex_id);
        let mut buf = Vec::with_capacity(HEADER_LEN + V1_DATA_LEN + ex_field.len());
        buf.extend_from_slice(&self.ab_flags);
        buf.extend_from_slice(&self.guid);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.typ.0.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(ex_field.as_bytes());
        buf
    }

    /// Lowercase hexadecimal text representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Base64 text representation.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// The first flag byte.
    pub fn ab_flags(&self) -> u8 {
        self.ab_flags[0]
    }

    pub fn guid(&self) -> [u8; 16] {
        self.guid
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn mapi_type(&self) -> MapiType {
        self.typ
    }

    /// The numeric ID field. Server-local, excluded from equality.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The opaque external identifier.
    pub fn ex_id(&self) -> &[u8] {
        &self.ex_id
    }
}

impl PartialEq for EntryId {
    fn eq(&self, other: &EntryId) -> bool {
        self.guid == other.guid && self.typ == other.typ && self.ex_id == other.ex_id
    }
}

impl Eq for EntryId {}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const PADDED_HEX: &str =
        "00000000ac21a95040d3ee48b319fba7533044250100000006000000040000004d673d3d00000000";

    #[test]
    fn decode_from_hex() {
        let cases: [(&str, u32, &[u8]); 3] = [
            (PADDED_HEX, 4, b"2"),
            (
                "00000000AC21A95040D3EE48B319FBA7533044250100000006000000450000004F4441774D673D3D00000000",
                69,
                b"8002",
            ),
            (
                "00000000AC21A95040D3EE48B319FBA7533044250100000006000000450000004F4441774D673D3D",
                69,
                b"8002",
            ),
        ];

        for (value, id, ex_id) in cases {
            let entry_id = EntryId::from_hex(value).expect("Failed to decode entry ID");
            assert_eq!(entry_id.ab_flags(), 0);
            assert_eq!(entry_id.guid(), MUIDECSAB);
            assert_eq!(entry_id.version(), 1);
            assert_eq!(entry_id.mapi_type(), MapiType::MAILUSER);
            assert_eq!(entry_id.id(), id);
            assert_eq!(entry_id.ex_id(), ex_id);
        }
    }

    #[test]
    fn decode_from_base64_with_and_without_padding() {
        let padded = "AAAAAKwhqVBA0+5Isxn7p1MwRCUBAAAABgAAAAMAAABNZz09AAAAAA==";
        let unpadded = "AAAAAKwhqVBA0+5Isxn7p1MwRCUBAAAABgAAAAMAAABNZz09";

        for value in [padded, unpadded] {
            let entry_id = EntryId::from_base64(value).expect("Failed to decode entry ID");
            assert_eq!(entry_id.guid(), MUIDECSAB);
            assert_eq!(entry_id.mapi_type(), MapiType::MAILUSER);
            assert_eq!(entry_id.id(), 3);
            assert_eq!(entry_id.ex_id(), b"2");
        }
    }

    #[test]
    fn unsupported_version_fails() {
        let mut bytes = hex::decode(PADDED_HEX).expect("valid hex");
        bytes[20] = 2;
        let result = EntryId::from_bytes(&bytes);
        assert!(matches!(result, Err(Error::UnsupportedEntryIdVersion(2))));
    }

    #[test]
    fn truncated_input_fails() {
        let bytes = hex::decode(PADDED_HEX).expect("valid hex");
        assert!(matches!(
            EntryId::from_bytes(&bytes[..10]),
            Err(Error::MalformedEntryId(_))
        ));
        assert!(matches!(
            EntryId::from_bytes(&bytes[..28]),
            Err(Error::MalformedEntryId(_))
        ));
    }

    #[test]
    fn equality_ignores_numeric_id_and_padding() {
        let a = EntryId::from_hex(PADDED_HEX).expect("valid");
        let b = EntryId::from_hex(PADDED_HEX).expect("valid");
        // Differs only in the numeric ID field.
        let c = EntryId::from_hex(
            "00000000ac21a95040d3ee48b319fba7533044250100000006000000050000004d673d3d00000000",
        )
        .expect("valid");
        // Differs in the external ID.
        let d = EntryId::from_hex(
            "00000000ac21a95040d3ee48b319fba7533044250100000006000000040000004d674d3d00000000",
        )
        .expect("valid");
        // Same value without trailing zero padding.
        let e = EntryId::from_hex(
            "00000000ac21a95040d3ee48b319fba7533044250100000006000000040000004d673d3d",
        )
        .expect("valid");

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, e);
    }

    #[test]
    fn hex_round_trip() {
        let unpadded = "00000000ac21a95040d3ee48b319fba7533044250100000006000000040000004d673d3d";
        let entry_id = EntryId::from_hex(unpadded).expect("valid");
        assert_eq!(entry_id.to_hex(), unpadded);
    }

    #[test]
    fn base64_round_trip() {
        let value = "AAAAAKwhqVBA0+5Isxn7p1MwRCUBAAAABgAAAAMAAABNZz09";
        let entry_id = EntryId::from_base64(value).expect("valid");
        assert_eq!(entry_id.to_string(), value);
    }

    #[test]
    fn constructed_round_trip() {
        let entry_id = EntryId::new(MUIDECSAB, MapiType::MAILUSER, 7, b"external".to_vec());
        let decoded = EntryId::from_hex(&entry_id.to_hex()).expect("valid");
        assert_eq!(decoded, entry_id);
        assert_eq!(decoded.id(), 7);
        assert_eq!(decoded.ab_flags(), 0);
    }

    #[test]
    fn constructed_matches_wire_value() {
        let a = EntryId::new(MUIDECSAB, MapiType::MAILUSER, 0, vec![1, 2, 3, 4]);
        let b = EntryId::from_base64("AAAAAKwhqVBA0+5Isxn7p1MwRCUBAAAABgAAAAAAAABBUUlEQkE9PQ==")
            .expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn muidecsab_layout() {
        assert_eq!(
            MUIDECSAB,
            [172, 33, 169, 80, 64, 211, 238, 72, 179, 25, 251, 167, 83, 48, 68, 37]
        );
    }
}
