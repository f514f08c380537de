//! Revision identifiers.
//!
//! Revision ids are RFC 4122 v4 uuids with the document's numeric key
//! spliced into the non-reserved bit positions, so an id remains traceable
//! to the key that produced it while staying unique per revision.

use uuid::Uuid;

/// Builds a revision id for the given numeric key.
///
/// The 64 key bits are packed around the version and variant fields:
/// bytes 0-5 carry the top 48 bits, the low nibble of byte 6 and all of
/// byte 7 carry bits 19-4, and the top six bits of byte 8 carry the rest.
/// Every remaining bit is random.
pub fn uuid_from_key(key: u64) -> Uuid {
    let mut data = *Uuid::new_v4().as_bytes();

    data[0] = ((key & 0xff00_0000_0000_0000) >> 56) as u8;
    data[1] = ((key & 0x00ff_0000_0000_0000) >> 48) as u8;
    data[2] = ((key & 0x0000_ff00_0000_0000) >> 40) as u8;
    data[3] = ((key & 0x0000_00ff_0000_0000) >> 32) as u8;
    data[4] = ((key & 0x0000_0000_ff00_0000) >> 24) as u8;
    data[5] = ((key & 0x0000_0000_00ff_0000) >> 16) as u8;
    data[6] = ((key & 0x0000_0000_0000_f000) >> 12) as u8;
    data[7] = ((key & 0x0000_0000_0000_0ff0) >> 4) as u8;
    data[8] = (data[8] & 0x03) | (((key & 0x0000_0000_0000_000f) << 2) as u8);

    // Version 4.
    data[6] = (data[6] & 0x4f) | 0x40;
    // RFC 4122 variant.
    data[8] = (data[8] & 0xbf) | 0x80;

    Uuid::from_bytes(data)
}

/// Formats a uuid in the braced lowercase form used throughout documents,
/// e.g. `{550e8400-e29b-41d4-a716-446655440000}`.
pub fn format_uuid(id: &Uuid) -> String {
    format!("{{{}}}", id.hyphenated())
}

/// Parses a uuid from hex text, tolerating braces and hyphens.
pub fn parse_uuid(s: &str) -> Option<Uuid> {
    let hex: String = s
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();
    if hex.len() != 32 {
        return None;
    }
    let mut bytes = [0u8; 16];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk).ok()?;
        bytes[i] = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(Uuid::from_bytes(bytes))
}
