//! Command checksum
//!
//! The relay checks a CRC-32 over the command's compact JSON form with the
//! outer braces removed, i.e. only the comma-separated `"key":"value"`
//! members. The result goes into the `CRC` field as 8 uppercase hex digits.

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::command::CommandFields;

/// CRC-32 (IEEE polynomial, reflected, as computed by zlib's `crc32`)
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Compute the checksum stamp for a set of command fields
///
/// The fields must not contain `CRC` yet; the caller appends it afterwards.
pub fn checksum(fields: &CommandFields) -> String {
    let json = fields.to_json();
    let members = json
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(&json);
    format!("{:08X}", CRC32.checksum(members.as_bytes()))
}
