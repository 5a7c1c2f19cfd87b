//! 64-bit Rabin fingerprint used as the wire identity of a schema.
//!
//! The arithmetic is pure wrapping `u64` math over a 256-entry table, so the
//! result is reproducible by every client implementation of the format.

use super::schema::FieldDescriptor;

/// Rabin fingerprint initial value, also the polynomial the table derives from.
pub const RABIN_FINGERPRINT_INIT: u64 = 0xc15d213aa4d7a795;

static FP_TABLE: [u64; 256] = build_table();

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut fp = i as u64;
        let mut j = 0;
        while j < 8 {
            fp = (fp >> 1) ^ (RABIN_FINGERPRINT_INIT & (fp & 1).wrapping_neg());
            j += 1;
        }
        table[i] = fp;
        i += 1;
    }
    table
}

/// Folds one byte into the fingerprint.
#[inline]
pub fn of_byte(fp: u64, b: u8) -> u64 {
    (fp >> 8) ^ FP_TABLE[((fp ^ b as u64) & 0xff) as usize]
}

/// Folds the four little-endian bytes of `v` into the fingerprint.
pub fn of_int(fp: u64, v: i32) -> u64 {
    v.to_le_bytes().iter().fold(fp, |fp, &b| of_byte(fp, b))
}

/// Folds raw bytes into the fingerprint.
pub fn of_bytes(fp: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(fp, |fp, &b| of_byte(fp, b))
}

/// Folds the UTF-8 byte length of `s`, then its bytes, into the fingerprint.
pub fn of_string(fp: u64, s: &str) -> u64 {
    let bytes = s.as_bytes();
    of_bytes(of_int(fp, bytes.len() as i32), bytes)
}

/// Computes the fingerprint of a schema from its structural description.
///
/// `fields` must already be in canonical (name-sorted) order.
pub fn of_schema(type_name: &str, fields: &[FieldDescriptor]) -> i64 {
    let mut fp = of_string(RABIN_FINGERPRINT_INIT, type_name);
    fp = of_int(fp, fields.len() as i32);
    for field in fields {
        fp = of_string(fp, field.name());
        fp = of_int(fp, field.kind().id());
    }
    fp as i64
}

/// Computes a Rabin fingerprint of `data`, starting from the initial value.
pub fn rabin_fingerprint_64(data: &[u8]) -> i64 {
    of_bytes(RABIN_FINGERPRINT_INIT, data) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::compact::FieldKind;

    #[test]
    fn test_table_entries() {
        assert_eq!(FP_TABLE[0], 0);
        assert_eq!(FP_TABLE[1], 0x2cf1cba6b75351fa);
        assert_eq!(FP_TABLE[255], 0x9a3978b155abf5b0);
    }

    #[test]
    fn test_known_schema_fingerprint() {
        let fields = vec![
            FieldDescriptor::new("age", FieldKind::Int8),
            FieldDescriptor::new("id", FieldKind::Int32),
            FieldDescriptor::new("name", FieldKind::String),
            FieldDescriptor::new("times", FieldKind::ArrayOfTimestamp),
        ];
        assert_eq!(of_schema("SomeType", &fields), 3662264393229655598);
    }

    #[test]
    fn test_empty_schema_fingerprint() {
        assert_eq!(of_schema("Empty", &[]), -7824791657517553487);
    }

    #[test]
    fn test_of_int_is_little_endian() {
        let by_int = of_int(RABIN_FINGERPRINT_INIT, 0x01020304);
        let by_bytes = of_bytes(RABIN_FINGERPRINT_INIT, &[4, 3, 2, 1]);
        assert_eq!(by_int, by_bytes);
    }

    #[test]
    fn test_of_string_prefixes_length() {
        let by_string = of_string(RABIN_FINGERPRINT_INIT, "ab");
        let by_bytes = of_bytes(RABIN_FINGERPRINT_INIT, &[2, 0, 0, 0, b'a', b'b']);
        assert_eq!(by_string, by_bytes);
    }

    #[test]
    fn test_changes_with_field_kind() {
        let a = [FieldDescriptor::new("x", FieldKind::Int32)];
        let b = [FieldDescriptor::new("x", FieldKind::Int64)];
        assert_ne!(of_schema("T", &a), of_schema("T", &b));
    }
}
