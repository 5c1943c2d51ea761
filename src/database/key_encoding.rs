//! Order-preserving byte encodings for secondary index keys.
//!
//! The contract: `a < b` in the domain (bool, integer, float, string, datetime ordering) iff
//! `encode(a) < encode(b)` as unsigned byte sequences. This is what lets a B+-tree range scan over
//! raw bytes implement `RangeScan`/`PrefixRangeScan` without decoding every key it walks past.

use bson::Bson;

/// Reserved leading byte that sorts before any real value, used for BSON null/missing fields.
const NULL_TAG: u8 = 0x00;
/// Leading byte for every non-null encoded key, so null always sorts first regardless of type.
const VALUE_TAG: u8 = 0x01;

/// Encode a single BSON scalar into its order-preserving byte form.
///
/// Returns `None` for BSON types with no defined index encoding (documents, arrays, binary, …);
/// callers skip indexing such fields, matching how the in-memory index already ignores them.
#[must_use]
pub fn encode_scalar(v: &Bson) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match v {
        Bson::Null => {
            out.push(NULL_TAG);
        }
        Bson::Boolean(b) => {
            out.push(VALUE_TAG);
            out.push(u8::from(*b));
        }
        Bson::Int32(i) => {
            out.push(VALUE_TAG);
            out.extend_from_slice(&encode_i64(i64::from(*i)));
        }
        Bson::Int64(i) => {
            out.push(VALUE_TAG);
            out.extend_from_slice(&encode_i64(*i));
        }
        Bson::Double(f) => {
            out.push(VALUE_TAG);
            out.extend_from_slice(&encode_f64(*f));
        }
        Bson::String(s) => {
            out.push(VALUE_TAG);
            out.extend_from_slice(&encode_string(s));
        }
        Bson::DateTime(dt) => {
            out.push(VALUE_TAG);
            out.extend_from_slice(&encode_i64(dt.timestamp_millis()));
        }
        _ => return None,
    }
    Some(out)
}

/// Big-endian i64 with the sign bit flipped, so negatives sort below positives.
#[must_use]
pub fn encode_i64(v: i64) -> [u8; 8] {
    let flipped = (v as u64) ^ (1u64 << 63);
    flipped.to_be_bytes()
}

#[must_use]
pub fn decode_i64(bytes: &[u8; 8]) -> i64 {
    let flipped = u64::from_be_bytes(*bytes);
    (flipped ^ (1u64 << 63)) as i64
}

/// Big-endian IEEE-754 f64: flip all bits if negative, else flip only the sign bit.
/// This maps float domain order onto unsigned-byte order for both positive and negative values.
#[must_use]
pub fn encode_f64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let mapped = if bits & (1u64 << 63) != 0 { !bits } else { bits | (1u64 << 63) };
    mapped.to_be_bytes()
}

#[must_use]
pub fn decode_f64(bytes: &[u8; 8]) -> f64 {
    let mapped = u64::from_be_bytes(*bytes);
    let bits = if mapped & (1u64 << 63) != 0 { mapped & !(1u64 << 63) } else { !mapped };
    f64::from_bits(bits)
}

/// UTF-8 bytes terminated by 0x00; any literal 0x00 byte in the string is escaped as `0x00 0xFF`
/// so the terminator remains unambiguous and escaped strings still sort correctly against it.
#[must_use]
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 1);
    for &b in s.as_bytes() {
        if b == 0x00 {
            out.push(0x00);
            out.push(0xFF);
        } else {
            out.push(b);
        }
    }
    out.push(0x00);
    out
}

/// Concatenate per-field encodings in declared order for a compound index key.
#[must_use]
pub fn encode_compound(fields: &[Vec<u8>]) -> Vec<u8> {
    fields.concat()
}
