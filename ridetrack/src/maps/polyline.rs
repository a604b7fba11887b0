//! Encoded polyline codec.
//!
//! Implements the standard polyline algorithm: each coordinate delta is
//! scaled by 1e5, zig-zag encoded, split into 5-bit groups (least significant
//! first) with 0x20 as the continuation bit, and offset by 63 into printable
//! ASCII.

use thiserror::Error;

use crate::coord::Coordinate;

/// Fixed-point scale used by the format.
pub const PRECISION: f64 = 1e5;

/// Errors from strict decoding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolylineError {
    #[error("Invalid polyline character {ch:?} at byte {index}")]
    InvalidCharacter { ch: char, index: usize },

    #[error("Polyline ends in the middle of a value")]
    Truncated,

    #[error("Polyline value overflows at byte {index}")]
    Overflow { index: usize },

    #[error("Decoded point out of range: {0}")]
    OutOfRange(String),
}

/// Decode an encoded polyline, stopping at the first malformed value.
///
/// Points decoded before a malformed or truncated value are returned. An
/// empty string yields an empty path.
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let mut points = Vec::new();
    let _ = decode_into(encoded, &mut points);
    points
}

/// Decode an encoded polyline, rejecting any malformed input.
pub fn decode_strict(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let mut points = Vec::new();
    decode_into(encoded, &mut points)?;
    Ok(points)
}

fn decode_into(encoded: &str, points: &mut Vec<Coordinate>) -> Result<(), PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat += next_value(bytes, &mut index)?;
        lng += next_value(bytes, &mut index)?;

        let point = Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION)
            .map_err(|e| PolylineError::OutOfRange(e.to_string()))?;
        points.push(point);
    }
    Ok(())
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..127).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                ch: byte as char,
                index: *index,
            });
        }
        if shift > 30 {
            return Err(PolylineError::Overflow { index: *index });
        }
        *index += 1;

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk & 0x20 == 0 {
            break;
        }
    }

    // zig-zag
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encode a path as a polyline.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude * PRECISION).round() as i64;
        let lng = (point.longitude * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Worked example from the format's reference documentation.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn test_decode_empty() {
        assert!(decode("").is_empty());
        assert_eq!(decode_strict(""), Ok(Vec::new()));
    }

    #[test]
    fn test_decode_reference() {
        let points = decode_strict(REFERENCE).unwrap();
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(points.len(), expected.len());
        for (p, (lat, lng)) in points.iter().zip(expected) {
            assert!((p.latitude - lat).abs() < 1e-9);
            assert!((p.longitude - lng).abs() < 1e-9);
        }
    }

    #[test]
    fn test_encode_reference() {
        let points = vec![
            Coordinate::new(38.5, -120.2).unwrap(),
            Coordinate::new(40.7, -120.95).unwrap(),
            Coordinate::new(43.252, -126.453).unwrap(),
        ];
        assert_eq!(encode(&points), REFERENCE);
    }

    #[test]
    fn test_truncated_input() {
        // Drop the final longitude byte.
        let cut = &REFERENCE[..REFERENCE.len() - 1];
        assert_eq!(decode_strict(cut), Err(PolylineError::Truncated));
        assert_eq!(decode(cut).len(), 2);
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            decode_strict("_p~iF ps|U"),
            Err(PolylineError::InvalidCharacter { ch: ' ', index: 5 })
        ));
    }

    #[test]
    fn test_decode_is_deterministic() {
        assert_eq!(decode(REFERENCE), decode(REFERENCE));
    }

    proptest! {
        #[test]
        fn prop_round_trip(raw in prop::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 0..50)) {
            let points: Vec<Coordinate> = raw
                .iter()
                .map(|&(lat, lng)| Coordinate::new(lat, lng).unwrap())
                .collect();

            let decoded = decode_strict(&encode(&points)).unwrap();
            prop_assert_eq!(decoded.len(), points.len());
            for (a, b) in decoded.iter().zip(&points) {
                prop_assert!((a.latitude - b.latitude).abs() <= 1e-5);
                prop_assert!((a.longitude - b.longitude).abs() <= 1e-5);
            }
        }
    }
}
