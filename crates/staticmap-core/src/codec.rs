//! Compact polyline codec.
//!
//! Encodes a path as printable ASCII using the
//! [encoded polyline algorithm](https://developers.google.com/maps/documentation/utilities/polylinealgorithm):
//!
//! 1. Scale each coordinate by 1e5 and round to an integer.
//! 2. Take the delta from the previous point (the first point is a
//!    delta from the origin).
//! 3. Zig-zag the signed delta: shift left by one, invert if negative.
//! 4. Emit 5-bit groups, least significant first, setting `0x20` on
//!    every group but the last, and add 63 to land in `?`..=`~`.
//!
//! Deltas are taken between the *rounded* absolute values, so decoding
//! re-derives every point from an exact integer running sum. Rounding
//! error stays within half a unit per point and never accumulates.

use crate::types::{Coordinate, MapError, Path};

/// Scale between degrees and the integer units on the wire.
const FACTOR: f64 = 1e5;

/// Largest encodable magnitude in wire units (2^61). Any two such values
/// differ by at most 2^62, whose zig-zag form still fits in a `u64`.
const MAX_UNITS: f64 = 2_305_843_009_213_693_952.0;

/// Largest encodable magnitude in degrees.
pub const MAX_DEGREES: f64 = MAX_UNITS / FACTOR;

/// Offset added to each 5-bit group to make it printable.
const CHAR_OFFSET: u8 = 63;

/// Continuation bit within a 5-bit group.
const CONTINUATION: u64 = 0x20;

/// Mask for the 5 payload bits of a group.
const GROUP_MASK: u64 = 0x1f;

/// Shift of the 13th and last group a `u64` can need. Only its low 4
/// payload bits fit.
const MAX_SHIFT: u32 = 60;

/// Errors produced while decoding a polyline token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A byte outside the `?`..=`~` alphabet.
    #[error("invalid polyline character {byte:#04x} at position {position}")]
    InvalidCharacter {
        /// Byte offset in the token.
        position: usize,
        /// The offending byte.
        byte: u8,
    },

    /// The token ended inside a value, or after a latitude with no
    /// matching longitude.
    #[error("polyline token is truncated")]
    Truncated,

    /// A value needed more than 64 bits, or the running sum left the
    /// `i64` range.
    #[error("polyline value overflows 64 bits")]
    Overflow,
}

/// Encode a path as a compact polyline token.
///
/// An empty path encodes to an empty string.
///
/// # Errors
///
/// Returns [`MapError::CoordinateOutOfRange`] if a component is not
/// finite or exceeds [`MAX_DEGREES`].
pub fn encode(path: &Path) -> Result<String, MapError> {
    let mut out = String::with_capacity(path.len() * 8);
    let mut previous = (0_i64, 0_i64);

    for &coordinate in path.points() {
        let out_of_range = || MapError::CoordinateOutOfRange {
            lat: coordinate.lat,
            lng: coordinate.lng,
        };
        let current = scale(coordinate.lat)
            .zip(scale(coordinate.lng))
            .ok_or_else(out_of_range)?;
        let lat = current.0.checked_sub(previous.0).ok_or_else(out_of_range)?;
        let lng = current.1.checked_sub(previous.1).ok_or_else(out_of_range)?;
        encode_value(lat, &mut out);
        encode_value(lng, &mut out);
        previous = current;
    }

    Ok(out)
}

/// Returns `true` if `degrees` is finite and within [`MAX_DEGREES`]
/// after scaling and rounding.
#[must_use]
pub fn is_encodable(degrees: f64) -> bool {
    scale(degrees).is_some()
}

/// Decode a polyline token back into a path.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token contains bytes outside the
/// polyline alphabet, ends mid-value, or overflows `i64`.
pub fn decode(token: &str) -> Result<Path, DecodeError> {
    let mut bytes = token.bytes().enumerate().peekable();
    let mut points = Vec::new();
    let mut lat = 0_i64;
    let mut lng = 0_i64;

    while bytes.peek().is_some() {
        lat = lat
            .checked_add(decode_value(&mut bytes)?)
            .ok_or(DecodeError::Overflow)?;
        if bytes.peek().is_none() {
            return Err(DecodeError::Truncated);
        }
        lng = lng
            .checked_add(decode_value(&mut bytes)?)
            .ok_or(DecodeError::Overflow)?;
        points.push(Coordinate::new(unscale(lat), unscale(lng)));
    }

    Ok(Path::new(points))
}

/// Degrees to wire units, or `None` if not finite or out of range.
#[allow(clippy::cast_possible_truncation)]
fn scale(degrees: f64) -> Option<i64> {
    let units = (degrees * FACTOR).round();
    (units.abs() <= MAX_UNITS).then_some(units as i64)
}

#[allow(clippy::cast_precision_loss)]
fn unscale(units: i64) -> f64 {
    units as f64 / FACTOR
}

/// Append one zig-zagged, group-encoded signed value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn encode_value(delta: i64, out: &mut String) {
    let mut value = (delta << 1) as u64;
    if delta < 0 {
        value = !value;
    }

    while value >= CONTINUATION {
        out.push(char::from(
            ((CONTINUATION | (value & GROUP_MASK)) as u8) + CHAR_OFFSET,
        ));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHAR_OFFSET));
}

/// Read one zig-zagged signed value.
#[allow(clippy::cast_possible_wrap)]
fn decode_value<I>(bytes: &mut I) -> Result<i64, DecodeError>
where
    I: Iterator<Item = (usize, u8)>,
{
    let mut result = 0_u64;
    let mut shift = 0_u32;

    loop {
        let (position, byte) = bytes.next().ok_or(DecodeError::Truncated)?;
        let group = match byte.checked_sub(CHAR_OFFSET) {
            Some(group) if group < 64 => u64::from(group),
            _ => return Err(DecodeError::InvalidCharacter { position, byte }),
        };
        let payload = group & GROUP_MASK;
        if shift == MAX_SHIFT && (payload >> (64 - MAX_SHIFT) != 0 || group & CONTINUATION != 0)
        {
            return Err(DecodeError::Overflow);
        }

        result |= payload << shift;
        if group & CONTINUATION == 0 {
            break;
        }
        shift += 5;
    }

    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !magnitude } else { magnitude })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Path {
        points
            .iter()
            .map(|&(lat, lng)| Coordinate::new(lat, lng))
            .collect()
    }

    fn assert_close(a: &Path, b: &Path) {
        assert_eq!(a.len(), b.len(), "point counts differ");
        for (i, (p, q)) in a.points().iter().zip(b.points()).enumerate() {
            assert!(
                (p.lat - q.lat).abs() <= 0.5e-5 + 1e-12 && (p.lng - q.lng).abs() <= 0.5e-5 + 1e-12,
                "point {i} differs: {p:?} vs {q:?}",
            );
        }
    }

    #[test]
    fn encodes_reference_example() {
        // Published example for the algorithm.
        let p = path(&[(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)]);
        assert_eq!(encode(&p).unwrap(), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn decodes_reference_example() {
        let decoded = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_close(
            &decoded,
            &path(&[(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)]),
        );
    }

    #[test]
    fn empty_round_trip() {
        assert_eq!(encode(&Path::default()).unwrap(), "");
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn origin_encodes_to_question_marks() {
        assert_eq!(encode(&path(&[(0.0, 0.0)])).unwrap(), "??");
    }

    #[test]
    fn negative_single_unit() {
        // -1 zig-zags to 1, which encodes as '@'.
        assert_eq!(encode(&path(&[(-0.000_01, 0.0)])).unwrap(), "@?");
    }

    #[test]
    fn round_trip_within_half_unit() {
        let points: Vec<(f64, f64)> = (0..1000)
            .map(|i| {
                let t = f64::from(i);
                ((t * 0.123_456_789).sin() * 89.0, (t * 0.987_654_321).cos() * 179.0)
            })
            .collect();
        let p = path(&points);
        assert_close(&decode(&encode(&p).unwrap()).unwrap(), &p);
    }

    #[test]
    fn rounding_error_does_not_accumulate() {
        // Each step is 0.4 units; naive float deltas would drift.
        let points: Vec<(f64, f64)> = (0..500)
            .map(|i| (f64::from(i) * 0.000_004, -f64::from(i) * 0.000_004))
            .collect();
        let p = path(&points);
        assert_close(&decode(&encode(&p).unwrap()).unwrap(), &p);
    }

    #[test]
    fn encoded_token_is_printable() {
        let p = path(&[(45.0, -73.0), (-33.9, 151.2), (0.0, 0.0)]);
        assert!(encode(&p).unwrap().bytes().all(|b| (63..=126).contains(&b)));
    }

    #[test]
    fn decode_rejects_out_of_alphabet() {
        assert_eq!(
            decode("?!"),
            Err(DecodeError::InvalidCharacter {
                position: 1,
                byte: b'!'
            })
        );
    }

    #[test]
    fn decode_rejects_dangling_continuation() {
        // '_' is 32 + 63: a continuation group with nothing after it.
        assert_eq!(decode("_"), Err(DecodeError::Truncated));
    }

    #[test]
    fn decode_rejects_latitude_without_longitude() {
        assert_eq!(decode("???"), Err(DecodeError::Truncated));
    }

    #[test]
    fn decode_rejects_overlong_value() {
        let token = "_".repeat(20);
        assert_eq!(decode(&token), Err(DecodeError::Overflow));
    }

    #[test]
    fn decode_rejects_bit_past_64() {
        // Twelve empty continuation groups put the next group at shift 60;
        // 'O' carries payload 0x10, which would land on bit 64.
        let token = format!("{}O?", "_".repeat(12));
        assert_eq!(decode(&token), Err(DecodeError::Overflow));

        // Payload 0x0f at shift 60 still fits.
        let token = format!("{}N?", "_".repeat(12));
        assert!(decode(&token).is_ok());
    }

    #[test]
    fn decode_rejects_running_sum_overflow() {
        let delta = i64::MAX / 2 + 1000;
        let mut token = String::new();
        for value in [delta, 0, delta, 0] {
            encode_value(value, &mut token);
        }
        assert_eq!(decode(&token), Err(DecodeError::Overflow));
    }

    #[test]
    fn encode_rejects_out_of_range_coordinates() {
        let p = path(&[(1e14, 0.0), (-1e14, 0.0)]);
        assert_eq!(
            encode(&p),
            Err(MapError::CoordinateOutOfRange { lat: 1e14, lng: 0.0 })
        );
        assert!(encode(&path(&[(0.0, f64::NAN)])).is_err());
    }

    #[test]
    fn encode_round_trips_huge_swings() {
        let p = path(&[(1e12, -1e12), (-1e12, 1e12), (0.0, 0.0)]);
        let decoded = decode(&encode(&p).unwrap()).unwrap();
        assert_eq!(decoded.points(), p.points());
    }
}
