//! Binary codec for OSC messages as emitted by VMC senders.
//!
//! Wire format:
//! ```text
//! [address\0 + pad][,tags\0 + pad][arg 0][arg 1]...
//! ```
//! Every string is NUL-terminated and zero-padded so that its length,
//! terminator included, is a multiple of 4.  Numeric arguments are fixed-width
//! big-endian.  Bytes after the last declared argument are ignored.
//!
//! The relay forwards raw datagrams and never re-encodes them.
//! [`encode_message`] exists for tests, benchmarks and fixture generation.

use thiserror::Error;

use crate::protocol::messages::{
    Argument, ArgumentRef, OscMessage, TypeTag, BUNDLE_PREFIX, OSC_ALIGNMENT,
};
use crate::protocol::reader::MessageView;

/// Errors that can occur while decoding or encoding an OSC message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// The byte slice ends before a declared element (argument or padding).
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// No NUL terminator was found for the string starting at `offset`.
    #[error("unterminated string at offset {offset}")]
    UnterminatedString { offset: usize },

    /// The string starting at `offset` is not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// The type-tag string does not begin with `,`.
    #[error("type tag string must start with ',': {0:?}")]
    MissingTypeTagMarker(String),

    /// A type-tag character this codec does not support.
    #[error("unsupported type tag: {0:?}")]
    UnsupportedTypeTag(char),

    /// The datagram is an OSC bundle; bundles are rejected, never parsed.
    #[error("OSC bundles are not supported")]
    BundleNotSupported,

    /// The message is well-formed OSC but its content is not usable.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one complete [`OscMessage`] from `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are truncated, a string is not
/// terminated or not UTF-8, the type tags are invalid, or `bytes` is a bundle.
///
/// # Examples
///
/// ```rust
/// use vmc_core::protocol::{decode_message, encode_message};
/// use vmc_core::protocol::messages::{Argument, OscMessage};
///
/// let msg = OscMessage::new("/VMC/Ext/OK", vec![Argument::Int32(1)]);
/// let bytes = encode_message(&msg).unwrap();
/// assert_eq!(decode_message(&bytes).unwrap(), msg);
/// ```
pub fn decode_message(bytes: &[u8]) -> Result<OscMessage, ProtocolError> {
    MessageView::parse(bytes)?.to_message()
}

/// Encodes `msg` into the OSC wire format.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the address or a string
/// argument contains an interior NUL byte, which cannot be represented.
pub fn encode_message(msg: &OscMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut tags = String::with_capacity(msg.arguments.len() + 1);
    tags.push(',');
    tags.extend(msg.arguments.iter().map(|a| a.type_tag().as_char()));

    let mut buf = Vec::with_capacity(padded_len(msg.address.len()) + padded_len(tags.len()));
    write_padded_str(&mut buf, &msg.address)?;
    write_padded_str(&mut buf, &tags)?;

    for arg in &msg.arguments {
        match arg {
            Argument::Int32(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Argument::Int64(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Argument::Float32(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Argument::Float64(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Argument::String(s) => write_padded_str(&mut buf, s)?,
        }
    }
    Ok(buf)
}

/// Returns `true` if `bytes` starts with the OSC bundle marker.
pub fn is_bundle(bytes: &[u8]) -> bool {
    bytes.starts_with(BUNDLE_PREFIX)
}

/// Returns the on-wire size of a string of `len` bytes: the bytes, one NUL
/// terminator, then `(4 - (len + 1) % 4) % 4` zero bytes.
pub fn padded_len(len: usize) -> usize {
    let with_nul = len + 1;
    with_nul + (OSC_ALIGNMENT - with_nul % OSC_ALIGNMENT) % OSC_ALIGNMENT
}

/// Reads `count` `f32` arguments starting at index `start`.
///
/// If the message has fewer than `start + count` arguments the result is
/// all zeros.  A non-`f32` argument inside the range yields `0.0` at its
/// position.
pub fn read_float_arguments(msg: &OscMessage, start: usize, count: usize) -> Vec<f32> {
    let mut result = vec![0.0; count];
    let Some(end) = start.checked_add(count) else {
        return result;
    };
    let Some(slice) = msg.arguments.get(start..end) else {
        return result;
    };
    for (slot, arg) in result.iter_mut().zip(slice) {
        if let Some(v) = arg.as_f32() {
            *slot = v;
        }
    }
    result
}

// ── Crate-internal read helpers ───────────────────────────────────────────────

/// Reads a NUL-terminated, 4-byte padded string starting at `offset`.
///
/// Returns the string (without terminator) and the offset of the next element.
pub(crate) fn read_padded_str(buf: &[u8], offset: usize) -> Result<(&str, usize), ProtocolError> {
    let rest = buf.get(offset..).unwrap_or(&[]);
    let nul = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or(ProtocolError::UnterminatedString { offset })?;

    let end = offset + padded_len(nul);
    if buf.len() < end {
        return Err(ProtocolError::InsufficientData {
            needed: end,
            available: buf.len(),
        });
    }

    let s = std::str::from_utf8(&rest[..nul]).map_err(|_| ProtocolError::InvalidUtf8 { offset })?;
    Ok((s, end))
}

/// Reads one argument of type `tag` at `offset`.
///
/// Returns the argument and the offset of the next element.
pub(crate) fn read_argument(
    buf: &[u8],
    offset: usize,
    tag: TypeTag,
) -> Result<(ArgumentRef<'_>, usize), ProtocolError> {
    match tag {
        TypeTag::Int32 => {
            let raw = read_array::<4>(buf, offset)?;
            Ok((ArgumentRef::Int32(i32::from_be_bytes(raw)), offset + 4))
        }
        TypeTag::Int64 => {
            let raw = read_array::<8>(buf, offset)?;
            Ok((ArgumentRef::Int64(i64::from_be_bytes(raw)), offset + 8))
        }
        TypeTag::Float32 => {
            let raw = read_array::<4>(buf, offset)?;
            Ok((ArgumentRef::Float32(f32::from_be_bytes(raw)), offset + 4))
        }
        TypeTag::Float64 => {
            let raw = read_array::<8>(buf, offset)?;
            Ok((ArgumentRef::Float64(f64::from_be_bytes(raw)), offset + 8))
        }
        TypeTag::String => {
            let (s, next) = read_padded_str(buf, offset)?;
            Ok((ArgumentRef::String(s), next))
        }
    }
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], ProtocolError> {
    buf.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or(ProtocolError::InsufficientData {
            needed: offset + N,
            available: buf.len(),
        })
}

/// Writes the string bytes, a NUL terminator and the alignment padding.
fn write_padded_str(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtocolError> {
    if s.as_bytes().contains(&0) {
        return Err(ProtocolError::MalformedPayload(format!(
            "string contains an interior NUL byte: {s:?}"
        )));
    }
    let start = buf.len();
    buf.extend_from_slice(s.as_bytes());
    buf.resize(start + padded_len(s.len()), 0);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::BONE_TRANSFORM_ADDRESS;

    fn round_trip(msg: &OscMessage) -> OscMessage {
        let encoded = encode_message(msg).expect("encode failed");
        assert_eq!(encoded.len() % 4, 0, "encoded message must stay 4-byte aligned");
        decode_message(&encoded).expect("decode failed")
    }

    // ── Known byte layouts ───────────────────────────────────────────────────

    #[test]
    fn test_decode_hand_built_int_message() {
        // Arrange: "/ping" (5 + NUL + 2 pad), ",i" (2 + NUL + 1 pad), 7i32
        let bytes = [
            b'/', b'p', b'i', b'n', b'g', 0, 0, 0, //
            b',', b'i', 0, 0, //
            0, 0, 0, 7,
        ];

        // Act
        let msg = decode_message(&bytes).unwrap();

        // Assert
        assert_eq!(msg.address, "/ping");
        assert_eq!(msg.arguments, vec![Argument::Int32(7)]);
    }

    #[test]
    fn test_encode_address_of_exact_multiple_minus_one_gets_no_padding() {
        // "/abc" is 4 bytes + NUL = 5 → padded to 8; "/ab" is 3 + NUL = 4 → no padding.
        let msg = OscMessage::new("/ab", vec![]);
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(&bytes[..4], b"/ab\0");
        assert_eq!(&bytes[4..8], b",\0\0\0");
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn test_encode_bone_transform_layout() {
        // Arrange
        let msg = OscMessage::bone_transform("Hips", [0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]);

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert: address 17 + NUL → 20; tags ",sfffffff" 9 + NUL → 12; "Hips" → 8; 7 floats → 28
        assert_eq!(bytes.len(), 20 + 12 + 8 + 28);
        assert_eq!(&bytes[20..32], b",sfffffff\0\0\0");
        assert_eq!(&bytes[32..40], b"Hips\0\0\0\0");
        assert_eq!(&bytes[40..44], &0.0f32.to_be_bytes());
        assert_eq!(&bytes[44..48], &1.0f32.to_be_bytes());
    }

    // ── Round trips ──────────────────────────────────────────────────────────

    #[test]
    fn test_round_trip_every_supported_type() {
        let msg = OscMessage::new(
            "/VMC/Ext/Test",
            vec![
                Argument::Int32(-42),
                Argument::Int64(i64::MAX),
                Argument::Float32(3.5),
                Argument::Float64(-0.000_001),
                Argument::String("LeftUpperArm".to_string()),
                Argument::String(String::new()),
                Argument::Int32(i32::MIN),
            ],
        );
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_round_trip_bone_transform() {
        let msg = OscMessage::bone_transform(
            "RightHand",
            [0.25, 1.5, -0.125],
            [0.1, 0.2, 0.3, 0.927_361_8],
        );
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_round_trip_zero_arguments() {
        let msg = OscMessage::new("/VMC/Ext/T", vec![]);
        let decoded = round_trip(&msg);
        assert_eq!(decoded, msg);
        assert_eq!(decoded.count_arguments(), 0);
    }

    #[test]
    fn test_round_trip_string_lengths_around_alignment() {
        for len in 0..=9 {
            let name = "x".repeat(len);
            let msg = OscMessage::new("/s", vec![Argument::String(name), Argument::Int32(len as i32)]);
            assert_eq!(round_trip(&msg), msg, "string of length {len}");
        }
    }

    #[test]
    fn test_round_trip_utf8_string() {
        let msg = OscMessage::new(
            "/VMC/Ext/Blend/Val",
            vec![Argument::String("あ".to_string()), Argument::Float32(0.5)],
        );
        assert_eq!(round_trip(&msg), msg);
    }

    // ── Padding law ──────────────────────────────────────────────────────────

    #[test]
    fn test_padded_len_is_minimal_multiple_of_four() {
        for len in 0..64 {
            let padded = padded_len(len);
            assert_eq!(padded % 4, 0, "len {len}");
            assert!(padded > len, "terminator must fit for len {len}");
            assert!(padded - (len + 1) < 4, "padding must be minimal for len {len}");
        }
    }

    #[test]
    fn test_padded_len_known_values() {
        assert_eq!(padded_len(0), 4);
        assert_eq!(padded_len(3), 4);
        assert_eq!(padded_len(4), 8);
        assert_eq!(padded_len(7), 8);
        assert_eq!(padded_len(8), 12);
    }

    // ── Error conditions ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_empty_bytes_returns_unterminated_string() {
        assert_eq!(
            decode_message(&[]),
            Err(ProtocolError::UnterminatedString { offset: 0 })
        );
    }

    #[test]
    fn test_decode_missing_address_padding_returns_insufficient_data() {
        // "/ping\0" without the two padding bytes
        let result = decode_message(b"/ping\0");
        assert!(matches!(result, Err(ProtocolError::InsufficientData { needed: 8, available: 6 })));
    }

    #[test]
    fn test_decode_missing_type_tag_string_is_rejected() {
        let result = decode_message(b"/abc\0\0\0\0");
        assert_eq!(result, Err(ProtocolError::UnterminatedString { offset: 8 }));
    }

    #[test]
    fn test_decode_type_tags_without_marker_are_rejected() {
        let result = decode_message(b"/ab\0if\0\0");
        assert_eq!(result, Err(ProtocolError::MissingTypeTagMarker("if".to_string())));
    }

    #[test]
    fn test_decode_empty_type_tag_string_is_rejected() {
        let result = decode_message(b"/ab\0\0\0\0\0");
        assert_eq!(result, Err(ProtocolError::MissingTypeTagMarker(String::new())));
    }

    #[test]
    fn test_decode_unsupported_type_tag_is_rejected() {
        let result = decode_message(b"/ab\0,T\0\0");
        assert_eq!(result, Err(ProtocolError::UnsupportedTypeTag('T')));
    }

    #[test]
    fn test_decode_truncated_float_returns_insufficient_data() {
        // Arrange: declare two floats but supply one and a half
        let mut bytes = b"/ab\0,ff\0".to_vec();
        bytes.extend_from_slice(&1.0f32.to_be_bytes());
        bytes.extend_from_slice(&[0x3F, 0x80]);

        // Act
        let result = decode_message(&bytes);

        // Assert
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData { needed: 16, available: 14 })
        );
    }

    #[test]
    fn test_decode_truncated_int64_returns_insufficient_data() {
        let mut bytes = b"/ab\0,h\0\0".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 1]);
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_decode_unterminated_string_argument_is_rejected() {
        let bytes = b"/ab\0,s\0\0Hips";
        assert_eq!(
            decode_message(bytes),
            Err(ProtocolError::UnterminatedString { offset: 8 })
        );
    }

    #[test]
    fn test_decode_invalid_utf8_address_is_rejected() {
        let bytes = [b'/', 0xFF, 0xFE, 0, b',', 0, 0, 0];
        assert_eq!(decode_message(&bytes), Err(ProtocolError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_decode_bundle_is_rejected() {
        let mut bytes = BUNDLE_PREFIX.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode_message(&bytes), Err(ProtocolError::BundleNotSupported));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut bytes = encode_message(&OscMessage::new("/a", vec![Argument::Int32(5)])).unwrap();
        bytes.extend_from_slice(&[0xAA; 4]);
        let msg = decode_message(&bytes).unwrap();
        assert_eq!(msg.arguments, vec![Argument::Int32(5)]);
    }

    #[test]
    fn test_encode_interior_nul_is_rejected() {
        let msg = OscMessage::new("/a\0b", vec![]);
        assert!(matches!(
            encode_message(&msg),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    // ── Bundle detection ──────────────────────────────────────────────────────

    #[test]
    fn test_is_bundle_detects_prefix_only() {
        assert!(is_bundle(b"#bundle\0\0\0\0\0\0\0\0\x01"));
        assert!(!is_bundle(b"#bundl"));
        assert!(!is_bundle(BONE_TRANSFORM_ADDRESS.as_bytes()));
    }

    // ── read_float_arguments ──────────────────────────────────────────────────

    #[test]
    fn test_read_float_arguments_reads_position() {
        let msg = OscMessage::bone_transform("Hips", [1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(read_float_arguments(&msg, 1, 3), vec![1.0, 2.0, 3.0]);
        assert_eq!(read_float_arguments(&msg, 4, 4), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_read_float_arguments_out_of_range_is_zero_filled() {
        // Arrange: only 3 arguments, ask for indices 1..=3
        let msg = OscMessage::new(
            "/a",
            vec![Argument::String("x".into()), Argument::Float32(1.0), Argument::Float32(2.0)],
        );

        // Act
        let floats = read_float_arguments(&msg, 1, 3);

        // Assert
        assert_eq!(floats, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_float_arguments_non_float_slot_is_zero() {
        let msg = OscMessage::new(
            "/a",
            vec![Argument::Float32(1.0), Argument::Int32(9), Argument::Float32(3.0)],
        );
        assert_eq!(read_float_arguments(&msg, 0, 3), vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_read_float_arguments_overflowing_range_is_zero_filled() {
        // Arrange
        let msg = OscMessage::bone_transform("Hips", [1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 1.0]);

        // Act
        let floats = read_float_arguments(&msg, usize::MAX, 2);

        // Assert
        assert_eq!(floats, vec![0.0, 0.0]);
    }
}
