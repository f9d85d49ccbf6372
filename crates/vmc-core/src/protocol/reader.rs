//! Zero-copy, lazily decoded view over an OSC datagram.
//!
//! [`MessageView::parse`] only reads the address and the type-tag string.
//! Arguments are decoded one at a time by [`MessageView::arguments`], so a
//! caller interested in the first few arguments never touches the rest, and
//! string arguments borrow from the datagram instead of allocating.

use crate::protocol::codec::{is_bundle, read_argument, read_padded_str, ProtocolError};
use crate::protocol::messages::{ArgumentRef, OscMessage, TypeTag, TYPE_TAG_MARKER};

/// A parsed OSC message header plus its still-encoded argument block.
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    address: &'a str,
    /// Type-tag characters with the leading `,` stripped.  All validated.
    type_tags: &'a [u8],
    data: &'a [u8],
    args_offset: usize,
}

impl<'a> MessageView<'a> {
    /// Parses the address and type tags of `bytes`.
    ///
    /// Every type-tag character is validated here, so the argument count is
    /// known up front.  Argument payloads are not read.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BundleNotSupported`] for bundles, and the
    /// usual string / type-tag errors for malformed headers.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        if is_bundle(bytes) {
            return Err(ProtocolError::BundleNotSupported);
        }

        let (address, offset) = read_padded_str(bytes, 0)?;
        let (tags, args_offset) = read_padded_str(bytes, offset)?;

        let tag_bytes = tags.as_bytes();
        if tag_bytes.first() != Some(&TYPE_TAG_MARKER) {
            return Err(ProtocolError::MissingTypeTagMarker(tags.to_string()));
        }
        let type_tags = &tag_bytes[1..];
        if let Some(&bad) = type_tags.iter().find(|t| TypeTag::try_from(**t).is_err()) {
            return Err(ProtocolError::UnsupportedTypeTag(bad as char));
        }

        Ok(Self {
            address,
            type_tags,
            data: bytes,
            args_offset,
        })
    }

    /// The OSC address pattern.
    pub fn address(&self) -> &'a str {
        self.address
    }

    /// Number of arguments declared by the type-tag string.
    pub fn argument_count(&self) -> usize {
        self.type_tags.len()
    }

    /// Iterates over the arguments in order, decoding each one on demand.
    ///
    /// The iterator yields at most one error and then stops.
    pub fn arguments(&self) -> Arguments<'a> {
        Arguments {
            data: self.data,
            tags: self.type_tags.iter(),
            offset: self.args_offset,
            failed: false,
        }
    }

    /// Reads `count` `f32` arguments starting at index `start`.
    ///
    /// Zero-filled when fewer than `start + count` arguments are declared.
    /// Arguments after `start + count` are never decoded.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if an argument up to the end of the range
    /// is truncated.
    pub fn read_floats(&self, start: usize, count: usize) -> Result<Vec<f32>, ProtocolError> {
        let mut result = vec![0.0; count];
        let Some(end) = start.checked_add(count) else {
            return Ok(result);
        };
        if end > self.argument_count() {
            return Ok(result);
        }
        for (index, arg) in self.arguments().take(end).enumerate() {
            let arg = arg?;
            if index >= start {
                result[index - start] = arg.as_f32().unwrap_or(0.0);
            }
        }
        Ok(result)
    }

    /// Decodes every argument into an owned [`OscMessage`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] hit while decoding arguments.
    pub fn to_message(&self) -> Result<OscMessage, ProtocolError> {
        let arguments = self
            .arguments()
            .map(|arg| arg.map(Into::into))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OscMessage::new(self.address, arguments))
    }
}

/// Lazy argument iterator returned by [`MessageView::arguments`].
#[derive(Debug, Clone)]
pub struct Arguments<'a> {
    data: &'a [u8],
    tags: std::slice::Iter<'a, u8>,
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for Arguments<'a> {
    type Item = Result<ArgumentRef<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let &raw = self.tags.next()?;
        let result = TypeTag::try_from(raw)
            .map_err(|_| ProtocolError::UnsupportedTypeTag(raw as char))
            .and_then(|tag| read_argument(self.data, self.offset, tag));

        match result {
            Ok((arg, next)) => {
                self.offset = next;
                Some(Ok(arg))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.tags.len()))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_message;
    use crate::protocol::messages::{Argument, BONE_TRANSFORM_ADDRESS};

    fn bone_bytes(name: &str) -> Vec<u8> {
        encode_message(&OscMessage::bone_transform(
            name,
            [0.5, 1.0, 1.5],
            [0.0, 0.707, 0.0, 0.707],
        ))
        .unwrap()
    }

    #[test]
    fn test_parse_exposes_address_and_argument_count() {
        // Arrange
        let bytes = bone_bytes("Spine");

        // Act
        let view = MessageView::parse(&bytes).unwrap();

        // Assert
        assert_eq!(view.address(), BONE_TRANSFORM_ADDRESS);
        assert_eq!(view.argument_count(), 8);
    }

    #[test]
    fn test_first_argument_borrows_bone_name() {
        let bytes = bone_bytes("LeftUpperArm");
        let view = MessageView::parse(&bytes).unwrap();

        let first = view.arguments().next().unwrap().unwrap();

        assert_eq!(first.as_str(), Some("LeftUpperArm"));
    }

    #[test]
    fn test_read_floats_matches_position_and_rotation() {
        let bytes = bone_bytes("Spine");
        let view = MessageView::parse(&bytes).unwrap();

        assert_eq!(view.read_floats(1, 3).unwrap(), vec![0.5, 1.0, 1.5]);
        assert_eq!(view.read_floats(4, 4).unwrap(), vec![0.0, 0.707, 0.0, 0.707]);
    }

    #[test]
    fn test_read_floats_beyond_declared_arguments_is_zero_filled() {
        let bytes = encode_message(&OscMessage::new(
            BONE_TRANSFORM_ADDRESS,
            vec![Argument::String("Hips".into()), Argument::Float32(1.0)],
        ))
        .unwrap();
        let view = MessageView::parse(&bytes).unwrap();

        assert_eq!(view.read_floats(1, 3).unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_floats_overflowing_range_is_zero_filled() {
        // Arrange
        let bytes = bone_bytes("Hips");
        let view = MessageView::parse(&bytes).unwrap();

        // Act
        let floats = view.read_floats(usize::MAX, 1);

        // Assert
        assert_eq!(floats.unwrap(), vec![0.0]);
    }

    #[test]
    fn test_read_floats_does_not_decode_past_the_range() {
        // Arrange: a valid name + 3 floats, then a declared int that is truncated
        let mut bytes = b"/a\0\0,sfffi\0\0".to_vec();
        bytes.extend_from_slice(b"Hips\0\0\0\0");
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let view = MessageView::parse(&bytes).unwrap();

        // Act
        let floats = view.read_floats(1, 3);

        // Assert: the range is readable even though the full message is not
        assert_eq!(floats.unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(view.to_message().is_err());
    }

    #[test]
    fn test_arguments_iterator_stops_after_first_error() {
        let bytes = b"/a\0\0,ii\0\0\0\0\x01";
        let view = MessageView::parse(bytes).unwrap();

        let mut args = view.arguments();

        assert_eq!(args.next(), Some(Ok(ArgumentRef::Int32(1))));
        assert!(matches!(args.next(), Some(Err(ProtocolError::InsufficientData { .. }))));
        assert_eq!(args.next(), None);
    }

    #[test]
    fn test_parse_rejects_unsupported_tag_before_reading_arguments() {
        let bytes = b"/a\0\0,fb\0";
        assert_eq!(
            MessageView::parse(bytes).unwrap_err(),
            ProtocolError::UnsupportedTypeTag('b')
        );
    }
}
