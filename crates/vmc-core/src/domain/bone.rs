//! Bone-transform classification.
//!
//! Decides, per datagram, whether it is a rotation update for a bone we track
//! (a *candidate* for the rotation filter) or something to pass through
//! untouched.
//!
//! # Two tiers
//!
//! Most VMC traffic is bone updates for bones we do not care about, plus blend
//! shapes, root transforms and timing messages.  Decoding all of it would be
//! wasted work, so [`BoneClassifier::classify`] first runs
//! [`BoneClassifier::might_be_candidate`], a plain byte search:
//!
//! 1. the address (bytes before the first NUL) must contain
//!    [`BONE_TRANSFORM_ADDRESS`], and
//! 2. at least one tracked bone name must occur somewhere in the datagram.
//!
//! Only datagrams that pass this check are parsed with a zero-copy
//! [`MessageView`], and only then is argument 0 compared for exact equality.
//! The byte check can yield false positives (e.g. `"LeftHand"` inside
//! `"LeftHandThumb"`) but never false negatives, so it changes nothing about
//! the result, only about its cost.

use std::collections::HashSet;

use crate::domain::rotation::{Quaternion, Vec3};
use crate::protocol::codec::{is_bundle, read_float_arguments, ProtocolError};
use crate::protocol::messages::{ArgumentRef, OscMessage, BONE_TRANSFORM_ADDRESS};
use crate::protocol::reader::MessageView;

/// Bones tracked when no list is configured: the arm chain and hands.
pub const DEFAULT_TRACKED_BONES: [&str; 6] = [
    "LeftUpperArm",
    "RightUpperArm",
    "LeftLowerArm",
    "RightLowerArm",
    "LeftHand",
    "RightHand",
];

/// A decoded bone update selected for filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTransform {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quaternion,
}

impl BoneTransform {
    fn from_floats(name: &str, floats: &[f32]) -> Self {
        Self {
            name: name.to_string(),
            position: Vec3::new(floats[0], floats[1], floats[2]),
            rotation: Quaternion::new(floats[3], floats[4], floats[5], floats[6]),
        }
    }
}

/// Outcome of classifying one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Forward the datagram unchanged; the filter is not consulted.
    PassThrough,
    /// A tracked bone update that must go through the rotation filter.
    Candidate(BoneTransform),
}

/// Selects bone-transform messages for tracked bones.
#[derive(Debug, Clone)]
pub struct BoneClassifier {
    tracked: HashSet<String>,
}

impl BoneClassifier {
    /// Creates a classifier for the given bone names.
    pub fn new<I, S>(tracked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracked: tracked.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if `name` is a tracked bone.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked.contains(name)
    }

    /// Number of tracked bone names.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Cheap byte-level pre-check.  `false` means the datagram is certainly
    /// not a candidate.
    pub fn might_be_candidate(&self, datagram: &[u8]) -> bool {
        let address_end = datagram
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(datagram.len());
        if !contains_bytes(&datagram[..address_end], BONE_TRANSFORM_ADDRESS.as_bytes()) {
            return false;
        }
        self.tracked
            .iter()
            .any(|name| contains_bytes(datagram, name.as_bytes()))
    }

    /// Classifies a raw datagram.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::BundleNotSupported`] for OSC bundles.
    /// - Any decode error from a datagram that passed the byte pre-check.
    pub fn classify(&self, datagram: &[u8]) -> Result<Classification, ProtocolError> {
        if is_bundle(datagram) {
            return Err(ProtocolError::BundleNotSupported);
        }
        if !self.might_be_candidate(datagram) {
            return Ok(Classification::PassThrough);
        }

        let view = MessageView::parse(datagram)?;
        if !view.address().contains(BONE_TRANSFORM_ADDRESS) {
            return Ok(Classification::PassThrough);
        }
        // No string in argument 0 means no bone name, so nothing to filter.
        let name = match view.arguments().next() {
            Some(Ok(ArgumentRef::String(name))) => name,
            Some(Err(e)) => return Err(e),
            _ => return Ok(Classification::PassThrough),
        };
        if !self.is_tracked(name) {
            return Ok(Classification::PassThrough);
        }

        let floats = view.read_floats(1, 7)?;
        Ok(Classification::Candidate(BoneTransform::from_floats(
            name, &floats,
        )))
    }

    /// Applies the same predicate as [`classify`](Self::classify) to an
    /// already decoded message.
    ///
    /// # Errors
    ///
    /// Currently infallible; returns `Result` to mirror [`classify`](Self::classify).
    pub fn classify_decoded(&self, msg: &OscMessage) -> Result<Classification, ProtocolError> {
        if !msg.address.contains(BONE_TRANSFORM_ADDRESS) {
            return Ok(Classification::PassThrough);
        }
        let Some(name) = msg.arguments.first().and_then(|arg| arg.as_str()) else {
            return Ok(Classification::PassThrough);
        };
        if !self.is_tracked(name) {
            return Ok(Classification::PassThrough);
        }

        let floats = read_float_arguments(msg, 1, 7);
        Ok(Classification::Candidate(BoneTransform::from_floats(
            name, &floats,
        )))
    }
}

impl Default for BoneClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKED_BONES)
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{decode_message, encode_message};
    use crate::protocol::messages::Argument;

    fn bone_bytes(name: &str, rotation: [f32; 4]) -> Vec<u8> {
        encode_message(&OscMessage::bone_transform(name, [0.1, 0.2, 0.3], rotation)).unwrap()
    }

    fn classifier() -> BoneClassifier {
        BoneClassifier::default()
    }

    #[test]
    fn test_tracked_bone_is_candidate_with_decoded_transform() {
        // Arrange
        let bytes = bone_bytes("LeftUpperArm", [0.0, 0.5, 0.0, 0.866]);

        // Act
        let result = classifier().classify(&bytes).unwrap();

        // Assert
        assert_eq!(
            result,
            Classification::Candidate(BoneTransform {
                name: "LeftUpperArm".to_string(),
                position: Vec3::new(0.1, 0.2, 0.3),
                rotation: Quaternion::new(0.0, 0.5, 0.0, 0.866),
            })
        );
    }

    #[test]
    fn test_untracked_bone_passes_through() {
        let bytes = bone_bytes("Spine", [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(classifier().classify(&bytes).unwrap(), Classification::PassThrough);
    }

    #[test]
    fn test_name_prefix_of_tracked_bone_passes_through() {
        // "LeftHandThumbProximal" contains "LeftHand" so the byte check passes,
        // but the exact name comparison must reject it.
        let bytes = bone_bytes("LeftHandThumbProximal", [0.0, 0.0, 0.0, 1.0]);
        let c = classifier();

        assert!(c.might_be_candidate(&bytes));
        assert_eq!(c.classify(&bytes).unwrap(), Classification::PassThrough);
    }

    #[test]
    fn test_other_address_passes_through_even_with_tracked_name() {
        // Arrange: a blend-shape message whose argument happens to be a bone name
        let msg = OscMessage::new(
            "/VMC/Ext/Blend/Val",
            vec![Argument::String("LeftHand".into()), Argument::Float32(1.0)],
        );
        let bytes = encode_message(&msg).unwrap();

        // Act / Assert
        assert!(!classifier().might_be_candidate(&bytes));
        assert_eq!(classifier().classify(&bytes).unwrap(), Classification::PassThrough);
    }

    #[test]
    fn test_marker_only_in_argument_region_does_not_pass_precheck() {
        let msg = OscMessage::new(
            "/VMC/Ext/Note",
            vec![Argument::String("/VMC/Ext/Bone/Pos LeftHand".into())],
        );
        let bytes = encode_message(&msg).unwrap();

        assert!(!classifier().might_be_candidate(&bytes));
    }

    #[test]
    fn test_garbage_without_marker_passes_through_without_decoding() {
        let bytes = [0xFFu8, 0x00, 0x13, 0x37];
        assert_eq!(classifier().classify(&bytes).unwrap(), Classification::PassThrough);
    }

    #[test]
    fn test_bundle_is_rejected() {
        let mut bytes = b"#bundle\0".to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        assert_eq!(
            classifier().classify(&bytes).unwrap_err(),
            ProtocolError::BundleNotSupported
        );
    }

    #[test]
    fn test_marker_message_without_string_name_passes_through() {
        // Arrange: tracked name appears only as a trailing string argument
        let with_name = OscMessage::new(
            BONE_TRANSFORM_ADDRESS,
            vec![Argument::Float32(1.0), Argument::String("LeftHand".into())],
        );
        let without_name = OscMessage::new(BONE_TRANSFORM_ADDRESS, vec![Argument::Float32(1.0)]);

        for msg in [with_name, without_name] {
            let bytes = encode_message(&msg).unwrap();

            // Act
            let raw = classifier().classify(&bytes);
            let decoded = classifier().classify_decoded(&msg);

            // Assert
            assert_eq!(raw, Ok(Classification::PassThrough));
            assert_eq!(decoded, Ok(Classification::PassThrough));
        }
    }

    #[test]
    fn test_short_argument_list_zero_fills_transform() {
        let msg = OscMessage::new(
            BONE_TRANSFORM_ADDRESS,
            vec![Argument::String("RightHand".into()), Argument::Float32(1.0)],
        );
        let bytes = encode_message(&msg).unwrap();

        let Classification::Candidate(bone) = classifier().classify(&bytes).unwrap() else {
            panic!("expected candidate");
        };

        assert_eq!(bone.position, Vec3::default());
        assert_eq!(bone.rotation, Quaternion::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_truncated_candidate_reports_decode_error() {
        let mut bytes = bone_bytes("LeftHand", [0.0, 0.0, 0.0, 1.0]);
        bytes.truncate(bytes.len() - 2);

        assert!(matches!(
            classifier().classify(&bytes),
            Err(ProtocolError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_byte_tier_and_decoded_tier_agree() {
        // Arrange
        let c = BoneClassifier::new(["Head", "LeftHand"]);
        let messages = vec![
            OscMessage::bone_transform("Head", [0.0; 3], [0.0, 0.0, 0.0, 1.0]),
            OscMessage::bone_transform("LeftHand", [1.0; 3], [0.1, 0.2, 0.3, 0.9]),
            OscMessage::bone_transform("LeftHandIndex", [0.0; 3], [0.0, 0.0, 0.0, 1.0]),
            OscMessage::bone_transform("Hips", [0.0; 3], [0.0, 0.0, 0.0, 1.0]),
            OscMessage::new("/VMC/Ext/Root/Pos", vec![Argument::String("Head".into())]),
            OscMessage::new("/VMC/Ext/T", vec![Argument::Float32(12.5)]),
            OscMessage::new(BONE_TRANSFORM_ADDRESS, vec![Argument::Float32(1.0)]),
            OscMessage::new(
                BONE_TRANSFORM_ADDRESS,
                vec![Argument::Float32(1.0), Argument::String("LeftHand".into())],
            ),
            OscMessage::new(BONE_TRANSFORM_ADDRESS, Vec::new()),
        ];

        for msg in &messages {
            let bytes = encode_message(msg).unwrap();

            // Act
            let raw = c.classify(&bytes).unwrap();
            let decoded = c.classify_decoded(&decode_message(&bytes).unwrap()).unwrap();

            // Assert
            assert_eq!(raw, decoded, "tiers disagree for {}", msg.address);
        }
    }

    #[test]
    fn test_custom_tracked_set() {
        let c = BoneClassifier::new(vec!["Spine".to_string()]);
        assert_eq!(c.tracked_count(), 1);
        assert!(c.is_tracked("Spine"));
        assert!(!c.is_tracked("LeftHand"));
    }
}
