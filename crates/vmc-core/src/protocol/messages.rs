//! OSC message types relayed by the VMC relay.
//!
//! Only the subset of OSC 1.0 that VMC senders actually emit is modelled:
//! 32/64-bit integers, 32/64-bit floats and padded strings.  Bundles are
//! recognised so they can be rejected, but are never parsed.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Every padded element on the wire is aligned to this many bytes.
pub const OSC_ALIGNMENT: usize = 4;

/// First byte of every type-tag string.
pub const TYPE_TAG_MARKER: u8 = b',';

/// Leading bytes of an OSC bundle (`"#bundle"` plus its NUL terminator).
pub const BUNDLE_PREFIX: &[u8] = b"#bundle\0";

/// Address segment identifying a VMC bone position/rotation update.
///
/// Arguments of such a message: `s` bone name, `fff` position,
/// `ffff` rotation quaternion (X, Y, Z, W).
pub const BONE_TRANSFORM_ADDRESS: &str = "/VMC/Ext/Bone/Pos";

// ── Type tags ─────────────────────────────────────────────────────────────────

/// The argument type tags this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Int32 = b'i',
    Int64 = b'h',
    Float32 = b'f',
    Float64 = b'd',
    String = b's',
}

impl TypeTag {
    /// The tag character as it appears on the wire.
    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'i' => Ok(TypeTag::Int32),
            b'h' => Ok(TypeTag::Int64),
            b'f' => Ok(TypeTag::Float32),
            b'd' => Ok(TypeTag::Float64),
            b's' => Ok(TypeTag::String),
            _ => Err(()),
        }
    }
}

// ── Arguments ─────────────────────────────────────────────────────────────────

/// A decoded, owned OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Argument {
    /// The type tag that encodes this argument.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Argument::Int32(_) => TypeTag::Int32,
            Argument::Int64(_) => TypeTag::Int64,
            Argument::Float32(_) => TypeTag::Float32,
            Argument::Float64(_) => TypeTag::Float64,
            Argument::String(_) => TypeTag::String,
        }
    }

    /// Returns the value if this is a [`Argument::Float32`].
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Argument::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value if this is a [`Argument::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A decoded OSC argument that borrows string data from the datagram.
///
/// Produced by [`crate::protocol::reader::MessageView`] so that the classifier
/// can inspect a bone name without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgumentRef<'a> {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(&'a str),
}

impl<'a> ArgumentRef<'a> {
    /// Returns the value if this is a [`ArgumentRef::Float32`].
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ArgumentRef::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the borrowed string if this is a [`ArgumentRef::String`].
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ArgumentRef::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ArgumentRef<'_>> for Argument {
    fn from(arg: ArgumentRef<'_>) -> Self {
        match arg {
            ArgumentRef::Int32(v) => Argument::Int32(v),
            ArgumentRef::Int64(v) => Argument::Int64(v),
            ArgumentRef::Float32(v) => Argument::Float32(v),
            ArgumentRef::Float64(v) => Argument::Float64(v),
            ArgumentRef::String(s) => Argument::String(s.to_string()),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A single decoded OSC message: an address pattern plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OscMessage {
    pub address: String,
    pub arguments: Vec<Argument>,
}

impl OscMessage {
    /// Creates a message with the given address and arguments.
    pub fn new(address: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            address: address.into(),
            arguments,
        }
    }

    /// Appends an argument.
    pub fn push(&mut self, arg: Argument) {
        self.arguments.push(arg);
    }

    /// Returns the number of arguments.
    pub fn count_arguments(&self) -> usize {
        self.arguments.len()
    }

    /// Builds a VMC bone-transform message, mostly useful for tests and fixtures.
    pub fn bone_transform(name: &str, position: [f32; 3], rotation: [f32; 4]) -> Self {
        let mut arguments = Vec::with_capacity(8);
        arguments.push(Argument::String(name.to_string()));
        arguments.extend(position.iter().map(|v| Argument::Float32(*v)));
        arguments.extend(rotation.iter().map(|v| Argument::Float32(*v)));
        Self::new(BONE_TRANSFORM_ADDRESS, arguments)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
