//! Protocol module containing OSC message types, the binary codec and a
//! borrowed reader over raw datagrams.

pub mod codec;
pub mod messages;
pub mod reader;

pub use codec::{
    decode_message, encode_message, is_bundle, padded_len, read_float_arguments, ProtocolError,
};
pub use messages::*;
pub use reader::{Arguments, MessageView};
