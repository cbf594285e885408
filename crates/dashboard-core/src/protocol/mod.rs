//! Protocol module containing channel message types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_event, encode_command, try_decode_event, CodecError, DecodeError, DASHBOARD_NAMESPACE,
};
pub use messages::*;
