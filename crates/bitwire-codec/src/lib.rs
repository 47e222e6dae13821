//! Packed bitfields, bounded enums and fixed-layout messages over byte buffers.
//!
//! Every multi-byte value is stored in network byte order (big-endian) and
//! converted on each access:
//! - [`wire_bitfield!`] declares sub-integer fields inside one word
//! - [`wire_enum!`] declares a bounded integer codec with an invalid sentinel
//! - [`wire_message!`] declares packed fields at fixed byte offsets over a [`Buffer`]
//!
//! A message view grows an undersized buffer to its layout size on
//! construction. That growth is the only bounds check fields need.

pub mod bitfield;
pub mod buffer;
pub mod enums;
pub mod error;
pub mod message;
pub mod scalar;

pub use bitfield::{BitWord, FieldInfo, WireBitfield};
pub use buffer::Buffer;
pub use enums::WireEnum;
pub use error::{CodecError, Result};
pub use message::{MessageBuffer, MessageField, WireMessage};
pub use scalar::WireScalar;

#[doc(hidden)]
pub use paste;
