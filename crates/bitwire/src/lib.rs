//! Packed binary message codecs and blocking MPMC queues.
//!
//! # Crate Structure
//!
//! - [`codec`]: buffers, bitfields, bounded enums and fixed-layout messages
//! - [`queue`]: locking and lock-free blocking queues with cooperative abort
//! - [`schema`]: runtime JSON definitions compiled into message layouts
//!   (behind the `schema` feature)
//!
//! The declaration macros are re-exported at the crate root:
//!
//! ```
//! use bitwire::{wire_enum, wire_message};
//!
//! wire_enum! {
//!     pub enum Kind: u8 {
//!         DATA = 0,
//!         CONTROL = 1,
//!     }
//! }
//!
//! wire_message! {
//!     pub struct Header {
//!         kind: enum Kind,
//!         length: u16,
//!     }
//! }
//!
//! let mut header = Header::new();
//! header.set_kind(Kind::CONTROL);
//! header.set_length(512);
//! assert_eq!(header.buffer().as_bytes(), &[1, 0x02, 0x00]);
//! ```

/// Re-export codec types.
pub mod codec {
    pub use bitwire_codec::*;
}

/// Re-export queue types.
pub mod queue {
    pub use bitwire_queue::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use bitwire_schema::*;
}

pub use bitwire_codec::{wire_bitfield, wire_enum, wire_message};
