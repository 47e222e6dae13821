//! Runtime wire definitions.
//!
//! Bitfields, enums and fixed-layout messages described in JSON are compiled
//! into layouts with the same byte semantics as the `wire_*!` macros of
//! `bitwire-codec`: packed fields, network byte order, zero-padded arrays and
//! an invalid sentinel one past the largest enum value.
//!
//! Use it when message shapes are only known at runtime, for tooling or for
//! checking generated types against a shared definition file.

pub mod config;
pub mod definition;
pub mod dynamic;
pub mod error;
pub mod layout;
pub mod registry;

pub use config::RegistryConfig;
pub use definition::{parse_document, Definition};
pub use dynamic::DynamicMessage;
pub use error::{Result, SchemaError};
pub use layout::{
    BitfieldSpec, DecodedField, EnumSpec, FieldKind, FieldSpec, FieldValue, MessageLayout,
    ScalarType,
};
pub use registry::{SchemaRegistry, DEFINITION_SUFFIX};
