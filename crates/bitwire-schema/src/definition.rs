//! Serde shape of wire definition documents.
//!
//! A document is one definition object or an array of them, each tagged by
//! `kind`:
//!
//! ```json
//! [
//!   { "kind": "enum", "name": "Kind", "values": [{ "symbol": "DATA" }, { "symbol": "CONTROL" }] },
//!   { "kind": "bitfield", "name": "Flags", "word": "u16",
//!     "fields": [{ "name": "urgent", "width": 1 }, { "name": "priority", "width": 3 }] },
//!   { "kind": "message", "name": "Packet",
//!     "fields": [{ "name": "kind", "type": "Kind" }, { "name": "label", "type": "u8", "count": 6 }] }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::layout::ScalarType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Definition {
    Bitfield(BitfieldDefinition),
    Enum(EnumDefinition),
    Message(MessageDefinition),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Bitfield(def) => &def.name,
            Definition::Enum(def) => &def.name,
            Definition::Message(def) => &def.name,
        }
    }
}

/// Parse a document holding one definition object or an array of them.
pub fn parse_document(json: &str) -> serde_json::Result<Vec<Definition>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|def| vec![def])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitfieldDefinition {
    pub name: String,
    pub word: ScalarType,
    pub fields: Vec<BitDefinition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitDefinition {
    pub name: String,
    pub width: u32,
    /// Explicit bit offset; defaults to the end of the previous field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDefinition {
    pub name: String,
    /// Backing integer; defaults to the smallest type holding the sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr: Option<ScalarType>,
    pub values: Vec<EnumValueDefinition>,
    /// Symbol of the sentinel returned for out-of-range integers.
    #[serde(default = "default_invalid_symbol")]
    pub invalid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDefinition {
    pub symbol: String,
    /// Defaults to the previous value plus one, or zero for the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    /// `u8`..`u64`, or the name of a registered enum or bitfield.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Repetition count; turns a scalar field into an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

fn default_invalid_symbol() -> String {
    "INVALID_ENUM_VALUE".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_kinds() {
        let defs = parse_document(
            r#"[
                {"kind":"enum","name":"Kind","values":[{"symbol":"A"},{"symbol":"B","value":4}]},
                {"kind":"bitfield","name":"F","word":"u8","fields":[{"name":"x","width":2,"offset":3}]},
                {"kind":"message","name":"M","fields":[{"name":"k","type":"Kind"},{"name":"raw","type":"u8","count":2}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(defs.len(), 3);

        let Definition::Enum(e) = &defs[0] else {
            panic!("expected enum");
        };
        assert_eq!(e.invalid, "INVALID_ENUM_VALUE");
        assert_eq!(e.values[1].value, Some(4));
        assert_eq!(defs[1].name(), "F");

        let Definition::Message(m) = &defs[2] else {
            panic!("expected message");
        };
        assert_eq!(m.fields[1].count, Some(2));
        assert_eq!(m.fields[0].type_name, "Kind");
    }

    #[test]
    fn single_object_document() {
        let defs = parse_document(r#"{"kind":"message","name":"Empty","fields":[]}"#).unwrap();
        assert_eq!(defs[0].name(), "Empty");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_document(
            r#"{"kind":"message","name":"M","fields":[{"name":"a","type":"u8","cnt":2}]}"#,
        );
        assert!(result.is_err());
    }
}
