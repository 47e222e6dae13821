use std::collections::HashSet;
use std::fmt;

use bitwire_codec::{bitfield, WireScalar};
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::definition::{BitfieldDefinition, EnumDefinition, FieldDefinition, MessageDefinition};
use crate::error::{Result, SchemaError};

/// Unsigned scalar widths a field or word can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    U8,
    U16,
    U32,
    U64,
}

impl ScalarType {
    pub const ALL: [ScalarType; 4] = [
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(ScalarType::U8),
            "u16" => Some(ScalarType::U16),
            "u32" => Some(ScalarType::U32),
            "u64" => Some(ScalarType::U64),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            ScalarType::U8 => u8::BYTES,
            ScalarType::U16 => u16::BYTES,
            ScalarType::U32 => u32::BYTES,
            ScalarType::U64 => u64::BYTES,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn max_value(self) -> u64 {
        match self {
            ScalarType::U8 => u8::MAX.to_u64(),
            ScalarType::U16 => u16::MAX.to_u64(),
            ScalarType::U32 => u32::MAX.to_u64(),
            ScalarType::U64 => u64::MAX,
        }
    }

    /// Smallest type that can hold `value`.
    pub fn smallest_for(value: u64) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| value <= t.max_value())
            .unwrap_or(ScalarType::U64)
    }

    /// Read a big-endian value from the front of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`bytes`](Self::bytes).
    pub fn read(self, bytes: &[u8]) -> u64 {
        match self {
            ScalarType::U8 => u8::read_be(bytes).to_u64(),
            ScalarType::U16 => u16::read_be(bytes).to_u64(),
            ScalarType::U32 => u32::read_be(bytes).to_u64(),
            ScalarType::U64 => u64::read_be(bytes),
        }
    }

    /// Write the low bits of `value` big-endian into the front of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`bytes`](Self::bytes).
    pub fn write(self, bytes: &mut [u8], value: u64) {
        match self {
            ScalarType::U8 => u8::from_u64_truncating(value).write_be(bytes),
            ScalarType::U16 => u16::from_u64_truncating(value).write_be(bytes),
            ScalarType::U32 => u32::from_u64_truncating(value).write_be(bytes),
            ScalarType::U64 => value.write_be(bytes),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named bit range inside a bitfield word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitSpec {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl BitSpec {
    fn mask(&self) -> u64 {
        let ones = if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        };
        ones << self.offset
    }
}

/// Compiled bitfield: a word type and non-overlapping bit ranges inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitfieldSpec {
    pub name: String,
    pub word: ScalarType,
    pub fields: Vec<BitSpec>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl BitfieldSpec {
    pub fn compile(def: &BitfieldDefinition) -> Result<Self> {
        let invalid = |reason: String| SchemaError::InvalidDefinition {
            name: def.name.clone(),
            reason,
        };

        let bits = def.word.bits();
        let mut names = HashSet::new();
        let mut used = 0u64;
        let mut next = 0u32;
        let mut fields = Vec::with_capacity(def.fields.len());

        for field in &def.fields {
            if !names.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field {}", field.name)));
            }
            if field.width == 0 {
                return Err(invalid(format!("field {} has zero width", field.name)));
            }
            let offset = field.offset.unwrap_or(next);
            if offset.saturating_add(field.width) > bits {
                return Err(invalid(format!(
                    "field {} (bits {}..{}) exceeds the {}-bit word",
                    field.name,
                    offset,
                    offset.saturating_add(field.width),
                    bits
                )));
            }

            let spec = BitSpec {
                name: field.name.clone(),
                offset,
                width: field.width,
                doc: field.doc.clone(),
            };
            if used & spec.mask() != 0 {
                return Err(invalid(format!("field {} overlaps another field", field.name)));
            }
            used |= spec.mask();
            next = offset + field.width;
            fields.push(spec);
        }

        Ok(Self {
            name: def.name.clone(),
            word: def.word,
            fields,
            doc: def.doc.clone(),
        })
    }

    pub fn field(&self, name: &str) -> Option<&BitSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Extract a sub-field from a host-order word value.
    pub fn get(&self, word: u64, field: &BitSpec) -> u64 {
        bitfield::get(word, field.offset, field.width)
    }

    /// Replace a sub-field inside a host-order word value.
    pub fn set(&self, word: u64, field: &BitSpec, value: u64) -> u64 {
        bitfield::set(word, field.offset, field.width, value)
    }

    /// All sub-field values of `word`, in declaration order.
    pub fn split(&self, word: u64) -> Vec<SubFieldValue> {
        self.fields
            .iter()
            .map(|f| SubFieldValue {
                name: f.name.clone(),
                value: self.get(word, f),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumEntry {
    pub symbol: String,
    pub value: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

/// Compiled enum: symbols, the largest valid value and the invalid sentinel
/// one past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSpec {
    pub name: String,
    pub repr: ScalarType,
    pub entries: Vec<EnumEntry>,
    pub max_value: u64,
    pub invalid_symbol: String,
    pub invalid_value: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl EnumSpec {
    pub fn compile(def: &EnumDefinition, config: &RegistryConfig) -> Result<Self> {
        let invalid = |reason: String| SchemaError::InvalidDefinition {
            name: def.name.clone(),
            reason,
        };

        if def.values.is_empty() {
            return Err(invalid("enum has no values".to_string()));
        }

        let mut symbols = HashSet::new();
        let mut values = HashSet::new();
        let mut entries = Vec::with_capacity(def.values.len());
        let mut next = 0u64;

        for item in &def.values {
            if item.symbol == def.invalid || !symbols.insert(item.symbol.as_str()) {
                return Err(invalid(format!("duplicate symbol {}", item.symbol)));
            }
            let value = match item.value {
                Some(value) => value,
                None => next,
            };
            if !values.insert(value) {
                return Err(invalid(format!(
                    "symbol {} reuses value {value}",
                    item.symbol
                )));
            }
            next = value.saturating_add(1);
            entries.push(EnumEntry {
                symbol: item.symbol.clone(),
                value,
                doc: item.doc.clone(),
            });
        }

        let max_value = entries.iter().map(|e| e.value).max().unwrap_or(0);
        let invalid_value = max_value
            .checked_add(1)
            .ok_or_else(|| invalid("no room for the invalid sentinel above u64::MAX".into()))?;

        let repr = match def.repr {
            Some(repr) => {
                if invalid_value > repr.max_value() {
                    return Err(invalid(format!(
                        "sentinel value {invalid_value} does not fit {repr}"
                    )));
                }
                repr
            }
            None => ScalarType::smallest_for(invalid_value),
        };

        if config.require_dense_enums && max_value + 1 != entries.len() as u64 {
            return Err(invalid(format!(
                "values are not the dense range 0..{}",
                entries.len()
            )));
        }

        Ok(Self {
            name: def.name.clone(),
            repr,
            entries,
            max_value,
            invalid_symbol: def.invalid.clone(),
            invalid_value,
            doc: def.doc.clone(),
        })
    }

    /// Bounds-check a raw integer, mapping anything above the maximum to the
    /// sentinel.
    pub fn from_int(&self, value: u64) -> u64 {
        if value > self.max_value {
            self.invalid_value
        } else {
            value
        }
    }

    /// Bare symbol of `value`, including the sentinel.
    pub fn symbol(&self, value: u64) -> Option<&str> {
        if value == self.invalid_value {
            return Some(&self.invalid_symbol);
        }
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.symbol.as_str())
    }

    /// `Name::SYMBOL`, or empty for unnamed values.
    pub fn qualified(&self, value: u64) -> String {
        self.symbol(value)
            .map(|s| format!("{}::{s}", self.name))
            .unwrap_or_default()
    }

    /// Value of a bare or qualified symbol.
    pub fn value_of(&self, symbol: &str) -> Option<u64> {
        let bare = symbol
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix("::"))
            .unwrap_or(symbol);
        if bare == self.invalid_symbol {
            return Some(self.invalid_value);
        }
        self.entries
            .iter()
            .find(|e| e.symbol == bare)
            .map(|e| e.value)
    }
}

/// What a message field holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Scalar { scalar: ScalarType },
    Array { element: ScalarType, count: usize },
    Enum { spec: EnumSpec },
    Bitfield { spec: BitfieldSpec },
}

impl FieldKind {
    /// Byte extent of the field, or `None` if an array's extent overflows.
    pub fn checked_size(&self) -> Option<usize> {
        match self {
            FieldKind::Scalar { scalar } => Some(scalar.bytes()),
            FieldKind::Array { element, count } => element.bytes().checked_mul(*count),
            FieldKind::Enum { spec } => Some(spec.repr.bytes()),
            FieldKind::Bitfield { spec } => Some(spec.word.bytes()),
        }
    }

    /// Type name as written in definitions.
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Scalar { scalar } => scalar.to_string(),
            FieldKind::Array { element, count } => format!("[{element}; {count}]"),
            FieldKind::Enum { spec } => spec.name.clone(),
            FieldKind::Bitfield { spec } => spec.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

/// Compiled message: packed fields at increasing byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLayout {
    pub name: String,
    pub size: usize,
    pub fields: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl MessageLayout {
    /// Compile a message definition, resolving named field types through
    /// `resolve`. The total size may not exceed `config.max_message_size`.
    pub fn compile<F>(def: &MessageDefinition, config: &RegistryConfig, resolve: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<FieldKind>,
    {
        let too_large = |reason: String| SchemaError::InvalidDefinition {
            name: def.name.clone(),
            reason,
        };
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(def.fields.len());
        let mut offset = 0usize;

        for field in &def.fields {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::InvalidDefinition {
                    name: def.name.clone(),
                    reason: format!("duplicate field {}", field.name),
                });
            }
            let kind = field_kind(&def.name, field, &resolve)?;
            let size = kind
                .checked_size()
                .ok_or_else(|| too_large(format!("field {} size overflows", field.name)))?;
            let end = offset
                .checked_add(size)
                .filter(|end| *end <= config.max_message_size)
                .ok_or_else(|| {
                    too_large(format!(
                        "field {} ends beyond the {} byte message limit",
                        field.name, config.max_message_size
                    ))
                })?;
            fields.push(FieldSpec {
                name: field.name.clone(),
                offset,
                size,
                kind,
                doc: field.doc.clone(),
            });
            offset = end;
        }

        Ok(Self {
            name: def.name.clone(),
            size: offset,
            fields,
            doc: def.doc.clone(),
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Decode every field from the front of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<DecodedField>> {
        if bytes.len() < self.size {
            return Err(bitwire_codec::CodecError::Incomplete {
                missing: self.size - bytes.len(),
            }
            .into());
        }
        Ok(self
            .fields
            .iter()
            .map(|field| DecodedField {
                name: field.name.clone(),
                offset: field.offset,
                value: decode_field(field, &bytes[field.offset..field.offset + field.size]),
            })
            .collect())
    }
}

fn field_kind<F>(message: &str, field: &FieldDefinition, resolve: &F) -> Result<FieldKind>
where
    F: Fn(&str) -> Option<FieldKind>,
{
    let scalar = ScalarType::parse(&field.type_name);
    match (scalar, field.count) {
        (Some(_), Some(0)) => Err(SchemaError::InvalidDefinition {
            name: message.to_string(),
            reason: format!("array field {} has zero count", field.name),
        }),
        (Some(element), Some(count)) => Ok(FieldKind::Array { element, count }),
        (Some(scalar), None) => Ok(FieldKind::Scalar { scalar }),
        (None, Some(_)) => Err(SchemaError::InvalidDefinition {
            name: message.to_string(),
            reason: format!("array field {} must have a scalar element type", field.name),
        }),
        (None, None) => resolve(&field.type_name).ok_or_else(|| SchemaError::UnknownType {
            field: format!("{message}.{}", field.name),
            type_name: field.type_name.clone(),
        }),
    }
}

pub(crate) fn decode_field(field: &FieldSpec, bytes: &[u8]) -> FieldValue {
    match &field.kind {
        FieldKind::Scalar { scalar } => FieldValue::Scalar(scalar.read(bytes)),
        FieldKind::Array { .. } => FieldValue::Bytes(bytes.to_vec()),
        FieldKind::Enum { spec } => {
            let value = spec.from_int(spec.repr.read(bytes));
            FieldValue::Enum {
                value,
                symbol: spec.qualified(value),
            }
        }
        FieldKind::Bitfield { spec } => {
            let value = spec.word.read(bytes);
            FieldValue::Bitfield {
                value,
                fields: spec.split(value),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubFieldValue {
    pub name: String,
    pub value: u64,
}

/// A decoded field value in host order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Scalar(u64),
    Bytes(#[serde(serialize_with = "hex_bytes")] Vec<u8>),
    /// Bounds-checked value and its qualified symbol, empty when unnamed.
    Enum {
        value: u64,
        symbol: String,
    },
    Bitfield {
        value: u64,
        fields: Vec<SubFieldValue>,
    },
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(value) => write!(f, "{value}"),
            FieldValue::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            FieldValue::Enum { value, symbol } if symbol.is_empty() => write!(f, "{value}"),
            FieldValue::Enum { value, symbol } => write!(f, "{symbol} ({value})"),
            FieldValue::Bitfield { value, fields } => {
                write!(f, "{value:#x} {{")?;
                for (i, sub) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", sub.name, sub.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedField {
    pub name: String,
    pub offset: usize,
    pub value: FieldValue,
}

fn hex_bytes<S: serde::Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
