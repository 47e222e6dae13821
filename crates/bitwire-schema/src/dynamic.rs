//! Field access on a buffer through a runtime [`MessageLayout`].
//!
//! Mirrors what `wire_message!` generates, with fields addressed by name:
//! scalars are stored in network byte order, arrays are zero-padded on write
//! and enum reads map out-of-range values to the sentinel.

use bitwire_codec::{Buffer, MessageBuffer};

use crate::error::{Result, SchemaError};
use crate::layout::{decode_field, DecodedField, FieldKind, FieldSpec, FieldValue, MessageLayout};

pub struct DynamicMessage<'a> {
    layout: &'a MessageLayout,
    buf: MessageBuffer<'a>,
}

impl<'a> DynamicMessage<'a> {
    /// A zero-filled message with its own buffer.
    pub fn new(layout: &'a MessageLayout) -> Self {
        Self {
            layout,
            buf: MessageBuffer::owned(layout.size),
        }
    }

    /// A view over `buffer`, grown to the layout size if needed.
    pub fn over(layout: &'a MessageLayout, buffer: &'a mut Buffer) -> Self {
        Self {
            layout,
            buf: MessageBuffer::borrowed(buffer, layout.size),
        }
    }

    /// Take ownership of `buffer`, grown to the layout size if needed.
    pub fn adopt(layout: &'a MessageLayout, buffer: Buffer) -> Self {
        Self {
            layout,
            buf: MessageBuffer::adopt(buffer, layout.size),
        }
    }

    pub fn layout(&self) -> &'a MessageLayout {
        self.layout
    }

    pub fn buffer(&self) -> &Buffer {
        self.buf.buffer()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.buffer().as_bytes()[..self.layout.size].to_vec()
    }

    fn spec(&self, name: &str) -> Result<&'a FieldSpec> {
        self.layout
            .field(name)
            .ok_or_else(|| SchemaError::UnknownField {
                message: self.layout.name.clone(),
                field: name.to_string(),
            })
    }

    fn raw(&self, spec: &FieldSpec) -> u64 {
        let bytes = self.buf.bytes(spec.offset, spec.size);
        if bytes.len() < spec.size {
            return 0;
        }
        match &spec.kind {
            FieldKind::Scalar { scalar } => scalar.read(bytes),
            FieldKind::Enum { spec } => spec.repr.read(bytes),
            FieldKind::Bitfield { spec } => spec.word.read(bytes),
            FieldKind::Array { .. } => 0,
        }
    }

    fn store(&mut self, spec: &FieldSpec, value: u64) {
        let region = self.buf.bytes_mut(spec.offset, spec.size);
        match &spec.kind {
            FieldKind::Scalar { scalar } => scalar.write(region, value),
            FieldKind::Enum { spec } => spec.repr.write(region, value),
            FieldKind::Bitfield { spec } => spec.word.write(region, value),
            FieldKind::Array { .. } => {}
        }
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        let spec = self.spec(name)?;
        let bytes = self.buf.bytes(spec.offset, spec.size);
        if bytes.len() < spec.size {
            let mut padded = bytes.to_vec();
            padded.resize(spec.size, 0);
            return Ok(decode_field(spec, &padded));
        }
        Ok(decode_field(spec, bytes))
    }

    /// Numeric value of a scalar, enum or bitfield word. Enum values are
    /// bounds-checked.
    pub fn get_u64(&self, name: &str) -> Result<u64> {
        let spec = self.spec(name)?;
        match &spec.kind {
            FieldKind::Array { .. } => Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: "array fields have no numeric value".to_string(),
            }),
            FieldKind::Enum { spec: e } => Ok(e.from_int(self.raw(spec))),
            _ => Ok(self.raw(spec)),
        }
    }

    /// Store a numeric value in a scalar, enum or bitfield word.
    ///
    /// Fails if the value does not fit the field width; enum fields accept
    /// any value their repr can hold.
    pub fn set(&mut self, name: &str, value: u64) -> Result<()> {
        let spec = self.spec(name)?;
        let width = match &spec.kind {
            FieldKind::Scalar { scalar } => *scalar,
            FieldKind::Enum { spec } => spec.repr,
            FieldKind::Bitfield { spec } => spec.word,
            FieldKind::Array { .. } => {
                return Err(SchemaError::InvalidValue {
                    field: name.to_string(),
                    reason: "use set_bytes for array fields".to_string(),
                })
            }
        };
        if value > width.max_value() {
            return Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: format!("{value} does not fit {width}"),
            });
        }
        self.store(spec, value);
        Ok(())
    }

    /// Store an enum field by bare or qualified symbol.
    pub fn set_symbol(&mut self, name: &str, symbol: &str) -> Result<()> {
        let spec = self.spec(name)?;
        let FieldKind::Enum { spec: e } = &spec.kind else {
            return Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: "not an enum field".to_string(),
            });
        };
        let value = e.value_of(symbol).ok_or_else(|| SchemaError::InvalidValue {
            field: name.to_string(),
            reason: format!("{} has no symbol {symbol}", e.name),
        })?;
        self.store(spec, value);
        Ok(())
    }

    /// Update one sub-field of a bitfield, leaving the other bits intact.
    pub fn set_bits(&mut self, name: &str, sub: &str, value: u64) -> Result<()> {
        let spec = self.spec(name)?;
        let FieldKind::Bitfield { spec: bits } = &spec.kind else {
            return Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: "not a bitfield field".to_string(),
            });
        };
        let bit = bits.field(sub).ok_or_else(|| SchemaError::UnknownField {
            message: self.layout.name.clone(),
            field: format!("{name}.{sub}"),
        })?;
        if bit.width < 64 && value >> bit.width != 0 {
            return Err(SchemaError::InvalidValue {
                field: format!("{name}.{sub}"),
                reason: format!("{value} does not fit {} bits", bit.width),
            });
        }
        let word = bits.set(self.raw(spec), bit, value);
        self.store(spec, word);
        Ok(())
    }

    /// Copy `data` into an array field, zero-padding the tail.
    pub fn set_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let spec = self.spec(name)?;
        if !matches!(spec.kind, FieldKind::Array { .. }) {
            return Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: "not an array field".to_string(),
            });
        }
        if data.len() > spec.size {
            return Err(SchemaError::InvalidValue {
                field: name.to_string(),
                reason: format!("{} bytes exceed capacity {}", data.len(), spec.size),
            });
        }
        let region = self.buf.bytes_mut(spec.offset, spec.size);
        region[..data.len()].copy_from_slice(data);
        region[data.len()..].fill(0);
        Ok(())
    }

    /// Decode every field.
    pub fn decode(&self) -> Result<Vec<DecodedField>> {
        self.layout.decode(self.buf.bytes(0, self.layout.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;

    const DEFS: &str = r#"[
        {"kind":"enum","name":"Kind","values":[{"symbol":"DATA"},{"symbol":"CONTROL"}]},
        {"kind":"bitfield","name":"Flags","word":"u16",
         "fields":[{"name":"urgent","width":1},{"name":"priority","width":3}]},
        {"kind":"message","name":"Packet","fields":[
            {"name":"kind","type":"Kind"},
            {"name":"flags","type":"Flags"},
            {"name":"seq","type":"u32"},
            {"name":"label","type":"u8","count":4}
        ]}
    ]"#;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(DEFS).unwrap();
        registry
    }

    #[test]
    fn set_and_get_every_kind() {
        let registry = registry();
        let layout = registry.message("Packet").unwrap();
        let mut msg = DynamicMessage::new(layout);

        msg.set_symbol("kind", "Kind::CONTROL").unwrap();
        msg.set_bits("flags", "priority", 5).unwrap();
        msg.set_bits("flags", "urgent", 1).unwrap();
        msg.set("seq", 0x0102_0304).unwrap();
        msg.set_bytes("label", b"ab").unwrap();

        assert_eq!(msg.get_u64("kind").unwrap(), 1);
        assert_eq!(msg.get_u64("flags").unwrap(), 0b1011);
        assert_eq!(
            msg.get("label").unwrap(),
            FieldValue::Bytes(vec![b'a', b'b', 0, 0])
        );
        assert_eq!(
            msg.into_bytes(),
            vec![1, 0x00, 0x0B, 1, 2, 3, 4, b'a', b'b', 0, 0]
        );
    }

    #[test]
    fn enum_out_of_range_reads_as_sentinel() {
        let registry = registry();
        let layout = registry.message("Packet").unwrap();
        let mut msg = DynamicMessage::new(layout);
        msg.set("kind", 200).unwrap();
        assert_eq!(msg.get_u64("kind").unwrap(), 2);
        assert_eq!(
            msg.get("kind").unwrap(),
            FieldValue::Enum {
                value: 2,
                symbol: "Kind::INVALID_ENUM_VALUE".to_string()
            }
        );
    }

    #[test]
    fn rejects_values_that_do_not_fit() {
        let registry = registry();
        let layout = registry.message("Packet").unwrap();
        let mut msg = DynamicMessage::new(layout);
        assert!(msg.set("kind", 256).is_err());
        assert!(msg.set_bits("flags", "priority", 8).is_err());
        assert!(msg.set_bytes("label", b"12345").is_err());
        assert!(msg.set("label", 1).is_err());
        assert!(matches!(
            msg.set("missing", 1),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn view_over_caller_buffer() {
        let registry = registry();
        let layout = registry.message("Packet").unwrap();
        let mut buffer = Buffer::new();
        {
            let mut msg = DynamicMessage::over(layout, &mut buffer);
            msg.set("seq", 7).unwrap();
        }
        assert_eq!(buffer.size(), layout.size);
        assert_eq!(&buffer.as_bytes()[3..7], &[0, 0, 0, 7]);

        let adopted = DynamicMessage::adopt(layout, buffer);
        assert_eq!(adopted.get_u64("seq").unwrap(), 7);
    }
}
