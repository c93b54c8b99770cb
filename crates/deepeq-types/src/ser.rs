//! Serde bridge: lower any `T: Serialize` into a [`Value`].
//!
//! Serde erases module paths, so records produced here carry a bare
//! [`TypeName`]. Struct and tuple enum cases become a [`Variant`] whose
//! payload is a [`Record`] named `<Enum>::<Case>`.

use serde::ser::{
    Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

use crate::error::ValueError;
use crate::reflect::Reflect;
use crate::value::{short_type_name, Mapping, Opaque, Record, Sequence, TypeName, Value, Variant};

/// Lower a serializable value.
pub fn to_value<T>(value: &T) -> Result<Value, ValueError>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer)
}

/// Adapts a serializable value to [`Reflect`].
///
/// A value that fails to serialize lowers to [`Value::Opaque`], which the
/// comparison engine reports as unsupported.
pub struct Serde<'a, T: ?Sized>(pub &'a T);

impl<T> Reflect for Serde<'_, T>
where
    T: Serialize + ?Sized,
{
    fn reflect(&self) -> Value {
        to_value(self.0).unwrap_or_else(|err| {
            Value::Opaque(Opaque::new(
                short_type_name(std::any::type_name::<T>()),
                err.to_string(),
            ))
        })
    }
}

/// The serializer behind [`to_value`]. Stateless; composite builders own
/// their partial results.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueSerializer;

fn positional(record: &Record) -> String {
    record.fields.len().to_string()
}

fn case_record(name: &str, variant: &str) -> Record {
    Record::new(TypeName::bare(format!("{name}::{variant}")))
}

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = RecordBuilder;
    type SerializeTupleStruct = RecordBuilder;
    type SerializeTupleVariant = VariantBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = RecordBuilder;
    type SerializeStructVariant = VariantBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value, ValueError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, ValueError> {
        Ok(Value::I8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, ValueError> {
        Ok(Value::I16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, ValueError> {
        Ok(Value::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, ValueError> {
        Ok(Value::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, ValueError> {
        Ok(Value::I128(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, ValueError> {
        Ok(Value::U8(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, ValueError> {
        Ok(Value::U16(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, ValueError> {
        Ok(Value::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, ValueError> {
        Ok(Value::U64(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, ValueError> {
        Ok(Value::U128(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, ValueError> {
        Ok(Value::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, ValueError> {
        Ok(Value::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, ValueError> {
        Ok(Value::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, ValueError> {
        let items = v.iter().copied().map(Value::U8).collect();
        Ok(Value::Seq(Sequence::growable("bytes", items)))
    }

    fn serialize_none(self) -> Result<Value, ValueError> {
        Ok(Value::Variant(Variant::new(
            TypeName::bare("Option"),
            "None",
            Value::Unit,
        )))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, ValueError>
    where
        T: ?Sized + Serialize,
    {
        let payload = value.serialize(self)?;
        Ok(Value::Variant(Variant::new(
            TypeName::bare("Option"),
            "Some",
            payload,
        )))
    }

    fn serialize_unit(self) -> Result<Value, ValueError> {
        Ok(Value::Unit)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, ValueError> {
        Ok(Value::Struct(Record::new(TypeName::bare(name))))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, ValueError> {
        Ok(Value::Variant(Variant::new(
            TypeName::bare(name),
            variant,
            Value::Unit,
        )))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value, ValueError>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self)?;
        Ok(Value::Struct(
            Record::new(TypeName::bare(name)).with_field("0", inner),
        ))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, ValueError>
    where
        T: ?Sized + Serialize,
    {
        let payload = value.serialize(self)?;
        Ok(Value::Variant(Variant::new(
            TypeName::bare(name),
            variant,
            payload,
        )))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<RecordBuilder, ValueError> {
        Ok(RecordBuilder {
            record: Record::new(TypeName::bare("tuple")),
        })
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<RecordBuilder, ValueError> {
        Ok(RecordBuilder {
            record: Record::new(TypeName::bare(name)),
        })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantBuilder, ValueError> {
        Ok(VariantBuilder {
            name,
            variant,
            record: case_record(name, variant),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder {
            map: Mapping::new("map"),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<RecordBuilder, ValueError> {
        Ok(RecordBuilder {
            record: Record::new(TypeName::bare(name)),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantBuilder, ValueError> {
        Ok(VariantBuilder {
            name,
            variant,
            record: case_record(name, variant),
        })
    }
}

// ---------------------------------------------------------------------------
// Composite builders
// ---------------------------------------------------------------------------

/// Collects sequence elements.
pub struct SeqBuilder {
    items: Vec<Value>,
}

impl SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Seq(Sequence::growable("seq", self.items)))
    }
}

/// Collects record fields: named for structs, positional for tuples.
pub struct RecordBuilder {
    record: Record,
}

impl SerializeStruct for RecordBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.record.push(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Struct(self.record))
    }
}

impl SerializeTuple for RecordBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        let name = positional(&self.record);
        self.record.push(name, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Struct(self.record))
    }
}

impl SerializeTupleStruct for RecordBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        SerializeTuple::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        SerializeTuple::end(self)
    }
}

/// Collects the fields of a struct or tuple enum case.
pub struct VariantBuilder {
    name: &'static str,
    variant: &'static str,
    record: Record,
}

impl VariantBuilder {
    fn finish(self) -> Value {
        Value::Variant(Variant::new(
            TypeName::bare(self.name),
            self.variant,
            Value::Struct(self.record),
        ))
    }
}

impl SerializeTupleVariant for VariantBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        let name = positional(&self.record);
        self.record.push(name, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(self.finish())
    }
}

impl SerializeStructVariant for VariantBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.record.push(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(self.finish())
    }
}

/// Collects map entries, keyed by the rendered key.
pub struct MapBuilder {
    map: Mapping,
    pending_key: Option<String>,
}

impl SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(ValueSerializer)?.to_string());
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        let key = self.pending_key.take().ok_or(ValueError::MissingKey)?;
        let value = value.serialize(ValueSerializer)?;
        self.map.try_insert(key, value).map_err(ValueError::DuplicateKey)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Map(self.map))
    }
}
