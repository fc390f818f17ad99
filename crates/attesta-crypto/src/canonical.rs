//! Canonical encoding and content hashing.
//!
//! Anything that is hashed or signed is first lowered into a
//! [`CanonicalValue`] and then rendered by [`canonicalize`]:
//!
//! - `null`, `true`, `false` as literals
//! - integers in plain decimal, floats in shortest round-trip form
//!   (exponent form below `1e-6` and from `1e21` up, `-0` renders as `0`)
//! - strings JSON-quoted, escaping only `"`, `\` and control characters
//! - lists as `[a,b,c]`
//! - maps as `{"k":v,...}` with keys sorted by UTF-16 code units
//!
//! No whitespace is ever emitted.  The content hash of a value is the
//! lowercase hex SHA-256 of the UTF-8 bytes of that string.
//!
//! Any `serde::Serialize` type can be lowered with [`to_canonical_value`].
//! Non-finite floats, raw byte strings, non-string map keys and integers
//! outside the `i64` range are rejected with `UnsupportedValue` before any
//! hashing happens.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::ser::{self, Serialize, Serializer};
use sha2::{Digest, Sha256};

use attesta_contracts::error::{AttestaError, AttestaResult};

/// A value that has exactly one canonical encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Must be finite to canonicalize.
    Float(f64),
    String(String),
    List(Vec<CanonicalValue>),
    Map(BTreeMap<String, CanonicalValue>),
}

impl From<bool> for CanonicalValue {
    fn from(v: bool) -> Self {
        CanonicalValue::Bool(v)
    }
}

impl From<i64> for CanonicalValue {
    fn from(v: i64) -> Self {
        CanonicalValue::Integer(v)
    }
}

impl From<f64> for CanonicalValue {
    fn from(v: f64) -> Self {
        CanonicalValue::Float(v)
    }
}

impl From<&str> for CanonicalValue {
    fn from(v: &str) -> Self {
        CanonicalValue::String(v.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(v: String) -> Self {
        CanonicalValue::String(v)
    }
}

impl<V: Into<CanonicalValue>> From<Vec<V>> for CanonicalValue {
    fn from(items: Vec<V>) -> Self {
        CanonicalValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CanonicalValue::Null => serializer.serialize_unit(),
            CanonicalValue::Bool(b) => serializer.serialize_bool(*b),
            CanonicalValue::Integer(i) => serializer.serialize_i64(*i),
            CanonicalValue::Float(f) => serializer.serialize_f64(*f),
            CanonicalValue::String(s) => serializer.serialize_str(s),
            CanonicalValue::List(items) => serializer.collect_seq(items),
            CanonicalValue::Map(entries) => serializer.collect_map(entries),
        }
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Render `value` in canonical form.
///
/// Fails with `UnsupportedValue` if any nested float is NaN or infinite.
pub fn canonicalize(value: &CanonicalValue) -> AttestaResult<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Lower any serializable value and render it in canonical form.
pub fn canonical_string<T: Serialize + ?Sized>(value: &T) -> AttestaResult<String> {
    canonicalize(&to_canonical_value(value)?)
}

/// Lowercase hex SHA-256 of the canonical form of `value`.
pub fn hash_value(value: &CanonicalValue) -> AttestaResult<String> {
    Ok(hex::encode(sha256(&canonicalize(value)?)))
}

/// Lowercase hex SHA-256 of the canonical form of any serializable value.
pub fn hash<T: Serialize + ?Sized>(value: &T) -> AttestaResult<String> {
    Ok(hex::encode(digest(value)?))
}

/// Raw SHA-256 digest of the canonical form.  This is what gets signed.
pub fn digest<T: Serialize + ?Sized>(value: &T) -> AttestaResult<[u8; 32]> {
    Ok(sha256(&canonical_string(value)?))
}

fn sha256(canonical: &str) -> [u8; 32] {
    Sha256::digest(canonical.as_bytes()).into()
}

fn write_value(out: &mut String, value: &CanonicalValue) -> AttestaResult<()> {
    match value {
        CanonicalValue::Null => out.push_str("null"),
        CanonicalValue::Bool(true) => out.push_str("true"),
        CanonicalValue::Bool(false) => out.push_str("false"),
        CanonicalValue::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        CanonicalValue::Float(f) => write_float(out, *f)?,
        CanonicalValue::String(s) => write_string(out, s),
        CanonicalValue::List(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        CanonicalValue::Map(entries) => {
            // BTreeMap orders by UTF-8 bytes; the wire order is UTF-16 code
            // units.  The two only disagree above U+E000.
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            out.push('{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &entries[key])?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_float(out: &mut String, f: f64) -> AttestaResult<()> {
    if !f.is_finite() {
        return Err(AttestaError::UnsupportedValue {
            reason: format!("non-finite number {f} has no canonical form"),
        });
    }
    if f == 0.0 {
        out.push('0');
        return Ok(());
    }

    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        let _ = write!(out, "{f}");
    } else {
        let exp = format!("{f:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                let _ = write!(out, "{mantissa}e+{power}");
            }
            _ => out.push_str(&exp),
        }
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

// ── Lowering from serde ──────────────────────────────────────────────────────

/// Lower any `Serialize` value into a [`CanonicalValue`].
///
/// Structs and maps become `Map`, sequences and tuples become `List`,
/// `None` and unit become `Null`, unit enum variants become their name, and
/// data-carrying variants become a single-key map (serde's external tagging).
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> AttestaResult<CanonicalValue> {
    value.serialize(CanonicalSerializer)
}

fn unsupported(reason: impl Into<String>) -> AttestaError {
    AttestaError::UnsupportedValue { reason: reason.into() }
}

struct CanonicalSerializer;

impl Serializer for CanonicalSerializer {
    type Ok = CanonicalValue;
    type Error = AttestaError;
    type SerializeSeq = ListBuilder;
    type SerializeTuple = ListBuilder;
    type SerializeTupleStruct = ListBuilder;
    type SerializeTupleVariant = VariantListBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    fn serialize_bool(self, v: bool) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> AttestaResult<CanonicalValue> {
        i64::try_from(v)
            .map(CanonicalValue::Integer)
            .map_err(|_| unsupported(format!("integer {v} exceeds the canonical i64 range")))
    }

    fn serialize_f32(self, v: f32) -> AttestaResult<CanonicalValue> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> AttestaResult<CanonicalValue> {
        if !v.is_finite() {
            return Err(unsupported(format!("non-finite number {v} has no canonical form")));
        }
        Ok(CanonicalValue::Float(v))
    }

    fn serialize_char(self, v: char) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> AttestaResult<CanonicalValue> {
        Err(unsupported("raw byte strings have no canonical form; encode them first"))
    }

    fn serialize_none(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> AttestaResult<CanonicalValue> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> AttestaResult<CanonicalValue> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> AttestaResult<CanonicalValue> {
        let mut entries = BTreeMap::new();
        entries.insert(variant.to_string(), value.serialize(CanonicalSerializer)?);
        Ok(CanonicalValue::Map(entries))
    }

    fn serialize_seq(self, len: Option<usize>) -> AttestaResult<ListBuilder> {
        Ok(ListBuilder { items: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> AttestaResult<ListBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> AttestaResult<ListBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> AttestaResult<VariantListBuilder> {
        Ok(VariantListBuilder {
            variant,
            list: ListBuilder { items: Vec::with_capacity(len) },
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> AttestaResult<MapBuilder> {
        Ok(MapBuilder::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> AttestaResult<MapBuilder> {
        Ok(MapBuilder::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> AttestaResult<VariantMapBuilder> {
        Ok(VariantMapBuilder { variant, map: MapBuilder::default() })
    }
}

struct ListBuilder {
    items: Vec<CanonicalValue>,
}

impl ListBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        self.items.push(value.serialize(CanonicalSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for ListBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        self.push(value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::List(self.items))
    }
}

impl ser::SerializeTuple for ListBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        self.push(value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::List(self.items))
    }
}

impl ser::SerializeTupleStruct for ListBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        self.push(value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::List(self.items))
    }
}

struct VariantListBuilder {
    variant: &'static str,
    list: ListBuilder,
}

impl ser::SerializeTupleVariant for VariantListBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        self.list.push(value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        let mut entries = BTreeMap::new();
        entries.insert(self.variant.to_string(), CanonicalValue::List(self.list.items));
        Ok(CanonicalValue::Map(entries))
    }
}

#[derive(Default)]
struct MapBuilder {
    entries: BTreeMap<String, CanonicalValue>,
    pending_key: Option<String>,
}

impl MapBuilder {
    fn insert<T: Serialize + ?Sized>(&mut self, key: String, value: &T) -> AttestaResult<()> {
        self.entries.insert(key, value.serialize(CanonicalSerializer)?);
        Ok(())
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> AttestaResult<()> {
        match key.serialize(CanonicalSerializer)? {
            CanonicalValue::String(k) => {
                self.pending_key = Some(k);
                Ok(())
            }
            other => Err(unsupported(format!("map keys must be strings, got {other:?}"))),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> AttestaResult<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| unsupported("map value serialized before its key"))?;
        self.insert(key, value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> AttestaResult<()> {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        Ok(CanonicalValue::Map(self.entries))
    }
}

struct VariantMapBuilder {
    variant: &'static str,
    map: MapBuilder,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = CanonicalValue;
    type Error = AttestaError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> AttestaResult<()> {
        self.map.insert(key.to_string(), value)
    }

    fn end(self) -> AttestaResult<CanonicalValue> {
        let mut entries = BTreeMap::new();
        entries.insert(self.variant.to_string(), CanonicalValue::Map(self.map.entries));
        Ok(CanonicalValue::Map(entries))
    }
}

// ── Hashed values ────────────────────────────────────────────────────────────

/// A value paired with the content hash computed when it was built.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Hashed<T> {
    pub value: T,
    pub hash: String,
}

impl<T: Serialize> Hashed<T> {
    /// Hash `value` and keep both.
    pub fn new(value: T) -> AttestaResult<Self> {
        let hash = hash(&value)?;
        Ok(Self { value, hash })
    }

    /// Recompute the hash of `value` and compare with the stored one.
    pub fn is_intact(&self) -> bool {
        hash(&self.value).map(|h| h == self.hash).unwrap_or(false)
    }
}
