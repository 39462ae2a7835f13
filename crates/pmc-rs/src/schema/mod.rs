// crates/pmc-rs/src/schema/mod.rs
//! Declarative node schema.
//!
//! Every node kind is a plain struct whose fields are its attributes. The
//! [`node_kind!`] macro derives an [`AttrDescriptor`] table and dynamic
//! get/set from the struct declaration, so serialization, columns, checks and
//! exporters work off the descriptors instead of per-kind code.

#[macro_use]
mod macros;

pub mod columns;
pub mod kinds;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use kinds::{KindData, NodeData, NodeKind, TreeKind};
pub use kinds::anomalies::{ResponseLevel, TriggerType};

/// Scalar part of an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    String,
    Integer,
    /// Exact fixed-point; persisted as a string.
    Decimal,
    Bool,
    Uuid,
    /// One of a closed set of names, persisted as a string.
    Choice(&'static [&'static str]),
}

impl BaseType {
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Integer => "integer",
            BaseType::Decimal => "decimal",
            BaseType::Bool => "bool",
            BaseType::Uuid => "uuid",
            BaseType::Choice(_) => "choice",
        }
    }
}

/// Full attribute type: a base, optionally nullable, optionally a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrType {
    pub base: BaseType,
    pub optional: bool,
    pub list: bool,
}

impl AttrType {
    pub const fn plain(base: BaseType) -> Self {
        Self {
            base,
            optional: false,
            list: false,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }

    pub const fn list(self) -> Self {
        Self { list: true, ..self }
    }

    /// The type of one list element.
    pub const fn element(self) -> Self {
        Self::plain(self.base)
    }

    pub fn name(&self) -> String {
        let mut name = self.base.name().to_string();
        if self.list {
            name = format!("list<{name}>");
        }
        if self.optional {
            name = format!("optional<{name}>");
        }
        name
    }

    /// Value used when a persisted file omits the attribute.
    pub fn missing_value(&self) -> Option<AttrValue> {
        if self.optional {
            Some(AttrValue::Null)
        } else if self.list {
            Some(AttrValue::List(Vec::new()))
        } else {
            None
        }
    }

    pub fn is_uuid(&self) -> bool {
        self.base == BaseType::Uuid
    }
}

/// A dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Null,
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Bool(bool),
    Uuid(Uuid),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AttrValue::Decimal(d) => Some(*d),
            AttrValue::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            AttrValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Every UUID carried by this value (a single UUID or a list of them).
    pub fn uuids(&self) -> Vec<Uuid> {
        match self {
            AttrValue::Uuid(u) => vec![*u],
            AttrValue::List(items) => items.iter().filter_map(AttrValue::as_uuid).collect(),
            _ => Vec::new(),
        }
    }

    /// Canonical JSON form: decimals and UUIDs become strings.
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Null => Value::Null,
            AttrValue::String(s) => Value::String(s.clone()),
            AttrValue::Integer(i) => Value::from(*i),
            AttrValue::Decimal(d) => Value::String(d.to_string()),
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
            AttrValue::List(items) => Value::Array(items.iter().map(AttrValue::to_json).collect()),
        }
    }

    /// Reads a JSON value as `ty`. Returns `None` on any type mismatch.
    pub fn from_json(value: &Value, ty: &AttrType) -> Option<AttrValue> {
        if value.is_null() {
            return ty.optional.then_some(AttrValue::Null);
        }
        if ty.list {
            let element = ty.element();
            return value
                .as_array()?
                .iter()
                .map(|item| AttrValue::from_json(item, &element))
                .collect::<Option<Vec<_>>>()
                .map(AttrValue::List);
        }
        match ty.base {
            BaseType::String => value.as_str().map(|s| AttrValue::String(s.to_string())),
            BaseType::Integer => value.as_i64().map(AttrValue::Integer),
            BaseType::Decimal => value
                .as_str()
                .and_then(|s| Decimal::from_str(s).ok())
                .map(AttrValue::Decimal),
            BaseType::Bool => value.as_bool().map(AttrValue::Bool),
            BaseType::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(AttrValue::Uuid),
            BaseType::Choice(names) => value
                .as_str()
                .filter(|s| names.contains(s))
                .map(|s| AttrValue::String(s.to_string())),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::String(s) => f.write_str(s),
            AttrValue::Integer(i) => write!(f, "{i}"),
            AttrValue::Decimal(d) => write!(f, "{d}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Uuid(u) => write!(f, "{u}"),
            AttrValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Decimal> for AttrValue {
    fn from(value: Decimal) -> Self {
        AttrValue::Decimal(value)
    }
}

impl From<Uuid> for AttrValue {
    fn from(value: Uuid) -> Self {
        AttrValue::Uuid(value)
    }
}

impl From<Option<Uuid>> for AttrValue {
    fn from(value: Option<Uuid>) -> Self {
        value.map_or(AttrValue::Null, AttrValue::Uuid)
    }
}

/// Errors from dynamic attribute access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    #[error("{kind} has no attribute `{name}`")]
    UnknownAttribute { kind: &'static str, name: String },

    #[error("attribute `{name}` expects {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("cannot parse {text:?} for attribute `{name}`")]
    Parse { name: String, text: String },
}

// --- Typed field <-> dynamic value ---

/// A Rust type usable as a node attribute.
pub trait AttrField: Sized {
    const TYPE: AttrType;
    fn to_value(&self) -> AttrValue;
    fn from_value(value: AttrValue) -> Option<Self>;
}

impl AttrField for String {
    const TYPE: AttrType = AttrType::plain(BaseType::String);
    fn to_value(&self) -> AttrValue {
        AttrValue::String(self.clone())
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        match value {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl AttrField for i64 {
    const TYPE: AttrType = AttrType::plain(BaseType::Integer);
    fn to_value(&self) -> AttrValue {
        AttrValue::Integer(*self)
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        value.as_integer()
    }
}

impl AttrField for Decimal {
    const TYPE: AttrType = AttrType::plain(BaseType::Decimal);
    fn to_value(&self) -> AttrValue {
        AttrValue::Decimal(*self)
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        value.as_decimal()
    }
}

impl AttrField for bool {
    const TYPE: AttrType = AttrType::plain(BaseType::Bool);
    fn to_value(&self) -> AttrValue {
        AttrValue::Bool(*self)
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        value.as_bool()
    }
}

impl AttrField for Uuid {
    const TYPE: AttrType = AttrType::plain(BaseType::Uuid);
    fn to_value(&self) -> AttrValue {
        AttrValue::Uuid(*self)
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        value.as_uuid()
    }
}

impl<T: AttrField> AttrField for Option<T> {
    const TYPE: AttrType = T::TYPE.optional();
    fn to_value(&self) -> AttrValue {
        self.as_ref().map_or(AttrValue::Null, AttrField::to_value)
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        match value {
            AttrValue::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: AttrField> AttrField for Vec<T> {
    const TYPE: AttrType = T::TYPE.list();
    fn to_value(&self) -> AttrValue {
        AttrValue::List(self.iter().map(AttrField::to_value).collect())
    }
    fn from_value(value: AttrValue) -> Option<Self> {
        match value {
            AttrValue::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

// --- Descriptors ---

/// Per-attribute metadata written next to each field in `node_kind!`.
#[derive(Debug, Clone, Copy)]
pub struct AttrMeta {
    pub label: &'static str,
    /// Integer attribute displayed (and exported) as hexadecimal.
    pub hex: bool,
    /// Written to the model file. Transient attributes are recomputed.
    pub persist: bool,
    /// Kinds a UUID attribute may resolve to. Empty means any kind.
    pub refs: &'static [NodeKind],
}

pub const fn meta(label: &'static str) -> AttrMeta {
    AttrMeta {
        label,
        hex: false,
        persist: true,
        refs: &[],
    }
}

impl AttrMeta {
    pub const fn hex(self) -> Self {
        Self { hex: true, ..self }
    }

    pub const fn transient(self) -> Self {
        Self {
            persist: false,
            ..self
        }
    }

    pub const fn refs(self, refs: &'static [NodeKind]) -> Self {
        Self { refs, ..self }
    }
}

/// One attribute of one node kind.
#[derive(Debug, Clone, Copy)]
pub struct AttrDescriptor {
    /// Rust field name and on-disk JSON key.
    pub name: &'static str,
    pub ty: AttrType,
    pub meta: AttrMeta,
}

impl AttrDescriptor {
    pub const fn new(name: &'static str, ty: AttrType, meta: AttrMeta) -> Self {
        Self { name, ty, meta }
    }

    pub fn label(&self) -> &'static str {
        self.meta.label
    }

    pub fn persisted(&self) -> bool {
        self.meta.persist
    }

    /// Whether `value` has this attribute's type.
    pub fn accepts(&self, value: &AttrValue) -> bool {
        AttrValue::from_json(&value.to_json(), &self.ty).is_some()
    }

    /// Text shown in a view cell.
    pub fn display(&self, value: &AttrValue) -> String {
        match value {
            AttrValue::Integer(i) if self.meta.hex => format!("0x{i:X}"),
            other => other.to_string(),
        }
    }

    /// Parses user-entered text into a value of this attribute's type.
    ///
    /// Empty text means null for optional attributes. Lists are comma separated.
    pub fn parse_text(&self, text: &str) -> Result<AttrValue, AttrError> {
        let text = text.trim();
        let parse_error = || AttrError::Parse {
            name: self.name.to_string(),
            text: text.to_string(),
        };
        if text.is_empty() && self.ty.optional {
            return Ok(AttrValue::Null);
        }
        if self.ty.list {
            let element = AttrDescriptor::new(self.name, self.ty.element(), self.meta);
            return text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| element.parse_text(s))
                .collect::<Result<Vec<_>, _>>()
                .map(AttrValue::List);
        }
        match self.ty.base {
            BaseType::String => Ok(AttrValue::String(text.to_string())),
            BaseType::Integer => parse_integer(text).map(AttrValue::Integer).ok_or_else(parse_error),
            BaseType::Decimal => Decimal::from_str(text)
                .map(AttrValue::Decimal)
                .map_err(|_| parse_error()),
            BaseType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(AttrValue::Bool(true)),
                "false" | "0" | "no" => Ok(AttrValue::Bool(false)),
                _ => Err(parse_error()),
            },
            BaseType::Uuid => Uuid::parse_str(text)
                .map(AttrValue::Uuid)
                .map_err(|_| parse_error()),
            BaseType::Choice(names) => names
                .iter()
                .find(|n| n.eq_ignore_ascii_case(text))
                .map(|n| AttrValue::String((*n).to_string()))
                .ok_or_else(parse_error),
        }
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Dynamic access to a kind's attributes, generated by `node_kind!`.
pub trait Attributes {
    const DESCRIPTORS: &'static [AttrDescriptor];

    fn get(&self, name: &str) -> Option<AttrValue>;

    fn set(&mut self, name: &str, value: AttrValue) -> Result<(), AttrError>;

    fn descriptor(name: &str) -> Option<&'static AttrDescriptor> {
        Self::DESCRIPTORS.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_accepts_hex_and_decimal() {
        assert_eq!(parse_integer("0x1f"), Some(31));
        assert_eq!(parse_integer("0X1F"), Some(31));
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer(" -7 "), Some(-7));
        assert_eq!(parse_integer("0xzz"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn hex_descriptor_displays_upper_case() {
        let d = AttrDescriptor::new("identifier", i64::TYPE, meta("Identifier").hex());
        assert_eq!(d.display(&AttrValue::Integer(0x1abc)), "0x1ABC");
        assert_eq!(d.parse_text("0x1f"), Ok(AttrValue::Integer(31)));
    }

    #[test]
    fn decimal_json_is_a_string_and_keeps_scale() {
        let ty = <Decimal as AttrField>::TYPE;
        let value = AttrValue::from_json(&Value::String("0.010".into()), &ty).expect("decimal");
        assert_eq!(value.to_json(), Value::String("0.010".into()));
        // Numbers are not accepted for decimals; the file format stores strings.
        assert_eq!(AttrValue::from_json(&serde_json::json!(0.5), &ty), None);
    }

    #[test]
    fn optional_list_and_missing_values() {
        let opt = <Option<String> as AttrField>::TYPE;
        assert_eq!(opt.name(), "optional<string>");
        assert_eq!(opt.missing_value(), Some(AttrValue::Null));

        let list = <Vec<Uuid> as AttrField>::TYPE;
        assert_eq!(list.name(), "list<uuid>");
        assert_eq!(list.missing_value(), Some(AttrValue::List(vec![])));

        assert_eq!(<i64 as AttrField>::TYPE.missing_value(), None);
    }

    #[test]
    fn integer_rejects_fractional_json() {
        let ty = <i64 as AttrField>::TYPE;
        assert_eq!(AttrValue::from_json(&serde_json::json!(1.5), &ty), None);
        assert_eq!(
            AttrValue::from_json(&serde_json::json!(3), &ty),
            Some(AttrValue::Integer(3))
        );
    }

    #[test]
    fn accepts_checks_base_type() {
        let d = AttrDescriptor::new("bits", i64::TYPE, meta("Bits"));
        assert!(d.accepts(&AttrValue::Integer(8)));
        assert!(!d.accepts(&AttrValue::String("8".into())));
        assert!(!d.accepts(&AttrValue::Null));
        assert!(!d.accepts(&AttrValue::Decimal(Decimal::new(15, 1))));
    }
}
