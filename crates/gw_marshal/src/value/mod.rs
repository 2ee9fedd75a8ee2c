//! The dynamic value model the marshallers operate on.
//!
//! - [`Value`]: one node of an object graph as seen by a marshaller.
//! - [`Number`]: a numeric value tagged with its declared type.
//! - [`EnumConstant`]: a named constant of a registered enum.
//! - [`ObjectRef`] / [`Shared`]: shared, identity-carrying object instances.
//! - [`IntoValue`] / [`FromValue`]: typed conversion used by member bindings
//!   and instantiation arguments.

// -----------------------------------------------------------------------------
// Modules

mod convert;
mod number;
mod object;

// -----------------------------------------------------------------------------
// Exports

pub use convert::{FromValue, IntoValue};
pub use number::Number;
pub use object::{ObjectRef, Shared, shared};

use std::borrow::Cow;

use serde_json::Value as JsonValue;

// -----------------------------------------------------------------------------
// EnumConstant

/// A constant of an enum mapping definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    type_name: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl EnumConstant {
    /// Creates a constant named `name` of the enum `type_name`.
    pub fn new(type_name: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// The enum's registered type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The constant's name, written as `enum-string-value`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// -----------------------------------------------------------------------------
// Value

/// One node of an object graph.
///
/// Objects compare by identity, everything else by value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A single character.
    Char(char),
    /// A tagged number.
    Number(Number),
    /// A string.
    String(String),
    /// An enum constant.
    Enum(EnumConstant),
    /// An ordered list; lists are values and are not identity tracked.
    List(Vec<Value>),
    /// A shared object instance.
    Object(ObjectRef),
}

impl Value {
    /// A short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::Number(n) => n.type_name(),
            Self::String(_) => "String",
            Self::Enum(_) => "enum constant",
            Self::List(_) => "List",
            Self::Object(o) => o.rust_type(),
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the object handle, if this is an object.
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Converts a wire value that carries no type information.
    ///
    /// Numbers become `i64`, `u64` or `f64`; objects are not raw values and
    /// yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gw_marshal::value::{Number, Value};
    /// use serde_json::json;
    ///
    /// assert_eq!(Value::from_raw(&json!(3)), Some(Value::Number(Number::I64(3))));
    /// assert_eq!(Value::from_raw(&json!({"a": 1})), None);
    /// ```
    pub fn from_raw(wire: &JsonValue) -> Option<Value> {
        Some(match wire {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => Self::Number(Number::from_json(n)),
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(items) => {
                Self::List(items.iter().map(Self::from_raw).collect::<Option<_>>()?)
            }
            JsonValue::Object(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// The JSON kind of a wire value, for diagnostics.
pub(crate) fn json_kind(wire: &JsonValue) -> &'static str {
    match wire {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
