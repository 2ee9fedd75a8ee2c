use serde_core::de::{DeserializeSeed, Error};
use serde_core::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::codec::{DecodeContext, EncodeContext};
use crate::value::Value;

// -----------------------------------------------------------------------------
// MarshallDriver

/// Serializes a [`Value`] through the marshaller registered for a type.
///
/// Lets a marshalled graph be embedded in any `serde` output. Failures are
/// reported as the serializer's error; the typed [`MarshallError`] is kept by
/// the [`EncodeContext`].
///
/// # Examples
///
/// ```
/// use gw_marshal::codec::EncodeContext;
/// use gw_marshal::value::Value;
/// use gw_marshal::{EncodingSession, MappingRegistry};
///
/// let registry = MappingRegistry::new();
/// let mut session = EncodingSession::new();
/// let ctx = EncodeContext::new(&registry, &mut session);
///
/// let value = Value::List(vec![Value::Bool(true), Value::String("a".into())]);
/// let envelope = serde_json::json!({ "payload": ctx.encode("List", &value) });
/// assert_eq!(envelope.to_string(), r#"{"payload":[true,"a"]}"#);
/// ```
///
/// [`MarshallError`]: crate::MarshallError
pub struct MarshallDriver<'a, 'r> {
    value: &'a Value,
    type_name: &'a str,
    ctx: &'a EncodeContext<'r>,
}

impl<'a, 'r> MarshallDriver<'a, 'r> {
    /// Creates a driver encoding `value` as `type_name`.
    #[inline]
    pub const fn new(value: &'a Value, type_name: &'a str, ctx: &'a EncodeContext<'r>) -> Self {
        Self {
            value,
            type_name,
            ctx,
        }
    }
}

impl Serialize for MarshallDriver<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ctx.serialize_as(self.type_name, self.value, serializer)
    }
}

// -----------------------------------------------------------------------------
// DemarshallDriver

/// Deserializes a [`Value`] through the marshaller registered for a type.
///
/// The input is first read into a JSON tree, since decoding needs to look
/// up reserved keys in any order.
///
/// # Examples
///
/// ```
/// use serde_core::de::DeserializeSeed;
/// use gw_marshal::codec::{DecodeContext, DemarshallDriver};
/// use gw_marshal::value::{Number, Value};
/// use gw_marshal::{EncodingSession, MappingRegistry};
///
/// let registry = MappingRegistry::new();
/// let mut session = EncodingSession::new();
/// let mut ctx = DecodeContext::new(&registry, &mut session);
///
/// let mut de = serde_json::Deserializer::from_str("[1, 2]");
/// let value = DemarshallDriver::new("List<u8>", &mut ctx).deserialize(&mut de);
/// assert!(value.is_err()); // `List<u8>` is not registered by default
///
/// let mut de = serde_json::Deserializer::from_str("17");
/// let value = DemarshallDriver::new("u8", &mut ctx).deserialize(&mut de).unwrap();
/// assert_eq!(value, Value::Number(Number::U8(17)));
/// ```
pub struct DemarshallDriver<'a, 'r> {
    type_name: &'a str,
    ctx: &'a mut DecodeContext<'r>,
}

impl<'a, 'r> DemarshallDriver<'a, 'r> {
    /// Creates a driver decoding a `type_name`.
    #[inline]
    pub fn new(type_name: &'a str, ctx: &'a mut DecodeContext<'r>) -> Self {
        Self { type_name, ctx }
    }
}

impl<'de> DeserializeSeed<'de> for DemarshallDriver<'_, '_> {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let wire = JsonValue::deserialize(deserializer)?;
        self.ctx
            .demarshall_value(self.type_name, &wire)
            .map_err(D::Error::custom)
    }
}
