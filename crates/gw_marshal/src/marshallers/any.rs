use serde_core::ser::{SerializeMap, SerializeSeq};
use serde_core::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use tracing::trace;

use super::{ANY_TYPE, ENCODED_TYPE, Marshaller, NUMERIC_VALUE, OBJECT_ID};
use crate::MarshallError;
use crate::codec::{DecodeContext, EncodeContext};
use crate::value::{Number, Value};

// -----------------------------------------------------------------------------
// AnyMarshaller

/// Marshaller for values whose declared type is unknown.
///
/// Encoding dispatches on the runtime value:
///
/// - strings, booleans and chars are raw JSON scalars;
/// - numbers are boxed as `{"encoded-type", "object-id", "numeric-value"}`;
/// - enums and objects go through the marshaller of their registered type;
/// - lists become arrays of dynamically encoded elements.
///
/// Decoding reads objects by their `encoded-type`. Raw scalars carry no type,
/// so numbers come back as `i64`, `u64` or `f64`, and chars as strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyMarshaller;

struct AnyOut<'a, 'r> {
    value: &'a Value,
    ctx: &'a EncodeContext<'r>,
}

impl Serialize for AnyOut<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) => {
                let hash = self.ctx.with_session(|session| session.next_hash());
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry(ENCODED_TYPE, n.type_name())?;
                map.serialize_entry(OBJECT_ID, &hash)?;
                map.serialize_entry(NUMERIC_VALUE, n)?;
                map.end()
            }
            Value::Enum(constant) => {
                self.ctx
                    .serialize_as(constant.type_name(), self.value, serializer)
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.ctx.encode(ANY_TYPE, item))?;
                }
                seq.end()
            }
            Value::Object(instance) => match self.ctx.registry().definition_for(instance) {
                Ok(definition) => {
                    trace!(type_name = definition.type_name(), "dispatching object");
                    self.ctx
                        .serialize_as(definition.type_name(), self.value, serializer)
                }
                Err(e) => Err(self.ctx.fail(e)),
            },
        }
    }
}

impl Marshaller for AnyMarshaller {
    fn type_handled(&self) -> &str {
        ANY_TYPE
    }

    fn marshall<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a EncodeContext<'_>,
    ) -> Box<dyn erased_serde::Serialize + 'a> {
        Box::new(AnyOut { value, ctx })
    }

    fn demarshall(&self, wire: &JsonValue, ctx: &mut DecodeContext<'_>) -> Result<Value, MarshallError> {
        match wire {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => Ok(Value::Number(Number::from_json(n))),
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| ctx.demarshall_value(ANY_TYPE, item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            JsonValue::Object(map) => {
                let Some(type_name) = map.get(ENCODED_TYPE).and_then(JsonValue::as_str) else {
                    return Err(MarshallError::bad_payload(format!(
                        "object without `{ENCODED_TYPE}` in an untyped position"
                    )));
                };
                ctx.demarshall_value(type_name, wire)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::MarshallError;
    use crate::codec;
    use crate::registry::MappingRegistry;
    use crate::session::EncodingSession;
    use crate::value::{Number, ObjectRef, Value};

    #[test]
    fn numbers_are_boxed_with_fresh_ids() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let value = Value::List(vec![
            Value::Number(Number::F64(0.5)),
            Value::Number(Number::U8(1)),
        ]);
        let json = codec::to_string(&value, "any", &registry, &mut session).unwrap();
        assert_eq!(
            json,
            r#"[{"encoded-type":"f64","object-id":"1","numeric-value":0.5},{"encoded-type":"u8","object-id":"2","numeric-value":1}]"#
        );
    }

    #[test]
    fn boxed_numbers_keep_their_type() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let wire = json!({"encoded-type": "i16", "object-id": "7", "numeric-value": "-3"});
        let value = codec::from_value(&wire, "any", &registry, &mut session).unwrap();
        assert_eq!(value, Value::Number(Number::I16(-3)));
    }

    #[test]
    fn raw_scalars_decode_untyped() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let value = codec::from_value(&json!([1, -1, 1.5, "c", true, null]), "any", &registry, &mut session).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Number(Number::I64(1)),
                Value::Number(Number::I64(-1)),
                Value::Number(Number::F64(1.5)),
                Value::String("c".into()),
                Value::Bool(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn untyped_objects_are_rejected() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let err = codec::from_value(&json!({"x": 1}), "any", &registry, &mut session).unwrap_err();
        assert!(matches!(err, MarshallError::BadPayload { .. }));
    }

    #[test]
    fn unregistered_objects_fail() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let value = Value::Object(ObjectRef::new(3_u32));
        let err = codec::to_string(&value, "any", &registry, &mut session).unwrap_err();
        assert!(matches!(err, MarshallError::UnregisteredType { .. }));
        assert!(err.is_configuration());
    }
}
