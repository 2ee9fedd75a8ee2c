use serde_core::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::{ENCODED_TYPE, Marshaller, NUMERIC_VALUE};
use crate::MarshallError;
use crate::codec::{DecodeContext, EncodeContext};
use crate::value::{Number, Value, json_kind};

// -----------------------------------------------------------------------------
// PrimitiveMarshaller

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Primitive {
    Bool,
    Char,
    String,
    Number(&'static str),
}

/// Marshaller of a scalar type, written as a raw JSON scalar.
///
/// Numeric marshallers also decode numeric strings and boxed numbers
/// (`{"numeric-value": ..}`), converting them to the declared type.
#[derive(Clone, Copy, Debug)]
pub struct PrimitiveMarshaller {
    kind: Primitive,
}

impl PrimitiveMarshaller {
    /// The `bool` marshaller.
    pub const fn bool() -> Self {
        Self { kind: Primitive::Bool }
    }

    /// The `char` marshaller.
    pub const fn char() -> Self {
        Self { kind: Primitive::Char }
    }

    /// The `String` marshaller.
    pub const fn string() -> Self {
        Self {
            kind: Primitive::String,
        }
    }

    /// The marshaller of a numeric type such as `"i32"`.
    ///
    /// Returns `None` for names that are not numeric types.
    pub fn number(type_name: &str) -> Option<Self> {
        Number::TYPE_NAMES
            .iter()
            .find(|name| **name == type_name)
            .map(|name| Self {
                kind: Primitive::Number(*name),
            })
    }

    /// Every primitive marshaller.
    pub fn all() -> impl Iterator<Item = Self> {
        let numbers = Number::TYPE_NAMES.iter().map(|name| Self {
            kind: Primitive::Number(*name),
        });
        [Self::bool(), Self::char(), Self::string()].into_iter().chain(numbers)
    }
}

struct PrimitiveOut<'a, 'r> {
    kind: Primitive,
    value: &'a Value,
    ctx: &'a EncodeContext<'r>,
}

impl Serialize for PrimitiveOut<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.kind, self.value) {
            (_, Value::Null) => serializer.serialize_unit(),
            (Primitive::Bool, Value::Bool(b)) => serializer.serialize_bool(*b),
            (Primitive::Char, Value::Char(c)) => serializer.serialize_char(*c),
            (Primitive::String, Value::String(s)) => serializer.serialize_str(s),
            (Primitive::String, Value::Char(c)) => serializer.serialize_char(*c),
            (Primitive::Number(type_name), Value::Number(n)) => match n.convert_to(type_name) {
                Ok(n) => n.serialize(serializer),
                Err(e) => Err(self.ctx.fail(e)),
            },
            (kind, other) => Err(self.ctx.fail(MarshallError::conversion(
                type_name_of(kind),
                other.kind(),
            ))),
        }
    }
}

fn type_name_of(kind: Primitive) -> &'static str {
    match kind {
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::String => "String",
        Primitive::Number(name) => name,
    }
}

impl Marshaller for PrimitiveMarshaller {
    fn type_handled(&self) -> &str {
        type_name_of(self.kind)
    }

    fn marshall<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a EncodeContext<'_>,
    ) -> Box<dyn erased_serde::Serialize + 'a> {
        Box::new(PrimitiveOut {
            kind: self.kind,
            value,
            ctx,
        })
    }

    fn demarshall(&self, wire: &JsonValue, _ctx: &mut DecodeContext<'_>) -> Result<Value, MarshallError> {
        let mismatch = || MarshallError::conversion(type_name_of(self.kind), json_kind(wire));
        match (self.kind, wire) {
            (_, JsonValue::Null) => Ok(Value::Null),
            (Primitive::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
            (Primitive::Char, JsonValue::String(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(mismatch()),
                }
            }
            (Primitive::String, JsonValue::String(s)) => Ok(Value::String(s.clone())),
            (Primitive::Number(type_name), JsonValue::Object(map)) => {
                let boxed = map.get(NUMERIC_VALUE).ok_or_else(mismatch)?;
                let boxed_type = map
                    .get(ENCODED_TYPE)
                    .and_then(JsonValue::as_str)
                    .unwrap_or(type_name);
                let n = Number::from_wire(boxed_type, boxed)?;
                n.convert_to(type_name).map(Value::Number)
            }
            (Primitive::Number(type_name), _) => Number::from_wire(type_name, wire).map(Value::Number),
            _ => Err(mismatch()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PrimitiveMarshaller;
    use crate::MarshallError;
    use crate::codec::{self, DecodeContext};
    use crate::marshallers::Marshaller;
    use crate::registry::MappingRegistry;
    use crate::session::EncodingSession;
    use crate::value::{Number, Value};

    fn decode(m: &PrimitiveMarshaller, wire: serde_json::Value) -> Result<Value, MarshallError> {
        let registry = MappingRegistry::empty();
        let mut session = EncodingSession::new();
        m.demarshall(&wire, &mut DecodeContext::new(&registry, &mut session))
    }

    #[test]
    fn registry_names() {
        let names: Vec<_> = PrimitiveMarshaller::all()
            .map(|m| m.type_handled().to_owned())
            .collect();
        assert!(names.contains(&"bool".to_owned()));
        assert!(names.contains(&"String".to_owned()));
        assert!(names.contains(&"f64".to_owned()));
        assert_eq!(names.len(), 13);
        assert!(PrimitiveMarshaller::number("Point").is_none());
    }

    #[test]
    fn numbers_are_converted_to_the_declared_type() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let json = codec::to_string(&Value::Number(Number::I64(9)), "u8", &registry, &mut session);
        assert_eq!(json.unwrap(), "9");

        let err = codec::to_string(&Value::Number(Number::I64(-9)), "u8", &registry, &mut session);
        assert!(matches!(err, Err(MarshallError::Conversion { .. })));

        let err = codec::to_string(&Value::Bool(true), "u8", &registry, &mut session);
        assert!(matches!(err, Err(MarshallError::Conversion { .. })));
    }

    #[test]
    fn decode_scalars() {
        let u8m = PrimitiveMarshaller::number("u8").unwrap();
        assert_eq!(decode(&u8m, json!(200)).unwrap(), Value::Number(Number::U8(200)));
        assert_eq!(decode(&u8m, json!("200")).unwrap(), Value::Number(Number::U8(200)));
        assert_eq!(decode(&u8m, json!(null)).unwrap(), Value::Null);
        assert_eq!(
            decode(&u8m, json!({"encoded-type": "i64", "object-id": "3", "numeric-value": 4})).unwrap(),
            Value::Number(Number::U8(4))
        );
        assert!(decode(&u8m, json!({"object-id": "3"})).is_err());

        let c = PrimitiveMarshaller::char();
        assert_eq!(decode(&c, json!("z")).unwrap(), Value::Char('z'));
        assert!(decode(&c, json!("zz")).is_err());

        let s = PrimitiveMarshaller::string();
        assert_eq!(decode(&s, json!("z")).unwrap(), Value::String("z".into()));
        assert!(decode(&s, json!(1)).is_err());

        let b = PrimitiveMarshaller::bool();
        assert_eq!(decode(&b, json!(false)).unwrap(), Value::Bool(false));
        assert!(decode(&b, json!("false")).is_err());
    }
}
