use serde_core::ser::SerializeSeq;
use serde_core::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::{ANY_TYPE, Marshaller};
use crate::MarshallError;
use crate::codec::{DecodeContext, EncodeContext};
use crate::value::{Value, json_kind};

// -----------------------------------------------------------------------------
// ListMarshaller

/// Marshaller of lists, written as JSON arrays.
///
/// Each element goes through the marshaller of the element type. Lists are
/// values: the same list reached twice is written twice.
///
/// # Examples
///
/// ```
/// use gw_marshal::marshallers::{ListMarshaller, Marshaller};
///
/// assert_eq!(ListMarshaller::untyped().type_handled(), "List");
/// assert_eq!(ListMarshaller::of("i32").type_handled(), "List<i32>");
/// ```
#[derive(Clone, Debug)]
pub struct ListMarshaller {
    type_name: String,
    element: String,
}

impl ListMarshaller {
    /// The marshaller of `List<element>`.
    pub fn of(element: impl Into<String>) -> Self {
        let element = element.into();
        Self {
            type_name: format!("List<{element}>"),
            element,
        }
    }

    /// The marshaller of `List`, whose elements are encoded dynamically.
    pub fn untyped() -> Self {
        Self {
            type_name: "List".to_owned(),
            element: ANY_TYPE.to_owned(),
        }
    }

    /// The declared element type.
    #[inline]
    pub fn element_type(&self) -> &str {
        &self.element
    }
}

struct ListOut<'a, 'r> {
    marshaller: &'a ListMarshaller,
    value: &'a Value,
    ctx: &'a EncodeContext<'r>,
}

impl Serialize for ListOut<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.ctx.encode(&self.marshaller.element, item))?;
                }
                seq.end()
            }
            other => Err(self.ctx.fail(MarshallError::conversion(
                self.marshaller.type_name.as_str(),
                other.kind(),
            ))),
        }
    }
}

impl Marshaller for ListMarshaller {
    fn type_handled(&self) -> &str {
        &self.type_name
    }

    fn marshall<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a EncodeContext<'_>,
    ) -> Box<dyn erased_serde::Serialize + 'a> {
        Box::new(ListOut {
            marshaller: self,
            value,
            ctx,
        })
    }

    fn demarshall(&self, wire: &JsonValue, ctx: &mut DecodeContext<'_>) -> Result<Value, MarshallError> {
        match wire {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| ctx.demarshall_value(&self.element, item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            other => Err(MarshallError::conversion(self.type_name.as_str(), json_kind(other))),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ListMarshaller;
    use crate::codec;
    use crate::registry::MappingRegistry;
    use crate::session::EncodingSession;
    use crate::value::{Number, Value};

    fn registry() -> MappingRegistry {
        let mut registry = MappingRegistry::new();
        registry.register_marshaller(ListMarshaller::of("i32"));
        registry
    }

    #[test]
    fn typed_lists_write_raw_elements() {
        let registry = registry();
        let mut session = EncodingSession::new();
        let value = Value::List(vec![
            Value::Number(Number::I32(1)),
            Value::Null,
            Value::Number(Number::I64(2)),
        ]);
        let json = codec::to_string(&value, "List<i32>", &registry, &mut session).unwrap();
        assert_eq!(json, "[1,null,2]");
    }

    #[test]
    fn typed_lists_decode_elements() {
        let registry = registry();
        let mut session = EncodingSession::new();
        let value = codec::from_value(&json!([1, "2"]), "List<i32>", &registry, &mut session).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Number(Number::I32(1)), Value::Number(Number::I32(2))])
        );

        assert!(codec::from_value(&json!({}), "List<i32>", &registry, &mut session).is_err());
        assert!(codec::from_value(&json!([true]), "List<i32>", &registry, &mut session).is_err());
    }

    #[test]
    fn nested_lists() {
        let mut registry = registry();
        registry.register_marshaller(ListMarshaller::of("List<i32>"));
        let mut session = EncodingSession::new();

        let wire = json!([[1], [], [2, 3]]);
        let value = codec::from_value(&wire, "List<List<i32>>", &registry, &mut session).unwrap();
        let json = codec::to_string(&value, "List<List<i32>>", &registry, &mut session).unwrap();
        assert_eq!(json, "[[1],[],[2,3]]");
    }
}
