use std::sync::Arc;

use serde_core::ser::SerializeMap;
use serde_core::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use super::{ENCODED_TYPE, ENUM_STRING_VALUE, INSTANTIATE_ONLY, Marshaller};
use super::{NUMERIC_VALUE, OBJECT_ID};
use crate::MarshallError;
use crate::codec::{DecodeContext, EncodeContext};
use crate::definition::{Arguments, MappingDefinition};
use crate::value::{EnumConstant, Number, ObjectRef, Value, json_kind};

// -----------------------------------------------------------------------------
// DefinitionMarshaller

/// Marshaller of a type described by a [`MappingDefinition`].
///
/// # Encoding
///
/// - `null` is written as `null`.
/// - An enum constant is written as `{"encoded-type", "enum-string-value"}`.
/// - An object already seen in this session is written as the back-reference
///   `{"encoded-type", "object-id"}`.
/// - Any other object gets a new hash and is written with every readable
///   member, or with `"instantiate-only": true` if it has none.
///
/// # Decoding
///
/// A payload with `object-id` resolves against the session first: exactly
/// two keys return the known instance, more keys update it. Unknown hashes
/// are instantiated, recorded, then populated from the writable members.
/// A bare reference to an unknown hash is therefore a forward reference:
/// later payloads with the same hash fill it in.
/// A payload with `enum-string-value` resolves the named constant.
///
/// # Examples
///
/// ```
/// use gw_marshal::definition::DefinitionBuilder;
/// use gw_marshal::value::{ObjectRef, Value};
/// use gw_marshal::{EncodingSession, MappingRegistry, codec};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
///
/// let mut registry = MappingRegistry::new();
/// registry.register_definition(
///     DefinitionBuilder::<Point>::new("Point")
///         .default_instance()
///         .field("x", "i32", |p| p.x, |p, v| p.x = v)
///         .field("y", "i32", |p| p.y, |p, v| p.y = v)
///         .build()
///         .unwrap(),
/// );
///
/// let point = Value::Object(ObjectRef::new(Point { x: 1, y: 2 }));
/// let mut session = EncodingSession::new();
/// let json = codec::to_string(&point, "Point", &registry, &mut session).unwrap();
/// assert_eq!(json, r#"{"encoded-type":"Point","object-id":"1","x":1,"y":2}"#);
///
/// let mut session = EncodingSession::new();
/// let decoded = codec::from_str(&json, "Point", &registry, &mut session).unwrap();
/// let decoded = decoded.as_object().unwrap();
/// assert_eq!(decoded.read(|p: &Point| (p.x, p.y)), Some((1, 2)));
/// assert!(session.get_instance("1").unwrap().ptr_eq(decoded));
/// ```
#[derive(Clone, Debug)]
pub struct DefinitionMarshaller {
    definition: Arc<MappingDefinition>,
}

impl DefinitionMarshaller {
    /// Creates the marshaller of `definition`.
    #[inline]
    pub fn new(definition: Arc<MappingDefinition>) -> Self {
        Self { definition }
    }

    /// The definition driving this marshaller.
    #[inline]
    pub fn definition(&self) -> &Arc<MappingDefinition> {
        &self.definition
    }
}

// -----------------------------------------------------------------------------
// Encoding

struct DefinitionOut<'a, 'r> {
    definition: &'a MappingDefinition,
    value: &'a Value,
    ctx: &'a EncodeContext<'r>,
}

impl DefinitionOut<'_, '_> {
    fn serialize_enum<S: Serializer>(
        &self,
        constant: &EnumConstant,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let def = self.definition;
        if !def.has_constant(constant.name()) {
            return Err(self.ctx.fail(MarshallError::UnknownEnumConstant {
                type_name: def.type_name().to_owned(),
                name: constant.name().to_owned(),
            }));
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(ENCODED_TYPE, def.type_name())?;
        map.serialize_entry(ENUM_STRING_VALUE, constant.name())?;
        map.end()
    }

    fn serialize_object<S: Serializer>(
        &self,
        instance: &ObjectRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let def = self.definition;
        if !def.accepts(instance) {
            return Err(self.ctx.fail(MarshallError::conversion(
                def.type_name(),
                instance.rust_type(),
            )));
        }

        let (hash, seen) = self.ctx.with_session(|session| match session.hash_of(instance) {
            Some(hash) => (hash.to_owned(), true),
            None => (session.get_or_assign_hash(instance).to_owned(), false),
        });

        if seen {
            trace!(type_name = def.type_name(), hash = %hash, "writing back-reference");
            let mut map = serializer.serialize_map(Some(2))?;
            map.serialize_entry(ENCODED_TYPE, def.type_name())?;
            map.serialize_entry(OBJECT_ID, &hash)?;
            return map.end();
        }

        trace!(type_name = def.type_name(), hash = %hash, "writing object");
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(ENCODED_TYPE, def.type_name())?;
        map.serialize_entry(OBJECT_ID, &hash)?;

        for member in def.readable() {
            // The getter releases the instance lock before recursing.
            let value = member
                .get(instance)
                .map_err(|e| self.ctx.fail::<S::Error>(e))?;
            if value.is_null() {
                map.serialize_entry(member.key(), &())?;
            } else {
                map.serialize_entry(member.key(), &self.ctx.encode(member.type_name(), &value))?;
            }
        }
        if def.readable().is_empty() {
            map.serialize_entry(INSTANTIATE_ONLY, &true)?;
        }
        map.end()
    }
}

impl Serialize for DefinitionOut<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let result = match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Enum(constant) => self.serialize_enum(constant, serializer),
            Value::Object(instance) => self.serialize_object(instance, serializer),
            other => Err(self.ctx.fail(MarshallError::conversion(
                self.definition.type_name(),
                other.kind(),
            ))),
        };
        result.map_err(|e| {
            self.ctx.annotate(self.definition.type_name());
            e
        })
    }
}

// -----------------------------------------------------------------------------
// Decoding

impl DefinitionMarshaller {
    fn demarshall_object(
        &self,
        map: &Map<String, JsonValue>,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Value, MarshallError> {
        let def = &*self.definition;
        let encoded_type = map
            .get(ENCODED_TYPE)
            .and_then(JsonValue::as_str)
            .unwrap_or(def.type_name());

        let Some(id) = map.get(OBJECT_ID) else {
            return match map.get(ENUM_STRING_VALUE) {
                Some(name) => self.demarshall_enum(encoded_type, name, ctx),
                None => Err(MarshallError::bad_payload(format!(
                    "expected `{OBJECT_ID}` or `{ENUM_STRING_VALUE}`"
                ))),
            };
        };

        if let Some(numeric) = map.get(NUMERIC_VALUE) {
            return Number::from_wire(encoded_type, numeric).map(Value::Number);
        }

        let hash = match id {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            other => {
                return Err(MarshallError::bad_payload(format!(
                    "`{OBJECT_ID}` must be a string, found {}",
                    json_kind(other)
                )));
            }
        };

        if let Some(instance) = ctx.session().get_instance(&hash).cloned() {
            if map.len() == 2 {
                trace!(type_name = def.type_name(), hash = %hash, "resolved back-reference");
                return Ok(Value::Object(instance));
            }
            self.populate(&instance, map, ctx)?;
            return Ok(Value::Object(instance));
        }

        if map.contains_key(INSTANTIATE_ONLY) {
            let instance = def.instantiate_default()?;
            ctx.session().record_instance(hash, instance.clone());
            return Ok(Value::Object(instance));
        }

        trace!(type_name = def.type_name(), hash = %hash, "instantiating object");
        let instance = self.instantiate(map, ctx)?;
        if ctx.session().get_instance(&hash).is_some() {
            return Err(MarshallError::bad_payload(format!(
                "`{OBJECT_ID}` {hash} is referenced from its own instantiation parameters"
            )));
        }
        // Recorded before population so cycles back to it resolve.
        ctx.session().record_instance(hash, instance.clone());
        self.populate(&instance, map, ctx)?;
        Ok(Value::Object(instance))
    }

    fn instantiate(
        &self,
        map: &Map<String, JsonValue>,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<ObjectRef, MarshallError> {
        let def = &*self.definition;
        let Some(strategy) = def.instantiation() else {
            return def.instantiate_default();
        };

        let mapping = strategy.mapping();
        let mut values = Vec::with_capacity(mapping.params().len());
        for param in mapping.params() {
            let value = match map.get(param.key()) {
                None | Some(JsonValue::Null) => Value::Null,
                Some(wire) => ctx.demarshall_value(param.type_name(), wire)?,
            };
            values.push((param.key().to_owned(), value));
        }
        let instance = mapping.invoke(Arguments::new(def.type_name(), values))?;
        if !def.accepts(&instance) {
            return Err(MarshallError::conversion(def.type_name(), instance.rust_type()));
        }
        Ok(instance)
    }

    fn populate(
        &self,
        instance: &ObjectRef,
        map: &Map<String, JsonValue>,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), MarshallError> {
        for member in self.definition.writable() {
            match map.get(member.key()) {
                None | Some(JsonValue::Null) => {}
                Some(wire) => {
                    let value = ctx.demarshall_value(member.type_name(), wire)?;
                    member.set(instance, value)?;
                }
            }
        }
        Ok(())
    }

    fn demarshall_enum(
        &self,
        encoded_type: &str,
        name: &JsonValue,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Value, MarshallError> {
        let def = if encoded_type == self.definition.type_name() {
            &*self.definition
        } else {
            &**ctx.registry().get_definition(encoded_type)?
        };
        let Some(name) = name.as_str() else {
            return Err(MarshallError::bad_payload(format!(
                "`{ENUM_STRING_VALUE}` must be a string, found {}",
                json_kind(name)
            )));
        };
        if !def.has_constant(name) {
            return Err(MarshallError::UnknownEnumConstant {
                type_name: def.type_name().to_owned(),
                name: name.to_owned(),
            });
        }
        Ok(Value::Enum(EnumConstant::new(
            def.type_name().to_owned(),
            name.to_owned(),
        )))
    }
}

impl Marshaller for DefinitionMarshaller {
    fn type_handled(&self) -> &str {
        self.definition.type_name()
    }

    fn marshall<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a EncodeContext<'_>,
    ) -> Box<dyn erased_serde::Serialize + 'a> {
        Box::new(DefinitionOut {
            definition: &self.definition,
            value,
            ctx,
        })
    }

    fn demarshall(&self, wire: &JsonValue, ctx: &mut DecodeContext<'_>) -> Result<Value, MarshallError> {
        let result = match wire {
            JsonValue::Object(map) => self.demarshall_object(map, ctx),
            other => Value::from_raw(other)
                .ok_or_else(|| MarshallError::bad_payload("unexpected JSON value")),
        };
        result.map_err(|e| MarshallError::Demarshall {
            type_name: self.definition.type_name().to_owned(),
            source: Box::new(e),
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
