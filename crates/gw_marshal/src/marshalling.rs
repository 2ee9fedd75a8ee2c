use serde_json::Value as JsonValue;
use tracing::debug;

use crate::MarshallError;
use crate::codec;
use crate::definition::GetMappingDefinition;
use crate::marshallers::ANY_TYPE;
use crate::registry::{MappingRegistry, RegistryArc};
use crate::session::EncodingSession;
use crate::value::{FromValue, IntoValue, Shared, Value};

// -----------------------------------------------------------------------------
// Marshalling

/// One-call JSON marshalling over a shared registry.
///
/// Every call runs in a fresh [`EncodingSession`], so hashes restart at
/// `"1"` and no identity leaks between payloads.
///
/// # Examples
///
/// ```
/// use gw_marshal::definition::DefinitionBuilder;
/// use gw_marshal::value::shared;
/// use gw_marshal::{MappingRegistry, Marshalling};
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
/// let marshalling = Marshalling::new(registry);
///
/// let json = marshalling.to_json_as(shared(Point { x: 1, y: 2 }), "Point").unwrap();
/// let point: Option<gw_marshal::value::Shared<Point>> = marshalling.from_json_as(&json, "Point").unwrap();
/// assert_eq!(point.unwrap().read().unwrap().y, 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Marshalling {
    registry: RegistryArc,
}

impl Marshalling {
    /// Creates a facade owning `registry`.
    pub fn new(registry: MappingRegistry) -> Self {
        Self {
            registry: RegistryArc::new(registry),
        }
    }

    /// Creates a facade over an already shared registry.
    #[inline]
    pub fn from_arc(registry: RegistryArc) -> Self {
        Self { registry }
    }

    /// The shared registry.
    #[inline]
    pub fn registry(&self) -> &RegistryArc {
        &self.registry
    }

    /// Encodes `value` by its runtime type.
    pub fn to_json(&self, value: impl IntoValue) -> Result<String, MarshallError> {
        self.to_json_as(value, ANY_TYPE)
    }

    /// Encodes `value` as `type_name`.
    pub fn to_json_as(&self, value: impl IntoValue, type_name: &str) -> Result<String, MarshallError> {
        let value = value.into_value();
        let mut session = EncodingSession::new();
        let json = codec::to_string(&value, type_name, &self.registry.read(), &mut session)?;
        debug!(type_name, objects = session.len(), "marshalled payload");
        Ok(json)
    }

    /// Decodes `text` by the types its payload declares.
    pub fn from_json(&self, text: &str) -> Result<Value, MarshallError> {
        self.from_json_as(text, ANY_TYPE)
    }

    /// Decodes `text` as `type_name`, then converts the result to `T`.
    pub fn from_json_as<T: FromValue>(&self, text: &str, type_name: &str) -> Result<T, MarshallError> {
        let mut session = EncodingSession::new();
        let value = codec::from_str(text, type_name, &self.registry.read(), &mut session)?;
        debug!(type_name, objects = session.len(), "demarshalled payload");
        T::from_value(value)
    }

    /// Decodes a parsed JSON tree as `type_name`, then converts the result
    /// to `T`.
    pub fn from_value_as<T: FromValue>(&self, wire: &JsonValue, type_name: &str) -> Result<T, MarshallError> {
        let mut session = EncodingSession::new();
        let value = codec::from_value(wire, type_name, &self.registry.read(), &mut session)?;
        debug!(type_name, objects = session.len(), "demarshalled payload");
        T::from_value(value)
    }

    /// Encodes an object of a type with a registered definition.
    pub fn to_json_object<T: GetMappingDefinition>(&self, object: &Shared<T>) -> Result<String, MarshallError> {
        self.to_json_as(object.clone(), T::TYPE_NAME)
    }

    /// Decodes an object of a type with a registered definition.
    ///
    /// A `null` payload yields `None`.
    pub fn from_json_object<T: GetMappingDefinition>(&self, text: &str) -> Result<Option<Shared<T>>, MarshallError> {
        self.from_json_as(text, T::TYPE_NAME)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Marshalling;
    use crate::MarshallError;
    use crate::definition::{DefinitionBuilder, GetMappingDefinition, MappingDefinition};
    use crate::registry::MappingRegistry;
    use crate::value::{Number, Value, shared};

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    impl GetMappingDefinition for Counter {
        const TYPE_NAME: &'static str = "Counter";

        fn mapping_definition() -> Result<MappingDefinition, MarshallError> {
            DefinitionBuilder::<Self>::new(Self::TYPE_NAME)
                .default_instance()
                .field("hits", "u32", |c| c.hits, |c, v| c.hits = v)
                .build()
        }
    }

    fn marshalling() -> Marshalling {
        let mut registry = MappingRegistry::new();
        registry.register::<Counter>().unwrap();
        Marshalling::new(registry)
    }

    #[test]
    fn every_call_uses_a_fresh_session() {
        let marshalling = marshalling();
        let counter = shared(Counter { hits: 3 });
        let first = marshalling.to_json_object(&counter).unwrap();
        let second = marshalling.to_json_object(&counter).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, r#"{"encoded-type":"Counter","object-id":"1","hits":3}"#);
    }

    #[test]
    fn typed_objects_round_trip() {
        let marshalling = marshalling();
        let json = marshalling.to_json(shared(Counter { hits: 8 })).unwrap();
        let counter = marshalling.from_json_object::<Counter>(&json).unwrap().unwrap();
        assert_eq!(counter.read().unwrap().hits, 8);

        assert!(marshalling.from_json_object::<Counter>("null").unwrap().is_none());

        let err = marshalling.from_json_as::<u32>(&json, "Counter").unwrap_err();
        assert!(matches!(err, MarshallError::Conversion { .. }));
    }

    #[test]
    fn dynamic_values() {
        let marshalling = marshalling();
        let json = marshalling.to_json(vec![1_u8, 2]).unwrap();
        assert_eq!(
            marshalling.from_json(&json).unwrap(),
            Value::List(vec![Value::Number(Number::U8(1)), Value::Number(Number::U8(2))])
        );
    }
}
