//! Encode and decode entry points.
//!
//! ## Encoding
//!
//! - [`EncodeContext`]: registry, session and failure stash of one pass.
//! - [`MarshallDriver`]: a [`Serialize`](serde_core::Serialize) view of a
//!   value, written by the marshaller of its declared type.
//! - [`to_writer`] / [`to_string`]: stream a value to JSON and surface the
//!   typed [`MarshallError`] on failure.
//!
//! ## Decoding
//!
//! - [`DecodeContext`]: registry and session of one pass.
//! - [`DemarshallDriver`]: a [`DeserializeSeed`](serde_core::de::DeserializeSeed)
//!   producing a [`Value`].
//! - [`from_str`] / [`from_value`]: decode a JSON payload.
//!
//! Every function takes the session explicitly. Use a fresh one per pass.
//!
//! Both directions stop at [`DEFAULT_MAX_DEPTH`] nested marshaller calls
//! with [`MarshallError::DepthLimitExceeded`], so a payload this module
//! writes can always be read back.

// -----------------------------------------------------------------------------
// Modules

mod context;
mod driver;

// -----------------------------------------------------------------------------
// Exports

pub use context::{DEFAULT_MAX_DEPTH, DecodeContext, EncodeContext, MAX_JSON_DEPTH};
pub use driver::{DemarshallDriver, MarshallDriver};

use std::io;

use serde_json::Value as JsonValue;

use crate::MarshallError;
use crate::registry::MappingRegistry;
use crate::session::EncodingSession;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Functions

/// Streams `value`, encoded as `type_name`, into `writer`.
///
/// Output reaches `writer` as it is produced. On `Err` the writer holds a
/// truncated payload that must be discarded; encode with [`to_string`] to
/// get all or nothing.
pub fn to_writer<W: io::Write>(
    writer: W,
    value: &Value,
    type_name: &str,
    registry: &MappingRegistry,
    session: &mut EncodingSession,
) -> Result<(), MarshallError> {
    let ctx = EncodeContext::new(registry, session);
    let result = serde_json::to_writer(writer, &ctx.encode(type_name, value));
    result.map_err(|e| ctx.take_failure().unwrap_or(MarshallError::Json(e)))
}

/// Encodes `value` as `type_name` into a JSON string.
///
/// # Examples
///
/// ```
/// use gw_marshal::codec;
/// use gw_marshal::value::{Number, Value};
/// use gw_marshal::{EncodingSession, MappingRegistry};
///
/// let registry = MappingRegistry::new();
/// let mut session = EncodingSession::new();
///
/// let json = codec::to_string(&Value::Number(Number::I32(5)), "any", &registry, &mut session).unwrap();
/// assert_eq!(json, r#"{"encoded-type":"i32","object-id":"1","numeric-value":5}"#);
/// ```
pub fn to_string(
    value: &Value,
    type_name: &str,
    registry: &MappingRegistry,
    session: &mut EncodingSession,
) -> Result<String, MarshallError> {
    let ctx = EncodeContext::new(registry, session);
    let result = serde_json::to_string(&ctx.encode(type_name, value));
    result.map_err(|e| ctx.take_failure().unwrap_or(MarshallError::Json(e)))
}

/// Decodes a JSON text as `type_name`.
///
/// Text nested deeper than [`MAX_JSON_DEPTH`] is rejected by the parser as
/// a [`MarshallError::Json`] error.
pub fn from_str(
    text: &str,
    type_name: &str,
    registry: &MappingRegistry,
    session: &mut EncodingSession,
) -> Result<Value, MarshallError> {
    let wire: JsonValue = serde_json::from_str(text)?;
    from_value(&wire, type_name, registry, session)
}

/// Decodes a parsed JSON tree as `type_name`.
pub fn from_value(
    wire: &JsonValue,
    type_name: &str,
    registry: &MappingRegistry,
    session: &mut EncodingSession,
) -> Result<Value, MarshallError> {
    DecodeContext::new(registry, session).demarshall_value(type_name, wire)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use std::thread;

    use super::{DEFAULT_MAX_DEPTH, DecodeContext, EncodeContext, from_str, to_string, to_writer};
    use crate::MarshallError;
    use crate::definition::DefinitionBuilder;
    use crate::registry::MappingRegistry;
    use crate::session::EncodingSession;
    use crate::value::{Number, ObjectRef, Shared, Value, shared};

    #[derive(Default)]
    struct Link {
        next: Option<Shared<Link>>,
    }

    fn link_registry() -> MappingRegistry {
        let mut registry = MappingRegistry::new();
        registry.register_definition(
            DefinitionBuilder::<Link>::new("Link")
                .default_instance()
                .field("next", "Link", |l| l.next.clone(), |l, v| l.next = v)
                .build()
                .unwrap(),
        );
        registry
    }

    fn chain(len: usize) -> Value {
        let mut head = None;
        for _ in 0..len {
            head = Some(shared(Link { next: head }));
        }
        head.map_or(Value::Null, |head| Value::Object(ObjectRef::from_shared(head)))
    }

    fn chain_wire(len: usize) -> serde_json::Value {
        (1..=len).rev().fold(serde_json::Value::Null, |next, id| {
            json!({"encoded-type": "Link", "object-id": id.to_string(), "next": next})
        })
    }

    // Debug builds use a lot of stack per level.
    fn on_large_stack(f: impl FnOnce() + Send + 'static) {
        thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn missing_marshaller_is_typed() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let err = to_string(&Value::Null, "Nope", &registry, &mut session).unwrap_err();
        assert!(matches!(err, MarshallError::MissingMarshaller { .. }));

        let err = from_str("{}", "Nope", &registry, &mut session).unwrap_err();
        assert!(matches!(err, MarshallError::MissingMarshaller { .. }));
    }

    #[test]
    fn syntax_errors_are_json_errors() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let err = from_str("{", "any", &registry, &mut session).unwrap_err();
        assert!(matches!(err, MarshallError::Json(_)));
    }

    #[test]
    fn writer_receives_output() {
        let registry = MappingRegistry::new();
        let mut session = EncodingSession::new();
        let mut out = Vec::new();
        let value = Value::List(vec![
            Value::Number(Number::U16(3)),
            Value::Null,
            Value::String("s".into()),
        ]);
        to_writer(&mut out, &value, "List", &registry, &mut session).unwrap();

        let written: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            written,
            json!([
                {"encoded-type": "u16", "object-id": "1", "numeric-value": 3},
                null,
                "s"
            ])
        );
    }

    #[test]
    fn failed_writer_output_is_truncated() {
        let registry = MappingRegistry::new();
        let mut out = Vec::new();
        let value = Value::List(vec![
            Value::String("first".into()),
            Value::Object(ObjectRef::new(7_u32)),
        ]);
        let err = to_writer(&mut out, &value, "List", &registry, &mut EncodingSession::new()).unwrap_err();
        assert!(matches!(err.root_cause(), MarshallError::UnregisteredType { .. }));
        assert_eq!(out, br#"["first","#);
        assert!(serde_json::from_slice::<serde_json::Value>(&out).is_err());
    }

    #[test]
    fn chain_at_the_depth_limit_round_trips() {
        on_large_stack(|| {
            let registry = link_registry();
            let value = chain(DEFAULT_MAX_DEPTH);
            let json = to_string(&value, "Link", &registry, &mut EncodingSession::new()).unwrap();

            let mut session = EncodingSession::new();
            let decoded = from_str(&json, "Link", &registry, &mut session).unwrap();
            assert!(decoded.as_object().unwrap().is::<Link>());
            assert_eq!(session.len(), DEFAULT_MAX_DEPTH);
        });
    }

    #[test]
    fn chain_past_the_depth_limit_is_rejected() {
        on_large_stack(|| {
            let registry = link_registry();
            let value = chain(DEFAULT_MAX_DEPTH + 1);
            let err = to_string(&value, "Link", &registry, &mut EncodingSession::new()).unwrap_err();
            assert!(matches!(
                err.root_cause(),
                MarshallError::DepthLimitExceeded { limit: DEFAULT_MAX_DEPTH }
            ));

            let text = chain_wire(DEFAULT_MAX_DEPTH + 1).to_string();
            let err = from_str(&text, "Link", &registry, &mut EncodingSession::new()).unwrap_err();
            assert!(matches!(
                err.root_cause(),
                MarshallError::DepthLimitExceeded { limit: DEFAULT_MAX_DEPTH }
            ));
        });
    }

    #[test]
    fn configured_limit_applies_both_ways() {
        let registry = link_registry();

        let mut session = EncodingSession::new();
        let ctx = EncodeContext::new(&registry, &mut session).with_max_depth(3);
        let value = chain(3);
        serde_json::to_string(&ctx.encode("Link", &value)).unwrap();
        let value = chain(4);
        assert!(serde_json::to_string(&ctx.encode("Link", &value)).is_err());
        let failure = ctx.take_failure().unwrap();
        assert!(matches!(failure.root_cause(), MarshallError::DepthLimitExceeded { limit: 3 }));

        let mut session = EncodingSession::new();
        let mut ctx = DecodeContext::new(&registry, &mut session).with_max_depth(3);
        ctx.demarshall_value("Link", &chain_wire(3)).unwrap();

        let mut session = EncodingSession::new();
        let mut ctx = DecodeContext::new(&registry, &mut session).with_max_depth(3);
        let err = ctx.demarshall_value("Link", &chain_wire(4)).unwrap_err();
        assert!(matches!(err.root_cause(), MarshallError::DepthLimitExceeded { limit: 3 }));
    }
}
