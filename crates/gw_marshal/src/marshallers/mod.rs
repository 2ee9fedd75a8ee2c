//! Marshallers: per-type encoders and decoders.
//!
//! A [`Marshaller`] is registered under the type name it handles and is
//! resolved by declared type at every member, parameter and list element.
//!
//! ## Menu
//!
//! - [`PrimitiveMarshaller`]: numbers, `bool`, `char` and `String`.
//! - [`ListMarshaller`]: JSON arrays with a declared element type.
//! - [`AnyMarshaller`]: dispatches on the runtime type of a value.
//! - [`DefinitionMarshaller`]: object graphs and enums, driven by a
//!   [`MappingDefinition`](crate::definition::MappingDefinition).
//!
//! ## Wire keys
//!
//! Objects on the wire are JSON objects using the reserved keys below
//! alongside member keys.
//!
//! | Key | Meaning |
//! |---|---|
//! | [`ENCODED_TYPE`] | registered type name |
//! | [`OBJECT_ID`] | session-scoped identity hash |
//! | [`NUMERIC_VALUE`] | value of a boxed number |
//! | [`ENUM_STRING_VALUE`] | name of an enum constant |
//! | [`INSTANTIATE_ONLY`] | construct through the no-argument strategy |

// -----------------------------------------------------------------------------
// Modules

mod any;
mod definition;
mod list;
mod primitive;

// -----------------------------------------------------------------------------
// Exports

pub use any::AnyMarshaller;
pub use definition::DefinitionMarshaller;
pub use list::ListMarshaller;
pub use primitive::PrimitiveMarshaller;

use serde_json::Value as JsonValue;

use crate::MarshallError;
use crate::codec::{DecodeContext, EncodeContext};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Wire keys

/// Registered type name of the encoded value.
pub const ENCODED_TYPE: &str = "encoded-type";
/// Session-scoped identity hash.
pub const OBJECT_ID: &str = "object-id";
/// Value of a boxed number.
pub const NUMERIC_VALUE: &str = "numeric-value";
/// Name of an enum constant.
pub const ENUM_STRING_VALUE: &str = "enum-string-value";
/// Marks a stateless object.
pub const INSTANTIATE_ONLY: &str = "instantiate-only";

/// Keys no mapping may use.
pub const RESERVED_KEYS: &[&str] = &[
    ENCODED_TYPE,
    OBJECT_ID,
    NUMERIC_VALUE,
    ENUM_STRING_VALUE,
    INSTANTIATE_ONLY,
];

/// The type name of the dynamic marshaller.
pub const ANY_TYPE: &str = "any";

// -----------------------------------------------------------------------------
// Marshaller

/// Encodes and decodes values of one declared type.
pub trait Marshaller: Send + Sync + 'static {
    /// The type name this marshaller is registered under.
    fn type_handled(&self) -> &str;

    /// Returns a [`Serialize`](serde_core::Serialize) view writing `value`.
    ///
    /// Nothing is written until the view is serialized. Failures must go
    /// through [`EncodeContext::fail`] so the typed error is kept.
    fn marshall<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a EncodeContext<'_>,
    ) -> Box<dyn erased_serde::Serialize + 'a>;

    /// Decodes `wire` into a value.
    fn demarshall(&self, wire: &JsonValue, ctx: &mut DecodeContext<'_>) -> Result<Value, MarshallError>;
}
