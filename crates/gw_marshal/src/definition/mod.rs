//! Declarative per-type mapping definitions.
//!
//! A [`MappingDefinition`] says how instances of one type are created when
//! decoding, and which members are written and read on the wire. Definitions
//! are built once, usually through [`DefinitionBuilder`], and are immutable
//! afterwards.
//!
//! ## Menu
//!
//! - [`Mapping`]: a wire key and the declared type it carries.
//! - [`MemberMapping`]: a [`Mapping`] bound to a field or accessor.
//! - [`InstantiationStrategy`]: constructor or factory, with its parameters.
//! - [`DefinitionBuilder`]: builds and validates a definition for `T`.
//! - [`GetMappingDefinition`]: implemented by types that know their definition.
//! - [`impl_wire_enum`](crate::impl_wire_enum): enum definitions for unit enums.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod mapping;
mod wire_enum;

// -----------------------------------------------------------------------------
// Exports

pub use builder::DefinitionBuilder;
pub use mapping::{Arguments, BindingKind, InstantiationMapping, InstantiationStrategy};
pub use mapping::{Mapping, MemberMapping};

use core::any::{Any, TypeId};
use core::fmt;
use std::borrow::Cow;

use crate::MarshallError;
use crate::registry::MappingRegistry;
use crate::value::ObjectRef;

use mapping::NoArg;

// -----------------------------------------------------------------------------
// MappingDefinition

/// How one type is marshalled.
///
/// Object definitions carry an optional [`InstantiationStrategy`], an
/// optional no-argument strategy and two ordered member lists. Enum
/// definitions carry their constant names instead.
///
/// # Examples
///
/// ```
/// use gw_marshal::definition::{DefinitionBuilder, MappingDefinition};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
///
/// let definition = DefinitionBuilder::<Point>::new("Point")
///     .default_instance()
///     .field("x", "i32", |p| p.x, |p, v| p.x = v)
///     .field("y", "i32", |p| p.y, |p, v| p.y = v)
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.type_name(), "Point");
/// assert_eq!(definition.readable().len(), 2);
///
/// let colors = MappingDefinition::enumeration("Color", ["Red", "Green"]);
/// assert!(colors.has_constant("Green"));
/// ```
pub struct MappingDefinition {
    type_name: Cow<'static, str>,
    type_id: Option<TypeId>,
    instantiation: Option<InstantiationStrategy>,
    no_arg: Option<NoArg>,
    readable: Box<[MemberMapping]>,
    writable: Box<[MemberMapping]>,
    enum_constants: Option<Box<[Cow<'static, str>]>>,
}

impl MappingDefinition {
    /// Creates an enum definition with the given constants.
    pub fn enumeration<I, S>(type_name: impl Into<Cow<'static, str>>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            type_name: type_name.into(),
            type_id: None,
            instantiation: None,
            no_arg: None,
            readable: Box::new([]),
            writable: Box::new([]),
            enum_constants: Some(constants.into_iter().map(Into::into).collect()),
        }
    }

    /// The registered type name, written as `encoded-type`.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The Rust type of instances, for object definitions.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// The constructor or factory used for full objects.
    #[inline]
    pub fn instantiation(&self) -> Option<&InstantiationStrategy> {
        self.instantiation.as_ref()
    }

    /// Returns `true` if there is a no-argument strategy.
    #[inline]
    pub fn has_no_arg(&self) -> bool {
        self.no_arg.is_some()
    }

    /// Members read when encoding, in wire order.
    #[inline]
    pub fn readable(&self) -> &[MemberMapping] {
        &self.readable
    }

    /// Members written when decoding.
    #[inline]
    pub fn writable(&self) -> &[MemberMapping] {
        &self.writable
    }

    /// Returns `true` for enum definitions.
    #[inline]
    pub fn is_enum(&self) -> bool {
        self.enum_constants.is_some()
    }

    /// The enum constant names, for enum definitions.
    #[inline]
    pub fn enum_constants(&self) -> Option<&[Cow<'static, str>]> {
        self.enum_constants.as_deref()
    }

    /// Returns `true` if this is an enum declaring `name`.
    pub fn has_constant(&self, name: &str) -> bool {
        self.enum_constants
            .as_deref()
            .is_some_and(|constants| constants.iter().any(|c| c == name))
    }

    /// Creates an instance through the no-argument strategy.
    pub fn instantiate_default(&self) -> Result<ObjectRef, MarshallError> {
        match &self.no_arg {
            Some(no_arg) => Ok(no_arg()),
            None => Err(MarshallError::NoDefaultInstance {
                type_name: self.type_name.to_string(),
            }),
        }
    }

    /// Returns `true` if `instance` has the Rust type this definition maps.
    #[inline]
    pub fn accepts(&self, instance: &ObjectRef) -> bool {
        self.type_id == Some(instance.type_id())
    }
}

impl fmt::Debug for MappingDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDefinition")
            .field("type_name", &self.type_name)
            .field("instantiation", &self.instantiation)
            .field("no_arg", &self.no_arg.is_some())
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("enum_constants", &self.enum_constants)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetMappingDefinition

/// A type that can describe its own [`MappingDefinition`].
///
/// Registered through [`MappingRegistry::register`].
pub trait GetMappingDefinition: Any + Send + Sync {
    /// The name the definition is registered under.
    const TYPE_NAME: &'static str;

    /// Builds the definition.
    fn mapping_definition() -> Result<MappingDefinition, MarshallError>;

    /// Registers the definitions of types this one refers to.
    ///
    /// Called once, right after the type itself is registered.
    fn register_dependencies(_registry: &mut MappingRegistry) -> Result<(), MarshallError> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::MappingDefinition;

    #[test]
    fn enumeration_has_no_members() {
        let def = MappingDefinition::enumeration("Color", ["Red", "Green"]);
        assert!(def.is_enum());
        assert!(def.type_id().is_none());
        assert!(def.readable().is_empty());
        assert!(def.has_constant("Red"));
        assert!(!def.has_constant("Blue"));
        assert!(def.instantiate_default().is_err());
        assert_eq!(def.enum_constants().map(<[_]>::len), Some(2));
    }
}
