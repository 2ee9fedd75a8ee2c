use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use crate::MarshallError;
use crate::value::{FromValue, ObjectRef, Value};

// -----------------------------------------------------------------------------
// Mapping

/// Associates a wire key with the declared type of what it carries.
///
/// The declared type name selects the marshaller for the value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    key: Cow<'static, str>,
    type_name: Cow<'static, str>,
}

impl Mapping {
    /// Creates a mapping of `key` to a value of `type_name`.
    pub fn new(key: impl Into<Cow<'static, str>>, type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
        }
    }

    /// The wire key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The declared type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

// -----------------------------------------------------------------------------
// MemberMapping

/// How a member is bound to the instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    /// Direct field access.
    Field,
    /// An accessor and/or mutator pair.
    Accessor,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Field => "field",
            Self::Accessor => "accessor",
        })
    }
}

pub(crate) type Getter = Arc<dyn Fn(&ObjectRef) -> Result<Value, MarshallError> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&ObjectRef, Value) -> Result<(), MarshallError> + Send + Sync>;

/// A member of a mapped type, bound to a wire key.
///
/// Readable members carry a getter and are used for encoding; writable
/// members carry a setter and are used for decoding.
#[derive(Clone)]
pub struct MemberMapping {
    mapping: Mapping,
    owner: Cow<'static, str>,
    kind: BindingKind,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl MemberMapping {
    pub(crate) fn new(
        mapping: Mapping,
        owner: Cow<'static, str>,
        kind: BindingKind,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        Self {
            mapping,
            owner,
            kind,
            getter,
            setter,
        }
    }

    /// The key and declared type.
    #[inline]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The wire key.
    #[inline]
    pub fn key(&self) -> &str {
        self.mapping.key()
    }

    /// The declared type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.mapping.type_name()
    }

    /// How the member is bound.
    #[inline]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Returns `true` if the member can be read.
    #[inline]
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Returns `true` if the member can be written.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the member from `instance`.
    pub fn get(&self, instance: &ObjectRef) -> Result<Value, MarshallError> {
        let result = match &self.getter {
            Some(getter) => getter(instance),
            None => Err(self.unbound("getter")),
        };
        result.map_err(|e| self.access_error(e))
    }

    /// Writes `value` into the member of `instance`.
    pub fn set(&self, instance: &ObjectRef, value: Value) -> Result<(), MarshallError> {
        let result = match &self.setter {
            Some(setter) => setter(instance, value),
            None => Err(self.unbound("setter")),
        };
        result.map_err(|e| self.access_error(e))
    }

    fn unbound(&self, what: &str) -> MarshallError {
        MarshallError::InvalidDefinition {
            type_name: self.owner.to_string(),
            reason: format!("member `{}` has no {what}", self.key()),
        }
    }

    fn access_error(&self, source: MarshallError) -> MarshallError {
        MarshallError::MemberAccess {
            type_name: self.owner.to_string(),
            member: self.key().to_owned(),
            kind: self.kind,
            source: Box::new(source),
        }
    }
}

impl fmt::Debug for MemberMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMapping")
            .field("key", &self.key())
            .field("type_name", &self.type_name())
            .field("kind", &self.kind)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Instantiation

pub(crate) type Construct = Arc<dyn Fn(Arguments) -> Result<ObjectRef, MarshallError> + Send + Sync>;
pub(crate) type NoArg = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// Decoded instantiation arguments, in declared parameter order.
pub struct Arguments {
    type_name: String,
    values: std::vec::IntoIter<(String, Value)>,
}

impl Arguments {
    pub(crate) fn new(type_name: impl Into<String>, values: Vec<(String, Value)>) -> Self {
        Self {
            type_name: type_name.into(),
            values: values.into_iter(),
        }
    }

    /// Takes the next argument, converted to `A`.
    pub fn next<A: FromValue>(&mut self) -> Result<A, MarshallError> {
        let Some((key, value)) = self.values.next() else {
            return Err(MarshallError::Instantiation {
                type_name: self.type_name.clone(),
                reason: "not enough arguments".into(),
            });
        };
        A::from_value(value).map_err(|e| MarshallError::Instantiation {
            type_name: self.type_name.clone(),
            reason: format!("argument `{key}`: {e}"),
        })
    }

    /// The number of arguments not taken yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// The ordered parameters of a constructor or factory, and the typed
/// closure invoking it.
#[derive(Clone)]
pub struct InstantiationMapping {
    params: Box<[Mapping]>,
    construct: Construct,
}

impl InstantiationMapping {
    pub(crate) fn new(params: Box<[Mapping]>, construct: Construct) -> Self {
        Self { params, construct }
    }

    /// The parameters, in call order.
    #[inline]
    pub fn params(&self) -> &[Mapping] {
        &self.params
    }

    /// Invokes the constructor or factory.
    pub fn invoke(&self, args: Arguments) -> Result<ObjectRef, MarshallError> {
        (self.construct)(args)
    }
}

impl fmt::Debug for InstantiationMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiationMapping")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// How instances of a mapped type are created when decoding a full object.
#[derive(Clone, Debug)]
pub enum InstantiationStrategy {
    /// A constructor taking the mapped parameters.
    Constructor(InstantiationMapping),
    /// A named factory function taking the mapped parameters.
    Factory {
        /// The factory's name, for diagnostics.
        method: Cow<'static, str>,
        /// Its parameters.
        mapping: InstantiationMapping,
    },
}

impl InstantiationStrategy {
    /// The parameters and invoker, whichever the strategy.
    #[inline]
    pub fn mapping(&self) -> &InstantiationMapping {
        match self {
            Self::Constructor(mapping) => mapping,
            Self::Factory { mapping, .. } => mapping,
        }
    }
}
