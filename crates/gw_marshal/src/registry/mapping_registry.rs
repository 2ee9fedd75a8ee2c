use core::any::TypeId;
use core::fmt;
use std::sync::{Arc, PoisonError};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use gw_utils::TypeIdMap;
use gw_utils::hash::{FixedHashState, HashMap};
use tracing::debug;

use crate::MarshallError;
use crate::definition::{GetMappingDefinition, MappingDefinition};
use crate::marshallers::{AnyMarshaller, DefinitionMarshaller, ListMarshaller};
use crate::marshallers::{Marshaller, PrimitiveMarshaller};
use crate::value::ObjectRef;

// -----------------------------------------------------------------------------
// MappingRegistry

/// The definitions and marshallers available to a marshalling pass.
///
/// Marshallers are resolved by exact type name. Registering a definition
/// also registers its [`DefinitionMarshaller`], and object definitions are
/// indexed by [`TypeId`] so values can be encoded by their runtime type.
///
/// The registry is built once and then shared read-only by every pass. Use
/// [`RegistryArc`] to share one across threads.
///
/// # Examples
///
/// ```
/// use gw_marshal::MappingRegistry;
/// use gw_marshal::definition::MappingDefinition;
///
/// let mut registry = MappingRegistry::new();
/// assert!(registry.contains_marshaller("i32"));
/// assert!(registry.contains_marshaller("any"));
///
/// assert!(registry.register_definition(MappingDefinition::enumeration("Color", ["Red"])));
/// assert!(registry.get_definition("Color").is_ok());
/// assert!(registry.get_marshaller("Color").is_ok());
///
/// let err = registry.get_marshaller("Shape").err().unwrap();
/// assert!(err.is_configuration());
/// ```
pub struct MappingRegistry {
    definitions: HashMap<String, Arc<MappingDefinition>>,
    by_type: TypeIdMap<Arc<MappingDefinition>>,
    marshallers: HashMap<String, Arc<dyn Marshaller>>,
    pub(super) auto_registered: bool,
}

impl Default for MappingRegistry {
    /// See [`MappingRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl MappingRegistry {
    /// Creates a registry without any marshaller.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            definitions: HashMap::with_hasher(FixedHashState),
            by_type: TypeIdMap::new(),
            marshallers: HashMap::with_hasher(FixedHashState),
            auto_registered: false,
        }
    }

    /// Creates a registry with the built-in marshallers.
    ///
    /// - `bool` `char` `String`
    /// - `i8 - i64` `u8 - u64` `f32` `f64`
    /// - `List`: elements encoded dynamically
    /// - `any`: encoded by runtime type
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for marshaller in PrimitiveMarshaller::all() {
            registry.register_marshaller(marshaller);
        }
        registry.register_marshaller(ListMarshaller::untyped());
        registry.register_marshaller(AnyMarshaller);
        registry
    }

    /// Registers `definition` and its marshaller, if its type name is new.
    ///
    /// Returns `false` and keeps the existing definition otherwise.
    pub fn register_definition(&mut self, definition: MappingDefinition) -> bool {
        if self.definitions.contains_key(definition.type_name()) {
            return false;
        }
        self.insert_definition(definition);
        true
    }

    /// Registers `definition` and its marshaller, replacing any previous
    /// registration of the same type name.
    pub fn insert_definition(&mut self, definition: MappingDefinition) {
        let definition = Arc::new(definition);
        let type_name = definition.type_name().to_owned();
        debug!(type_name = %type_name, "registering mapping definition");

        if let Some(type_id) = definition.type_id() {
            self.by_type.insert(type_id, definition.clone());
        }
        self.marshallers.insert(
            type_name.clone(),
            Arc::new(DefinitionMarshaller::new(definition.clone())),
        );
        self.definitions.insert(type_name, definition);
    }

    /// Registers `marshaller` under the type name it handles, replacing any
    /// previous marshaller of that name.
    pub fn register_marshaller(&mut self, marshaller: impl Marshaller) {
        self.marshallers
            .insert(marshaller.type_handled().to_owned(), Arc::new(marshaller));
    }

    /// Registers the definition of `T`, then its dependencies.
    ///
    /// Does nothing if a definition named [`T::TYPE_NAME`] already exists,
    /// which also ends recursion between mutually dependent types.
    ///
    /// [`T::TYPE_NAME`]: GetMappingDefinition::TYPE_NAME
    pub fn register<T: GetMappingDefinition>(&mut self) -> Result<(), MarshallError> {
        if self.contains_definition(T::TYPE_NAME) {
            return Ok(());
        }
        let definition = T::mapping_definition()?;
        if definition.type_name() != T::TYPE_NAME {
            return Err(MarshallError::InvalidDefinition {
                type_name: T::TYPE_NAME.to_owned(),
                reason: format!("definition is named `{}`", definition.type_name()),
            });
        }
        self.register_definition(definition);
        T::register_dependencies(self)
    }

    /// Registers every type submitted with
    /// [`submit_definition!`](crate::submit_definition).
    ///
    /// Returns `true` if link-time registration works on this platform.
    /// Repeated calls are cheap. Without the `auto_register` feature this
    /// does nothing and returns `false`.
    ///
    /// Registrations that fail are logged and skipped.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            if self.auto_registered {
                return true;
            }
            super::auto_register::register_all(self);
            self.auto_registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Returns the definition registered under `type_name`.
    pub fn get_definition(&self, type_name: &str) -> Result<&Arc<MappingDefinition>, MarshallError> {
        self.definitions
            .get(type_name)
            .ok_or_else(|| MarshallError::MissingDefinition {
                type_name: type_name.to_owned(),
            })
    }

    /// Returns the marshaller registered under `type_name`.
    pub fn get_marshaller(&self, type_name: &str) -> Result<&dyn Marshaller, MarshallError> {
        match self.marshallers.get(type_name) {
            Some(marshaller) => Ok(&**marshaller),
            None => Err(MarshallError::MissingMarshaller {
                type_name: type_name.to_owned(),
            }),
        }
    }

    /// Returns the object definition of the Rust type `type_id`.
    #[inline]
    pub fn definition_for_type_id(&self, type_id: TypeId) -> Option<&Arc<MappingDefinition>> {
        self.by_type.get(&type_id)
    }

    /// Returns the definition matching the runtime type of `instance`.
    pub fn definition_for(&self, instance: &ObjectRef) -> Result<&Arc<MappingDefinition>, MarshallError> {
        self.definition_for_type_id(instance.type_id())
            .ok_or(MarshallError::UnregisteredType {
                rust_type: instance.rust_type(),
            })
    }

    /// Returns `true` if a definition is registered under `type_name`.
    #[inline]
    pub fn contains_definition(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }

    /// Returns `true` if a marshaller is registered under `type_name`.
    #[inline]
    pub fn contains_marshaller(&self, type_name: &str) -> bool {
        self.marshallers.contains_key(type_name)
    }

    /// Iterates over every registered definition.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<MappingDefinition>> {
        self.definitions.values()
    }
}

impl fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("definitions", &self.definitions.keys())
            .field("marshallers", &self.marshallers.keys())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// RegistryArc

/// A thread-safe handle to a [`MappingRegistry`].
#[derive(Clone, Default)]
pub struct RegistryArc {
    /// The wrapped [`MappingRegistry`].
    pub internal: Arc<RwLock<MappingRegistry>>,
}

impl RegistryArc {
    /// Wraps `registry`.
    pub fn new(registry: MappingRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`MappingRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, MappingRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`MappingRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, MappingRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read().fmt(f)
    }
}

// -----------------------------------------------------------------------------
// Tests
