//! Items used by the exported macros. Not public API.

#[cfg(feature = "auto_register")]
pub use inventory;

/// Submits `T` for [`MappingRegistry::auto_register`].
///
/// Expands to nothing without the `auto_register` feature.
///
/// # Examples
///
/// ```
/// use gw_marshal::definition::{DefinitionBuilder, GetMappingDefinition, MappingDefinition};
/// use gw_marshal::{MappingRegistry, MarshallError, submit_definition};
///
/// #[derive(Default)]
/// struct Ping;
///
/// impl GetMappingDefinition for Ping {
///     const TYPE_NAME: &'static str = "Ping";
///
///     fn mapping_definition() -> Result<MappingDefinition, MarshallError> {
///         DefinitionBuilder::<Self>::new(Self::TYPE_NAME).default_instance().build()
///     }
/// }
///
/// submit_definition!(Ping);
///
/// let mut registry = MappingRegistry::new();
/// if registry.auto_register() {
///     assert!(registry.contains_definition("Ping"));
/// }
/// ```
///
/// [`MappingRegistry::auto_register`]: crate::MappingRegistry::auto_register
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_definition {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration::of::<$ty>()
        }
    };
}

/// Submits `T` for `MappingRegistry::auto_register`.
///
/// Expands to nothing without the `auto_register` feature.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! submit_definition {
    ($ty:ty) => {};
}
