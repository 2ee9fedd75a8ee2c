//! Registration and resolution of definitions and marshallers.
//!
//! ## Menu
//!
//! - [`MappingRegistry`]: definitions and marshallers, keyed by type name.
//! - [`RegistryArc`]: a registry shared across threads.
//! - [`AutoRegistration`]: an entry collected at link time (`auto_register`).
//!
//! ## auto_register
//!
//! See [`MappingRegistry::auto_register`].
//!
//! Types are submitted with [`submit_definition!`](crate::submit_definition)
//! and collected by the [`inventory`] crate. Not every platform supports it;
//! on those, `auto_register` returns `false` and registers nothing.
//!
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "auto_register")]
mod auto_register;
mod mapping_registry;

// -----------------------------------------------------------------------------
// Exports

#[cfg(feature = "auto_register")]
pub use auto_register::AutoRegistration;
pub use mapping_registry::{MappingRegistry, RegistryArc};
