use tracing::warn;

use super::MappingRegistry;
use crate::MarshallError;
use crate::definition::GetMappingDefinition;

type RegisterFn = fn(&mut MappingRegistry) -> Result<(), MarshallError>;

/// A registration collected at link time.
///
/// Created by [`submit_definition!`](crate::submit_definition); there is
/// rarely a reason to build one by hand.
pub struct AutoRegistration {
    register: RegisterFn,
}

impl AutoRegistration {
    /// Registers `T` through [`MappingRegistry::register`].
    #[inline]
    pub const fn of<T: GetMappingDefinition>() -> Self {
        Self {
            register: MappingRegistry::register::<T>,
        }
    }

    const fn from_fn(register: RegisterFn) -> Self {
        Self { register }
    }
}

inventory::collect!(AutoRegistration);

// Always submitted. If it runs, the platform supports link-time collection.
inventory::submit! {
    AutoRegistration::from_fn(mark_available)
}

fn mark_available(registry: &mut MappingRegistry) -> Result<(), MarshallError> {
    registry.auto_registered = true;
    Ok(())
}

pub(super) fn register_all(registry: &mut MappingRegistry) {
    for entry in inventory::iter::<AutoRegistration> {
        if let Err(e) = (entry.register)(registry) {
            warn!(error = %e, "skipping auto registration");
        }
    }
}
