#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod cookie;
mod error;
mod events;
mod properties;
mod storage;
mod user;

// -----------------------------------------------------------------------------
// Exports

pub use cookie::{CookieJar, InMemoryCookieJar, USER_COOKIE_NAME, UserCookieEncoder};
pub use error::StorageError;
pub use events::{LoggedInEvent, LoggedOutEvent};
pub use properties::SecurityProperties;
pub use storage::{CookieStorageHandler, ReadOnlyStorageHandler};
pub use storage::{UserStorageHandler, storage_handler};
pub use user::{Role, User};

use gw_marshal::{MappingRegistry, MarshallError};

/// Registers every security type, with the types they depend on.
pub fn register_security_types(registry: &mut MappingRegistry) -> Result<(), MarshallError> {
    registry.register::<LoggedInEvent>()?;
    registry.register::<LoggedOutEvent>()
}

#[cfg(feature = "auto_register")]
gw_marshal::submit_definition!(LoggedInEvent);
#[cfg(feature = "auto_register")]
gw_marshal::submit_definition!(LoggedOutEvent);

// -----------------------------------------------------------------------------
// Tests

#[cfg(all(test, feature = "auto_register"))]
mod tests {
    use gw_marshal::MappingRegistry;

    #[test]
    fn events_are_auto_registered() {
        let mut registry = MappingRegistry::new();
        assert!(!registry.contains_definition("LoggedInEvent"));
        assert!(registry.auto_register());
        for name in ["LoggedInEvent", "LoggedOutEvent", "User", "Role"] {
            assert!(registry.contains_definition(name), "{name}");
        }
        assert!(registry.contains_marshaller("List<Role>"));
    }
}
