use gw_marshal::definition::{DefinitionBuilder, GetMappingDefinition, MappingDefinition};
use gw_marshal::value::{Shared, shared};
use gw_marshal::{MappingRegistry, MarshallError};

use crate::User;
use crate::user::unshare;

/// Fired once a user has logged in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedInEvent {
    /// The user that logged in.
    pub user: User,
}

/// Fired once a user has logged out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedOutEvent {
    /// The user that logged out.
    pub user: User,
}

macro_rules! impl_user_event {
    ($ty:ident = $type_name:literal) => {
        impl $ty {
            /// Creates the event.
            #[inline]
            pub fn new(user: User) -> Self {
                Self { user }
            }
        }

        impl GetMappingDefinition for $ty {
            const TYPE_NAME: &'static str = $type_name;

            fn mapping_definition() -> Result<MappingDefinition, MarshallError> {
                DefinitionBuilder::<Self>::new(Self::TYPE_NAME)
                    .constructor(&[("user", User::TYPE_NAME)], |args| {
                        let user: Shared<User> = args.next()?;
                        Ok(Self::new(unshare(&user)))
                    })
                    .read_only_field("user", User::TYPE_NAME, |e| shared(e.user.clone()))
                    .build()
            }

            fn register_dependencies(registry: &mut MappingRegistry) -> Result<(), MarshallError> {
                registry.register::<User>()
            }
        }
    };
}

impl_user_event!(LoggedInEvent = "LoggedInEvent");
impl_user_event!(LoggedOutEvent = "LoggedOutEvent");

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use gw_marshal::value::shared;
    use gw_marshal::{MappingRegistry, Marshalling};

    use super::{LoggedInEvent, LoggedOutEvent};
    use crate::user::unshare;
    use crate::{User, register_security_types};

    #[test]
    fn events_carry_their_user() {
        let mut registry = MappingRegistry::new();
        register_security_types(&mut registry).unwrap();
        for name in ["LoggedInEvent", "LoggedOutEvent", "User", "Role", "List<Role>"] {
            assert!(registry.contains_marshaller(name), "{name}");
        }
        let marshalling = Marshalling::new(registry);

        let event = LoggedInEvent::new(User::new("ada").with_role("admin"));
        let json = marshalling.to_json(shared(event.clone())).unwrap();
        let decoded = marshalling.from_json_object::<LoggedInEvent>(&json).unwrap().unwrap();
        assert_eq!(unshare(&decoded), event);

        let json = marshalling.to_json(shared(LoggedOutEvent::new(User::new("bob")))).unwrap();
        let decoded = marshalling.from_json_object::<LoggedOutEvent>(&json).unwrap().unwrap();
        assert_eq!(unshare(&decoded).user.identifier, "bob");
    }

    #[test]
    fn event_without_user_is_rejected() {
        let mut registry = MappingRegistry::new();
        register_security_types(&mut registry).unwrap();
        let marshalling = Marshalling::new(registry);

        let json = r#"{"encoded-type":"LoggedInEvent","object-id":"1","user":null}"#;
        assert!(marshalling.from_json_object::<LoggedInEvent>(json).is_err());
    }
}
