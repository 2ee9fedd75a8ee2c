use core::fmt;
use std::sync::PoisonError;

use gw_marshal::definition::{DefinitionBuilder, GetMappingDefinition, MappingDefinition};
use gw_marshal::marshallers::ListMarshaller;
use gw_marshal::value::{Shared, shared};
use gw_marshal::{MappingRegistry, MarshallError};

// -----------------------------------------------------------------------------
// Role

/// A named role granted to a [`User`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Role {
    /// The role name, such as `"admin"`.
    pub name: String,
}

impl Role {
    /// Creates a role.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GetMappingDefinition for Role {
    const TYPE_NAME: &'static str = "Role";

    fn mapping_definition() -> Result<MappingDefinition, MarshallError> {
        DefinitionBuilder::<Self>::new(Self::TYPE_NAME)
            .constructor(&[("name", "String")], |args| Ok(Role::new(args.next::<String>()?)))
            .read_only_field("name", "String", |r| r.name.clone())
            .build()
    }
}

// -----------------------------------------------------------------------------
// User

const ROLE_LIST: &str = "List<Role>";

/// An authenticated user.
///
/// # Examples
///
/// ```
/// use gw_security::User;
///
/// let user = User::new("ada").with_role("admin");
/// assert!(user.has_role("admin"));
/// assert!(!user.has_role("guest"));
/// assert_eq!(user.to_string(), "ada");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// The unique identifier, usually the login name.
    pub identifier: String,
    /// The granted roles.
    pub roles: Vec<Role>,
}

impl User {
    /// Creates a user without roles.
    #[inline]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            roles: Vec::new(),
        }
    }

    /// Adds a role.
    pub fn with_role(mut self, name: impl Into<String>) -> Self {
        self.roles.push(Role::new(name));
        self
    }

    /// Returns `true` if the user has the role `name`.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

impl GetMappingDefinition for User {
    const TYPE_NAME: &'static str = "User";

    fn mapping_definition() -> Result<MappingDefinition, MarshallError> {
        DefinitionBuilder::<Self>::new(Self::TYPE_NAME)
            .constructor(&[("identifier", "String")], |args| {
                Ok(User::new(args.next::<String>()?))
            })
            .read_only_field("identifier", "String", |u| u.identifier.clone())
            .accessor(
                "roles",
                ROLE_LIST,
                |u| u.roles.iter().cloned().map(shared).collect::<Vec<_>>(),
                |u, roles: Vec<Shared<Role>>| u.roles = roles.iter().map(unshare).collect(),
            )
            .build()
    }

    fn register_dependencies(registry: &mut MappingRegistry) -> Result<(), MarshallError> {
        registry.register::<Role>()?;
        if !registry.contains_marshaller(ROLE_LIST) {
            registry.register_marshaller(ListMarshaller::of(Role::TYPE_NAME));
        }
        Ok(())
    }
}

/// Clones the value out of a decoded shared node.
pub(crate) fn unshare<T: Clone>(node: &Shared<T>) -> T {
    node.read().unwrap_or_else(PoisonError::into_inner).clone()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use gw_marshal::value::shared;
    use gw_marshal::{MappingRegistry, Marshalling};

    use super::{Role, User, unshare};

    fn marshalling() -> Marshalling {
        let mut registry = MappingRegistry::new();
        registry.register::<User>().unwrap();
        Marshalling::new(registry)
    }

    #[test]
    fn user_registers_roles() {
        let mut registry = MappingRegistry::new();
        registry.register::<User>().unwrap();
        assert!(registry.contains_definition("Role"));
        assert!(registry.contains_marshaller("List<Role>"));
    }

    #[test]
    fn users_round_trip() {
        let marshalling = marshalling();
        let user = User::new("ada").with_role("admin").with_role("dev");
        let json = marshalling.to_json_object(&shared(user.clone())).unwrap();

        let wire: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(wire["identifier"], "ada");
        assert_eq!(wire["roles"][1]["name"], "dev");

        let decoded = marshalling.from_json_object::<User>(&json).unwrap().unwrap();
        assert_eq!(unshare(&decoded), user);
    }

    #[test]
    fn roles_need_a_name() {
        let marshalling = marshalling();
        let json = r#"{"encoded-type":"Role","object-id":"1","nickname":"x"}"#;
        assert!(marshalling.from_json_object::<Role>(json).is_err());
    }
}
