use std::sync::Arc;

use gw_marshal::Marshalling;
use gw_marshal::value::Shared;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::cookie::{CookieJar, USER_COOKIE_NAME, UserCookieEncoder};
use crate::user::unshare;
use crate::{SecurityProperties, StorageError, User};

// -----------------------------------------------------------------------------
// UserStorageHandler

/// Keeps track of the logged-in user between visits.
pub trait UserStorageHandler: Send + Sync {
    /// The stored user, if any.
    fn get_user(&self) -> Option<User>;

    /// Stores `user`, or forgets the stored one for `None`.
    fn set_user(&self, user: Option<&User>);
}

/// Returns the handler suited to this client.
///
/// Users are kept in a cookie when cookies are enabled and
/// [`SecurityProperties::local_storage_of_user_allowed`] is set. Otherwise
/// the user only comes from `security_context`, the security context JSON a
/// host page may bootstrap the client with.
pub fn storage_handler(
    jar: Arc<dyn CookieJar>,
    properties: &SecurityProperties,
    marshalling: Marshalling,
    security_context: Option<String>,
) -> Box<dyn UserStorageHandler> {
    if jar.is_enabled() && properties.local_storage_of_user_allowed {
        Box::new(CookieStorageHandler::new(jar, marshalling))
    } else {
        Box::new(ReadOnlyStorageHandler::new(marshalling, security_context))
    }
}

// -----------------------------------------------------------------------------
// CookieStorageHandler

/// Stores the user in the [`USER_COOKIE_NAME`] cookie.
///
/// A cookie that cannot be decoded is logged, removed and treated as absent.
pub struct CookieStorageHandler {
    jar: Arc<dyn CookieJar>,
    encoder: UserCookieEncoder,
}

impl CookieStorageHandler {
    /// Creates a handler over `jar`.
    pub fn new(jar: Arc<dyn CookieJar>, marshalling: Marshalling) -> Self {
        Self {
            jar,
            encoder: UserCookieEncoder::new(marshalling),
        }
    }
}

impl UserStorageHandler for CookieStorageHandler {
    fn get_user(&self) -> Option<User> {
        let value = self.jar.get(USER_COOKIE_NAME)?;
        match self.encoder.from_cookie_value(&value) {
            Ok(user) => {
                debug!(user = %user, "found user in cookie");
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "failed to read the user cookie");
                self.jar.remove(USER_COOKIE_NAME);
                None
            }
        }
    }

    fn set_user(&self, user: Option<&User>) {
        let Some(user) = user else {
            self.jar.remove(USER_COOKIE_NAME);
            return;
        };
        match self.encoder.to_cookie_value(user) {
            Ok(value) => {
                debug!(user = %user, "storing user in cookie");
                self.jar.set(USER_COOKIE_NAME, value);
            }
            // The user will have to log in again on the next visit.
            Err(e) => warn!(error = %e, user = %user, "failed to store the user cookie"),
        }
    }
}

// -----------------------------------------------------------------------------
// ReadOnlyStorageHandler

/// Key of the user in a bootstrapped security context.
const CONTEXT_USER_KEY: &str = "user";

/// Serves the user from a bootstrapped security context and ignores writes.
///
/// The context is a JSON object whose `user` key holds a marshalled user:
///
/// ```json
/// {"user": {"encoded-type": "User", "object-id": "1", "identifier": "ada", "roles": []}}
/// ```
pub struct ReadOnlyStorageHandler {
    marshalling: Marshalling,
    security_context: Option<String>,
}

impl ReadOnlyStorageHandler {
    /// Creates a handler over the optional `security_context`.
    pub fn new(marshalling: Marshalling, security_context: Option<String>) -> Self {
        Self {
            marshalling,
            security_context,
        }
    }

    fn read_context(&self, context: &str) -> Result<Option<User>, StorageError> {
        let context: JsonValue = serde_json::from_str(context)?;
        let Some(wire) = context.get(CONTEXT_USER_KEY) else {
            return Ok(None);
        };
        let user: Option<Shared<User>> = self.marshalling.from_value_as(wire, "User")?;
        Ok(user.map(|user| unshare(&user)))
    }
}

impl UserStorageHandler for ReadOnlyStorageHandler {
    fn get_user(&self) -> Option<User> {
        let context = self.security_context.as_deref()?;
        match self.read_context(context) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "failed to read the user from the security context");
                None
            }
        }
    }

    fn set_user(&self, _user: Option<&User>) {}
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gw_marshal::{MappingRegistry, Marshalling};

    use super::{CookieStorageHandler, ReadOnlyStorageHandler, UserStorageHandler, storage_handler};
    use crate::{CookieJar, InMemoryCookieJar, SecurityProperties, USER_COOKIE_NAME, User};
    use crate::{UserCookieEncoder, register_security_types};

    fn marshalling() -> Marshalling {
        let mut registry = MappingRegistry::new();
        register_security_types(&mut registry).unwrap();
        Marshalling::new(registry)
    }

    #[test]
    fn cookie_handler_round_trip() {
        let jar = Arc::new(InMemoryCookieJar::new());
        let handler = CookieStorageHandler::new(jar.clone(), marshalling());
        assert!(handler.get_user().is_none());

        let user = User::new("ada").with_role("admin");
        handler.set_user(Some(&user));
        assert!(jar.get(USER_COOKIE_NAME).is_some());
        assert_eq!(handler.get_user(), Some(user));

        handler.set_user(None);
        assert!(jar.get(USER_COOKIE_NAME).is_none());
        assert!(handler.get_user().is_none());
    }

    #[test]
    fn corrupted_cookie_is_removed() {
        let jar = Arc::new(InMemoryCookieJar::new());
        jar.set(USER_COOKIE_NAME, "%7Bnot-json".into());
        let handler = CookieStorageHandler::new(jar.clone(), marshalling());
        assert!(handler.get_user().is_none());
        assert!(jar.get(USER_COOKIE_NAME).is_none());
    }

    #[test]
    fn read_only_handler_serves_the_context() {
        let marshalling = marshalling();
        let user = User::new("bob").with_role("guest");
        let cookie = UserCookieEncoder::new(marshalling.clone()).to_cookie_value(&user).unwrap();
        let user_json = percent_encoding::percent_decode_str(&cookie).decode_utf8().unwrap();
        let context = format!(r#"{{"user": {user_json}}}"#);

        let handler = ReadOnlyStorageHandler::new(marshalling.clone(), Some(context));
        assert_eq!(handler.get_user(), Some(user.clone()));
        handler.set_user(None);
        assert_eq!(handler.get_user(), Some(user));

        let empty = ReadOnlyStorageHandler::new(marshalling.clone(), None);
        assert!(empty.get_user().is_none());
        let anonymous = ReadOnlyStorageHandler::new(marshalling.clone(), Some("{}".into()));
        assert!(anonymous.get_user().is_none());
        let broken = ReadOnlyStorageHandler::new(marshalling, Some("{".into()));
        assert!(broken.get_user().is_none());
    }

    #[test]
    fn handler_selection() {
        let user = User::new("ada");
        let allowed = SecurityProperties::default();
        let denied = SecurityProperties {
            local_storage_of_user_allowed: false,
        };

        let jar = Arc::new(InMemoryCookieJar::new());
        storage_handler(jar.clone(), &allowed, marshalling(), None).set_user(Some(&user));
        assert!(jar.get(USER_COOKIE_NAME).is_some());

        let jar = Arc::new(InMemoryCookieJar::new());
        storage_handler(jar.clone(), &denied, marshalling(), None).set_user(Some(&user));
        assert!(jar.get(USER_COOKIE_NAME).is_none());

        let jar = Arc::new(InMemoryCookieJar::disabled());
        storage_handler(jar.clone(), &allowed, marshalling(), None).set_user(Some(&user));
        assert!(jar.get(USER_COOKIE_NAME).is_none());
    }
}
