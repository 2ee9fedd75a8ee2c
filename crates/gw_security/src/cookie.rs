use std::sync::{Mutex, PoisonError};

use gw_marshal::Marshalling;
use gw_marshal::value::{Shared, shared};
use gw_utils::hash::{FixedHashState, HashMap};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::user::unshare;
use crate::{StorageError, User};

/// Name of the cookie holding the logged-in user.
pub const USER_COOKIE_NAME: &str = "gw-active-user";

// -----------------------------------------------------------------------------
// UserCookieEncoder

/// Encodes a [`User`] as a cookie value, and back.
///
/// The value is the marshalled JSON of the user, percent-encoded so it is
/// safe in a `Set-Cookie` header.
///
/// # Examples
///
/// ```
/// use gw_marshal::{MappingRegistry, Marshalling};
/// use gw_security::{User, UserCookieEncoder, register_security_types};
///
/// let mut registry = MappingRegistry::new();
/// register_security_types(&mut registry).unwrap();
/// let encoder = UserCookieEncoder::new(Marshalling::new(registry));
///
/// let user = User::new("ada").with_role("admin");
/// let value = encoder.to_cookie_value(&user).unwrap();
/// assert!(value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'%'));
/// assert_eq!(encoder.from_cookie_value(&value).unwrap(), user);
/// ```
#[derive(Clone, Debug)]
pub struct UserCookieEncoder {
    marshalling: Marshalling,
}

impl UserCookieEncoder {
    /// Creates an encoder. The `User` definition must be registered.
    #[inline]
    pub fn new(marshalling: Marshalling) -> Self {
        Self { marshalling }
    }

    /// Encodes `user` as a cookie value.
    pub fn to_cookie_value(&self, user: &User) -> Result<String, StorageError> {
        let json = self.marshalling.to_json_object(&shared(user.clone()))?;
        Ok(utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string())
    }

    /// Decodes a cookie value written by [`to_cookie_value`](Self::to_cookie_value).
    pub fn from_cookie_value(&self, value: &str) -> Result<User, StorageError> {
        let json = percent_decode_str(value).decode_utf8()?;
        let user: Option<Shared<User>> = self.marshalling.from_json_object(&json)?;
        user.map(|user| unshare(&user)).ok_or(StorageError::NoUser)
    }
}

// -----------------------------------------------------------------------------
// CookieJar

/// The cookies of the current client.
pub trait CookieJar: Send + Sync {
    /// Returns `true` if cookies can be stored at all.
    #[inline]
    fn is_enabled(&self) -> bool {
        true
    }

    /// Returns the value of cookie `name`.
    fn get(&self, name: &str) -> Option<String>;

    /// Sets cookie `name`.
    fn set(&self, name: &str, value: String);

    /// Removes cookie `name`.
    fn remove(&self, name: &str);
}

/// A [`CookieJar`] kept in memory.
#[derive(Debug)]
pub struct InMemoryCookieJar {
    cookies: Mutex<HashMap<String, String>>,
    enabled: bool,
}

impl Default for InMemoryCookieJar {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self {
            cookies: Mutex::new(HashMap::with_hasher(FixedHashState)),
            enabled: true,
        }
    }

    /// Creates a jar reporting cookies as disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }
}

impl CookieJar for InMemoryCookieJar {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.get(name).cloned()
    }

    fn set(&self, name: &str, value: String) {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.insert(name.to_owned(), value);
    }

    fn remove(&self, name: &str) {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.remove(name);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use gw_marshal::{MappingRegistry, Marshalling};

    use super::{CookieJar, InMemoryCookieJar, UserCookieEncoder};
    use crate::{StorageError, User, register_security_types};

    fn encoder() -> UserCookieEncoder {
        let mut registry = MappingRegistry::new();
        register_security_types(&mut registry).unwrap();
        UserCookieEncoder::new(Marshalling::new(registry))
    }

    #[test]
    fn cookie_values_decode() {
        let encoder = encoder();
        let user = User::new("zoë; admin").with_role("ops");
        let value = encoder.to_cookie_value(&user).unwrap();
        assert!(!value.contains(';'));
        assert!(!value.contains('"'));
        assert_eq!(encoder.from_cookie_value(&value).unwrap(), user);
    }

    #[test]
    fn bad_cookie_values() {
        let encoder = encoder();
        assert!(matches!(encoder.from_cookie_value("null"), Err(StorageError::NoUser)));
        assert!(matches!(encoder.from_cookie_value("%FF"), Err(StorageError::Encoding(_))));
        assert!(matches!(encoder.from_cookie_value("%7B"), Err(StorageError::Marshall(_))));
    }

    #[test]
    fn jar_stores_cookies() {
        let jar = InMemoryCookieJar::new();
        assert!(jar.is_enabled());
        jar.set("a", "1".into());
        assert_eq!(jar.get("a").as_deref(), Some("1"));
        jar.remove("a");
        assert!(jar.get("a").is_none());
        assert!(!InMemoryCookieJar::disabled().is_enabled());
    }
}
