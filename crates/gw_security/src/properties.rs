use serde::Deserialize;

/// Client security settings.
///
/// # Examples
///
/// ```
/// use gw_security::SecurityProperties;
///
/// let properties = SecurityProperties::from_json(r#"{"local-storage-of-user-allowed": false}"#).unwrap();
/// assert!(!properties.local_storage_of_user_allowed);
/// assert!(SecurityProperties::from_json("{}").unwrap().local_storage_of_user_allowed);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SecurityProperties {
    /// Whether the logged-in user may be kept in a cookie between visits.
    pub local_storage_of_user_allowed: bool,
}

impl Default for SecurityProperties {
    fn default() -> Self {
        Self {
            local_storage_of_user_allowed: true,
        }
    }
}

impl SecurityProperties {
    /// Reads properties from JSON. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
