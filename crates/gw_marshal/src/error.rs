//! Error type shared by every marshalling operation.

use thiserror::Error;

use crate::definition::BindingKind;

/// Errors raised while encoding or decoding an object graph.
///
/// Any error aborts the whole pass. The session used for that pass must be
/// discarded, since it may hold instances that were never fully populated.
#[derive(Debug, Error)]
pub enum MarshallError {
    /// No mapping definition is registered under this type name.
    #[error("no mapping definition for: {type_name}")]
    MissingDefinition {
        /// The requested type name.
        type_name: String,
    },

    /// No marshaller is registered under this type name.
    #[error("no marshaller instance for: {type_name}")]
    MissingMarshaller {
        /// The requested type name.
        type_name: String,
    },

    /// A runtime object has no registered definition.
    #[error("no mapping definition registered for runtime type `{rust_type}`")]
    UnregisteredType {
        /// The Rust type name of the object.
        rust_type: &'static str,
    },

    /// A definition was rejected while being built.
    #[error("invalid mapping definition for {type_name}: {reason}")]
    InvalidDefinition {
        /// The definition's type name.
        type_name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A payload asked for `instantiate-only` but the type has no
    /// no-argument strategy.
    #[error("{type_name} has no no-argument instantiation strategy")]
    NoDefaultInstance {
        /// The definition's type name.
        type_name: String,
    },

    /// The wire value does not have any recognised shape.
    #[error("bad payload: {reason}")]
    BadPayload {
        /// Description of the malformed input.
        reason: String,
    },

    /// An enum payload named a constant the enum does not declare.
    #[error("{type_name} has no constant named `{name}`")]
    UnknownEnumConstant {
        /// The enum type name.
        type_name: String,
        /// The offending constant name.
        name: String,
    },

    /// Reading or writing a bound member failed.
    #[error("failed to access {kind} `{member}` of {type_name}")]
    MemberAccess {
        /// The owning type name.
        type_name: String,
        /// The member's wire key.
        member: String,
        /// How the member is bound.
        kind: BindingKind,
        /// The underlying failure.
        #[source]
        source: Box<MarshallError>,
    },

    /// A constructor or factory could not produce an instance.
    #[error("failed to instantiate {type_name}: {reason}")]
    Instantiation {
        /// The definition's type name.
        type_name: String,
        /// Description of the failure.
        reason: String,
    },

    /// A value could not be converted to the declared type.
    #[error("cannot convert {found} to {expected}")]
    Conversion {
        /// The declared type.
        expected: String,
        /// What was found instead.
        found: String,
    },

    /// Encoding an instance failed.
    #[error("failed to marshall an instance of {type_name}")]
    Marshall {
        /// The type being encoded.
        type_name: String,
        /// The underlying failure.
        #[source]
        source: Box<MarshallError>,
    },

    /// Decoding an instance failed.
    #[error("failed to demarshall an instance of {type_name}")]
    Demarshall {
        /// The type being decoded.
        type_name: String,
        /// The underlying failure.
        #[source]
        source: Box<MarshallError>,
    },

    /// The graph nests deeper than the pass allows.
    #[error("nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded {
        /// The limit of the pass.
        limit: usize,
    },

    /// The JSON layer failed (syntax error or writer failure).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarshallError {
    #[inline]
    pub(crate) fn conversion(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Conversion {
            expected: expected.into(),
            found: found.into(),
        }
    }

    #[inline]
    pub(crate) fn bad_payload(reason: impl Into<String>) -> Self {
        Self::BadPayload {
            reason: reason.into(),
        }
    }

    /// Returns the innermost error, skipping `Marshall`, `Demarshall` and
    /// `MemberAccess` wrappers.
    ///
    /// # Examples
    ///
    /// ```
    /// use gw_marshal::MarshallError;
    ///
    /// let err = MarshallError::Demarshall {
    ///     type_name: "Point".into(),
    ///     source: Box::new(MarshallError::BadPayload { reason: "empty".into() }),
    /// };
    /// assert!(matches!(err.root_cause(), MarshallError::BadPayload { .. }));
    /// ```
    pub fn root_cause(&self) -> &MarshallError {
        let mut current = self;
        loop {
            match current {
                Self::Marshall { source, .. }
                | Self::Demarshall { source, .. }
                | Self::MemberAccess { source, .. } => current = source,
                _ => return current,
            }
        }
    }

    /// Returns `true` if the root cause is a registry or definition defect
    /// rather than bad input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::MissingDefinition { .. }
                | Self::MissingMarshaller { .. }
                | Self::UnregisteredType { .. }
                | Self::InvalidDefinition { .. }
                | Self::NoDefaultInstance { .. }
        )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::MarshallError;
    use crate::definition::BindingKind;

    #[test]
    fn messages_name_the_type() {
        let err = MarshallError::MissingMarshaller {
            type_name: "Point".into(),
        };
        assert_eq!(err.to_string(), "no marshaller instance for: Point");

        let err = MarshallError::MemberAccess {
            type_name: "Point".into(),
            member: "x".into(),
            kind: BindingKind::Field,
            source: Box::new(MarshallError::conversion("i32", "string")),
        };
        assert_eq!(err.to_string(), "failed to access field `x` of Point");
    }

    #[test]
    fn configuration_is_judged_by_root_cause() {
        let err = MarshallError::Marshall {
            type_name: "Outer".into(),
            source: Box::new(MarshallError::Marshall {
                type_name: "Inner".into(),
                source: Box::new(MarshallError::MissingDefinition {
                    type_name: "Leaf".into(),
                }),
            }),
        };
        assert!(err.is_configuration());
        assert!(!MarshallError::bad_payload("nope").is_configuration());
    }
}
