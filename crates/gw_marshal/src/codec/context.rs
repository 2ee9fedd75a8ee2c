use core::cell::{Cell, RefCell};

use serde_core::ser::Error;
use serde_core::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::MarshallError;
use crate::codec::MarshallDriver;
use crate::registry::MappingRegistry;
use crate::session::EncodingSession;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Depth

/// Default nesting limit of a pass.
///
/// Every marshaller invocation counts one level, so a chain of `n` linked
/// objects needs `n` levels, plus one more when its leaves are scalars.
/// Encoding recurses on the thread stack: deep limits need a large stack,
/// debug builds in particular.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest JSON nesting `serde_json` parses.
///
/// Each JSON level is written by at least one marshaller invocation, so a
/// limit no greater than this keeps every encoded payload parseable.
pub const MAX_JSON_DEPTH: usize = 127;

// -----------------------------------------------------------------------------
// EncodeContext

/// State shared by every marshaller during one encode pass.
///
/// Encoding streams through a `serde` serializer, whose error type cannot
/// carry a [`MarshallError`]. The first failure is therefore stashed here by
/// [`fail`](Self::fail), and recovered by the entry point once serialization
/// unwinds.
pub struct EncodeContext<'r> {
    registry: &'r MappingRegistry,
    session: RefCell<&'r mut EncodingSession>,
    failure: RefCell<Option<MarshallError>>,
    depth: Cell<usize>,
    max_depth: usize,
}

impl<'r> EncodeContext<'r> {
    /// Creates a context over `registry` and `session`.
    pub fn new(registry: &'r MappingRegistry, session: &'r mut EncodingSession) -> Self {
        Self {
            registry,
            session: RefCell::new(session),
            failure: RefCell::new(None),
            depth: Cell::new(0),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the nesting limit, capped at [`MAX_JSON_DEPTH`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_JSON_DEPTH);
        self
    }

    /// The registry marshallers are resolved from.
    #[inline]
    pub fn registry(&self) -> &'r MappingRegistry {
        self.registry
    }

    /// Runs `f` with the session.
    ///
    /// `f` must not re-enter the context.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut EncodingSession) -> R) -> R {
        let mut session = self.session.borrow_mut();
        f(&mut session)
    }

    /// Stashes `error` and returns a serializer error describing it.
    pub fn fail<E: Error>(&self, error: MarshallError) -> E {
        let err = E::custom(&error);
        *self.failure.borrow_mut() = Some(error);
        err
    }

    /// Wraps a stashed failure as having happened while encoding an
    /// instance of `type_name`.
    pub fn annotate(&self, type_name: &str) {
        let mut failure = self.failure.borrow_mut();
        if let Some(source) = failure.take() {
            *failure = Some(MarshallError::Marshall {
                type_name: type_name.to_owned(),
                source: Box::new(source),
            });
        }
    }

    /// Removes and returns the stashed failure.
    #[inline]
    pub fn take_failure(&self) -> Option<MarshallError> {
        self.failure.borrow_mut().take()
    }

    /// A [`Serialize`] view of `value`, encoded by the marshaller of
    /// `type_name`.
    #[inline]
    pub fn encode<'a>(&'a self, type_name: &'a str, value: &'a Value) -> MarshallDriver<'a, 'r> {
        MarshallDriver::new(value, type_name, self)
    }

    /// Encodes `value` with the marshaller of `type_name`.
    pub fn serialize_as<S: Serializer>(
        &self,
        type_name: &str,
        value: &Value,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let depth = self.depth.get() + 1;
        if depth > self.max_depth {
            return Err(self.fail(MarshallError::DepthLimitExceeded {
                limit: self.max_depth,
            }));
        }
        let marshaller = match self.registry.get_marshaller(type_name) {
            Ok(marshaller) => marshaller,
            Err(e) => return Err(self.fail(e)),
        };
        self.depth.set(depth);
        let result = marshaller.marshall(value, self).serialize(serializer);
        self.depth.set(depth - 1);
        result
    }
}

// -----------------------------------------------------------------------------
// DecodeContext

/// State shared by every marshaller during one decode pass.
///
/// Nesting is counted the same way as in [`EncodeContext`], so anything
/// encoded under a limit decodes under the same limit.
pub struct DecodeContext<'r> {
    registry: &'r MappingRegistry,
    session: &'r mut EncodingSession,
    depth: usize,
    max_depth: usize,
}

impl<'r> DecodeContext<'r> {
    /// Creates a context over `registry` and `session`.
    #[inline]
    pub fn new(registry: &'r MappingRegistry, session: &'r mut EncodingSession) -> Self {
        Self {
            registry,
            session,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the nesting limit, capped at [`MAX_JSON_DEPTH`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_JSON_DEPTH);
        self
    }

    /// The registry marshallers are resolved from.
    #[inline]
    pub fn registry(&self) -> &'r MappingRegistry {
        self.registry
    }

    /// The session of this pass.
    #[inline]
    pub fn session(&mut self) -> &mut EncodingSession {
        self.session
    }

    /// Decodes `wire` with the marshaller of `type_name`.
    pub fn demarshall_value(&mut self, type_name: &str, wire: &JsonValue) -> Result<Value, MarshallError> {
        if self.depth >= self.max_depth {
            return Err(MarshallError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        let marshaller = self.registry.get_marshaller(type_name)?;
        self.depth += 1;
        let result = marshaller.demarshall(wire, self);
        self.depth -= 1;
        result
    }
}
