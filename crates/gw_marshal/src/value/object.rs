use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// -----------------------------------------------------------------------------
// Shared

/// A shared, mutable node of an object graph.
///
/// Every object that takes part in graph marshalling lives behind one of
/// these, so that several owners (or a cycle) can point at the same instance.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wraps `value` into a new [`Shared`] node.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

// -----------------------------------------------------------------------------
// ObjectRef

/// A type-erased handle to a [`Shared`] node.
///
/// Cloning an `ObjectRef` clones the handle, never the instance. Two handles
/// are the same object exactly when [`ptr_eq`](Self::ptr_eq) holds, which is
/// what an [`EncodingSession`](crate::EncodingSession) tracks.
///
/// # Examples
///
/// ```
/// use gw_marshal::value::{ObjectRef, shared};
///
/// let node = shared(5_u32);
/// let a = ObjectRef::from_shared(node.clone());
/// let b = ObjectRef::from_shared(node);
/// assert!(a.ptr_eq(&b));
///
/// a.write(|v: &mut u32| *v += 1);
/// assert_eq!(b.read(|v: &u32| *v), Some(6));
/// ```
#[derive(Clone)]
pub struct ObjectRef {
    type_id: TypeId,
    rust_type: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Moves `value` into a fresh node.
    #[inline]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_shared(shared(value))
    }

    /// Erases an existing node, keeping its identity.
    pub fn from_shared<T: Any + Send + Sync>(node: Shared<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            rust_type: core::any::type_name::<T>(),
            inner: node,
        }
    }

    /// The [`TypeId`] of the wrapped `T`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust name of the wrapped `T`, for diagnostics.
    #[inline]
    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// The address of the shared allocation.
    ///
    /// Only stable while some handle keeps the node alive.
    #[inline]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Returns `true` if both handles point to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.identity() == other.identity()
    }

    /// Returns `true` if the wrapped type is `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Recovers the typed node, or `None` if the type does not match.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Shared<T>> {
        Arc::clone(&self.inner).downcast::<RwLock<T>>().ok()
    }

    /// Runs `f` under a read lock.
    ///
    /// Returns `None` if the wrapped type is not `T`.
    pub fn read<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let lock = self.inner.downcast_ref::<RwLock<T>>()?;
        let guard = lock.read().unwrap_or_else(PoisonError::into_inner);
        Some(f(&guard))
    }

    /// Runs `f` under a write lock.
    ///
    /// Returns `None` if the wrapped type is not `T`.
    pub fn write<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let lock = self.inner.downcast_ref::<RwLock<T>>()?;
        let mut guard = lock.write().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef<{}>({:#x})", self.rust_type, self.identity())
    }
}

impl PartialEq for ObjectRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ObjectRef, shared};

    #[test]
    fn identity_follows_the_node() {
        let node = shared(String::from("a"));
        let a = ObjectRef::from_shared(node.clone());
        let b = ObjectRef::from_shared(node.clone());
        let c = ObjectRef::new(String::from("a"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is::<String>());
        assert!(!a.is::<u8>());
        assert!(std::sync::Arc::ptr_eq(&a.downcast::<String>().unwrap(), &node));
    }

    #[test]
    fn wrong_type_is_none() {
        let a = ObjectRef::new(1_i32);
        assert!(a.downcast::<i64>().is_none());
        assert!(a.read(|_: &i64| ()).is_none());
        assert!(a.write(|_: &mut i64| ()).is_none());
        assert_eq!(a.read(|v: &i32| *v), Some(1));
    }
}
