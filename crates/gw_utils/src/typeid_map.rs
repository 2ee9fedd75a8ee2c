use core::any::TypeId;
use core::fmt;

use crate::hash::{NoOpHashMap, NoOpHashState};

// -----------------------------------------------------------------------------
// TypeIdMap

/// Values indexed by the Rust type they belong to.
///
/// Lookups hash nothing: a [`TypeId`] is already a random `u64`.
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use gw_utils::TypeIdMap;
///
/// let mut names = TypeIdMap::new();
/// names.insert(TypeId::of::<u8>(), "u8");
///
/// assert_eq!(names.get_type::<u8>(), Some(&"u8"));
/// assert!(!names.contains_type::<String>());
/// ```
pub struct TypeIdMap<V>(NoOpHashMap<TypeId, V>);

impl<V> TypeIdMap<V> {
    /// Creates an empty map.
    #[inline]
    pub const fn new() -> Self {
        Self(NoOpHashMap::with_hasher(NoOpHashState))
    }

    /// Maps `type_id` to `value`, returning the previous value.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, value: V) -> Option<V> {
        self.0.insert(type_id, value)
    }

    /// The value of `type_id`.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// The value of `T`.
    #[inline]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    /// Returns `true` if `T` has a value.
    #[inline]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.0.contains_key(&TypeId::of::<T>())
    }

    /// The number of types with a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no type has a value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.values()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeIdMap;

    struct Point;

    #[test]
    fn latest_insert_wins() {
        let mut map = TypeIdMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert(TypeId::of::<Point>(), "Point"), None);
        assert_eq!(map.insert(TypeId::of::<Point>(), "Vertex"), Some("Point"));
        assert_eq!(map.get_type::<Point>(), Some(&"Vertex"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn types_are_distinct() {
        let mut map = TypeIdMap::new();
        map.insert(TypeId::of::<u32>(), 32);
        assert!(map.contains_type::<u32>());
        assert!(!map.contains_type::<i32>());
        assert_eq!(map.get(&TypeId::of::<i32>()), None);
    }
}
