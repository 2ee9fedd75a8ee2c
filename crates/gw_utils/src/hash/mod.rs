//! Provide hash containers, re-exports *hashbrown* and *foldhash*.
//!
//! Every container here uses a deterministic hasher, so iteration order only
//! depends on the inserted keys. Encoded payloads never depend on that order,
//! but debug output and tests stay reproducible.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{NoOpHashState, NoOpHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`].
///
/// # Examples
///
/// ```
/// use gw_utils::hash::{FixedHashState, HashMap};
///
/// let mut map: HashMap<&str, u32> = HashMap::with_hasher(FixedHashState);
/// map.insert("object-id", 1);
/// assert_eq!(map.get("object-id"), Some(&1));
/// ```
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;

/// A [`hashbrown::HashMap`] using [`NoOpHashState`].
///
/// Only suitable for keys whose `Hash` impl writes one already-random `u64`,
/// such as [`TypeId`](core::any::TypeId).
pub type NoOpHashMap<K, V> = hashbrown::HashMap<K, V, NoOpHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
