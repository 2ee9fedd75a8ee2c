use gw_utils::hash::{FixedHashState, HashMap};
use tracing::trace;

use crate::value::ObjectRef;

// -----------------------------------------------------------------------------
// EncodingSession

/// Identity tracking for one encode or decode pass.
///
/// Assigns each distinct instance a hash the first time it is seen, and
/// maps hashes back to instances. The session holds a handle to every
/// instance it tracks, so an identity cannot be reused by a new allocation
/// while the session is alive.
///
/// Create a fresh session for every pass. A session that saw a failed pass
/// may hold half-populated instances and should be dropped.
///
/// # Examples
///
/// ```
/// use gw_marshal::EncodingSession;
/// use gw_marshal::value::ObjectRef;
///
/// let mut session = EncodingSession::new();
/// let a = ObjectRef::new(1_u8);
///
/// assert!(!session.has_hash(&a));
/// let hash = session.get_or_assign_hash(&a).to_owned();
/// assert!(session.has_hash(&a));
/// assert_eq!(session.get_or_assign_hash(&a), hash);
/// assert!(session.get_instance(&hash).unwrap().ptr_eq(&a));
/// ```
#[derive(Debug)]
pub struct EncodingSession {
    by_identity: HashMap<usize, (String, ObjectRef)>,
    by_hash: HashMap<String, ObjectRef>,
    counter: u64,
}

impl Default for EncodingSession {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self {
            by_identity: HashMap::with_hasher(FixedHashState),
            by_hash: HashMap::with_hasher(FixedHashState),
            counter: 0,
        }
    }

    /// Returns `true` if `instance` already has a hash in this session.
    #[inline]
    pub fn has_hash(&self, instance: &ObjectRef) -> bool {
        self.by_identity.contains_key(&instance.identity())
    }

    /// The hash of `instance`, if it has one.
    pub fn hash_of(&self, instance: &ObjectRef) -> Option<&str> {
        self.by_identity
            .get(&instance.identity())
            .map(|(hash, _)| hash.as_str())
    }

    /// Returns the hash of `instance`, assigning a new one if needed.
    pub fn get_or_assign_hash(&mut self, instance: &ObjectRef) -> &str {
        let (hash, _) = self
            .by_identity
            .entry(instance.identity())
            .or_insert_with(|| {
                let hash = fresh_hash(&mut self.counter, &self.by_hash);
                trace!(hash = %hash, rust_type = instance.rust_type(), "assigned object hash");
                self.by_hash.insert(hash.clone(), instance.clone());
                (hash, instance.clone())
            });
        hash
    }

    /// Produces a hash that no instance of this session will get.
    ///
    /// Used for boxed values that are not identity tracked.
    #[inline]
    pub fn next_hash(&mut self) -> String {
        fresh_hash(&mut self.counter, &self.by_hash)
    }

    /// Records that `hash` denotes `instance`.
    ///
    /// A later record of the same hash replaces the earlier one.
    pub fn record_instance(&mut self, hash: impl Into<String>, instance: ObjectRef) {
        let hash = hash.into();
        trace!(hash = %hash, rust_type = instance.rust_type(), "recorded object");
        self.by_identity
            .insert(instance.identity(), (hash.clone(), instance.clone()));
        self.by_hash.insert(hash, instance);
    }

    /// The instance recorded under `hash`.
    #[inline]
    pub fn get_instance(&self, hash: &str) -> Option<&ObjectRef> {
        self.by_hash.get(hash)
    }

    /// The number of tracked instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Returns `true` if nothing is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

// Decoded hashes come from the wire and may collide with the counter.
fn fresh_hash(counter: &mut u64, taken: &HashMap<String, ObjectRef>) -> String {
    loop {
        *counter += 1;
        let hash = counter.to_string();
        if !taken.contains_key(&hash) {
            return hash;
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::EncodingSession;
    use crate::value::ObjectRef;

    #[test]
    fn hashes_are_per_instance() {
        let mut session = EncodingSession::new();
        let a = ObjectRef::new(1_u8);
        let b = ObjectRef::new(1_u8);

        let ha = session.get_or_assign_hash(&a).to_owned();
        let hb = session.get_or_assign_hash(&b).to_owned();
        assert_ne!(ha, hb);
        assert_eq!(session.get_or_assign_hash(&a.clone()), ha);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn first_hash_is_one() {
        let mut session = EncodingSession::new();
        let a = ObjectRef::new(());
        assert_eq!(session.get_or_assign_hash(&a), "1");
    }

    #[test]
    fn recorded_instances_resolve_both_ways() {
        let mut session = EncodingSession::new();
        let a = ObjectRef::new(String::from("x"));
        session.record_instance("1", a.clone());

        assert!(session.get_instance("1").unwrap().ptr_eq(&a));
        assert_eq!(session.hash_of(&a), Some("1"));
        assert!(session.get_instance("2").is_none());
    }

    #[test]
    fn next_hash_skips_recorded_hashes() {
        let mut session = EncodingSession::new();
        session.record_instance("1", ObjectRef::new(0_i32));
        session.record_instance("2", ObjectRef::new(0_i32));
        assert_eq!(session.next_hash(), "3");
        assert_eq!(session.next_hash(), "4");
    }
}
