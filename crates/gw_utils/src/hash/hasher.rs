//! Deterministic hash states for the registry and session tables.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6A09E667F3BCC909);

/// A hasher whose results only depend on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state based upon a fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use gw_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("encoded-type");
/// let b = FixedHashState.hash_one("encoded-type");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher that passes a written `u64` straight through.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Keys are expected to go through `write_u64`; anything else is folded in.
        for chunk in bytes.chunks(8) {
            let mut word = [0; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.hash ^= u64::from_le_bytes(word);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state producing [`NoOpHasher`].
///
/// `TypeId` already hashes as a single random `u64`, so the registry indexes
/// definitions by type with this state.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use gw_utils::hash::NoOpHashState;
///
/// assert_eq!(NoOpHashState.hash_one(7_u64), 7);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher::default()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hasher};

    use super::{FixedHashState, NoOpHashState};

    #[test]
    fn fixed_state_is_deterministic() {
        let a = FixedHashState.hash_one((1_u32, "Point"));
        let b = FixedHashState.hash_one((1_u32, "Point"));
        assert_eq!(a, b);
        assert_ne!(a, FixedHashState.hash_one((2_u32, "Point")));
    }

    #[test]
    fn noop_write_matches_write_u64() {
        let mut by_bytes = NoOpHashState.build_hasher();
        by_bytes.write(&10_u64.to_le_bytes());
        let mut by_u64 = NoOpHashState.build_hasher();
        by_u64.write_u64(10);
        assert_eq!(by_bytes.finish(), by_u64.finish());
    }
}
