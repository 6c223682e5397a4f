//! Sequential identifiers for editor records
//!
//! Snapshots, change records and undo operations are identified by a
//! monotonically increasing sequence number drawn from a per-owner
//! generator. Sequence numbers double as a stable tie-breaker when two
//! records share the same millisecond timestamp.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(u64);

impl SequenceId {
    /// Sentinel that is never handed out by a generator
    pub const NONE: SequenceId = SequenceId(0);

    /// Wrap a raw sequence number
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw sequence number
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceId({})", self.0)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Thread-safe generator of sequence ids, starting at 1
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a new generator
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Hand out the next id
    pub fn next(&self) -> SequenceId {
        SequenceId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to [`IdGenerator::next`] will return
    pub fn peek(&self) -> SequenceId {
        SequenceId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("next", &self.peek().raw())
            .finish()
    }
}

/// Declare a typed wrapper around [`SequenceId`] with a display prefix.
///
/// ```ignore
/// void_core::sequence_id!(SnapshotId, "snap");
/// ```
#[macro_export]
macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub $crate::SequenceId);

        impl $name {
            /// Get the raw sequence number
            #[inline]
            pub const fn raw(&self) -> u64 {
                self.0.raw()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}-{}", $prefix, self.0.raw())
            }
        }

        impl From<$crate::SequenceId> for $name {
            fn from(id: $crate::SequenceId) -> Self {
                Self(id)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    sequence_id!(TestId, "test");

    #[test]
    fn test_generator_is_monotonic() {
        let gen = IdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert!(a < b);
        assert_eq!(a.raw(), 1);
        assert_eq!(gen.peek().raw(), 3);
    }

    #[test]
    fn test_none_is_never_generated() {
        let gen = IdGenerator::new();
        assert!(!gen.next().is_none());
        assert!(SequenceId::NONE.is_none());
    }

    #[test]
    fn test_typed_id_display() {
        let id = TestId::from(SequenceId::from_raw(7));
        assert_eq!(id.to_string(), "test-7");
        assert_eq!(id.raw(), 7);
    }
}
