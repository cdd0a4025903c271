//! Process-unique identifiers.
//!
//! Every managed object (engine, manager, scene, entity, component, delegate,
//! callback) draws its identifier from one shared, monotonically increasing
//! counter. The typed newtypes below keep the different id spaces apart at
//! compile time while guaranteeing that no two objects in the process ever
//! share the same raw value.
//!
//! Identifiers display as their decimal string, which is the opaque string
//! form used in log lines and event arguments.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ider
// ---------------------------------------------------------------------------

/// Monotonic identifier generator.
///
/// The process-wide instance is reached through [`ider`]. Standalone
/// instances are only useful for tests of the generator itself.
#[derive(Debug)]
pub struct Ider {
    last: AtomicU64,
}

impl Ider {
    /// Create a generator whose first identifier will be `1`.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Return the next identifier. Never returns the same value twice until
    /// [`reset`](Self::reset) is called.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently issued identifier, `0` if none was issued yet.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }

    /// Reset the generator back to zero.
    ///
    /// Only meant for test harnesses that own the whole process: identifiers
    /// issued before the reset will be issued again.
    pub fn reset(&self) {
        self.last.store(0, Ordering::Relaxed);
    }
}

impl Default for Ider {
    fn default() -> Self {
        Self::new()
    }
}

static IDER: Ider = Ider::new();

/// The process-wide identifier generator.
pub fn ider() -> &'static Ider {
    &IDER
}

// ---------------------------------------------------------------------------
// Typed identifiers
// ---------------------------------------------------------------------------

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Allocate a fresh identifier from the process-wide [`Ider`].
            pub fn next() -> Self {
                Self(ider().next())
            }

            /// Raw `u64` representation.
            #[inline]
            pub fn to_raw(self) -> u64 {
                self.0
            }

            /// Reconstruct from a raw `u64`.
            #[inline]
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id!(
    /// Identifier of an engine instance.
    EngineId
);
object_id!(
    /// Identifier of a manager (delegate, game or scene manager).
    ManagerId
);
object_id!(
    /// Identifier of a scene.
    SceneId
);
object_id!(
    /// Identifier of an entity.
    EntityId
);
object_id!(
    /// Identifier of a component instance.
    ComponentId
);
object_id!(
    /// Identifier of a delegate (event source).
    DelegateId
);
object_id!(
    /// Identifier of a registered callback.
    CallbackId
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
