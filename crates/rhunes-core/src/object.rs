//! The lifecycle object every managed type is built on.
//!
//! An [`ObjectCore`] owns the identity of an object (id and name), a set of
//! free-form tags, the boolean lifecycle [`Flags`] and a named per-instance
//! cache. Objects never destroy themselves: their flags are only changed by
//! their own lifecycle hooks or by the container that owns them.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Boolean lifecycle state of an object.
///
/// Everything starts `false` except `visible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Set by `on_load`, cleared by `on_unload` / `on_destroy`.
    pub loaded: bool,
    /// Set by the first `on_start`, cleared by `on_unload` / `on_destroy`.
    pub started: bool,
    /// Owner-controlled. Inactive objects are neither loaded nor updated.
    pub active: bool,
    /// Owner-controlled. Invisible entities are skipped by the render pass.
    pub visible: bool,
    /// Free marker for game code.
    pub dirty: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            loaded: false,
            started: false,
            active: false,
            visible: true,
            dirty: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectCore
// ---------------------------------------------------------------------------

/// Identity, tags, flags and cache shared by every managed object.
#[derive(Debug, Clone)]
pub struct ObjectCore<I> {
    id: I,
    name: String,
    tags: BTreeSet<String>,
    flags: Flags,
    cache: HashMap<String, serde_json::Value>,
}

impl<I: Copy> ObjectCore<I> {
    /// Create an object with default flags, no tags and an empty cache.
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tags: BTreeSet::new(),
            flags: Flags::default(),
            cache: HashMap::new(),
        }
    }

    /// The object identifier.
    pub fn id(&self) -> I {
        self.id
    }

    /// The object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // -- tags ---------------------------------------------------------------

    /// All tags, sorted.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Remove a tag. Returns `false` if it was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Whether the object carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    // -- flags --------------------------------------------------------------

    /// Current flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Mutable access to the flags, for the object's own hooks and owners.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    // -- cache --------------------------------------------------------------

    /// Look up a cached value.
    pub fn cache_get(&self, key: &str) -> Option<&serde_json::Value> {
        self.cache.get(key)
    }

    /// Store a value in the cache, returning the previous one.
    pub fn cache_insert(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.cache.insert(key.into(), value)
    }

    /// Remove a cached value.
    pub fn cache_remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.cache.remove(key)
    }

    /// Whether the cache is empty.
    pub fn cache_is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached value.
    pub fn cache_clear(&mut self) {
        self.cache.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
