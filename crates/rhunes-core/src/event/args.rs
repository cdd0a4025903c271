//! Keyword arguments carried by a delegate trigger.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::ider::EntityId;

/// String-keyed arguments passed to every callback of a trigger.
///
/// Values are stored as [`serde_json::Value`] so any `serde` type can travel
/// through the event system. Entity ids are stored as their raw number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventArgs(Map<String, Value>);

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a plain value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of an entity id.
    pub fn with_entity(mut self, key: impl Into<String>, entity: EntityId) -> Self {
        self.insert(key, entity.to_raw());
        self
    }

    /// Builder-style insert of any serializable value.
    pub fn with_serialized<T: Serialize>(
        mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.0.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Insert a value, returning the previous one under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read an entity id stored with [`with_entity`](Self::with_entity).
    pub fn entity(&self, key: &str) -> Option<EntityId> {
        self.0.get(key).and_then(Value::as_u64).map(EntityId::from_raw)
    }

    /// Read a string argument.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Deserialize an argument into `T`. A missing key or a value of the
    /// wrong shape is a lookup miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for EventArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
