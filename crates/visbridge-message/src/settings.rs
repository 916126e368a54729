//! Plugin settings and how partial updates are applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MessageError, Result};

/// How an inbound settings object is applied to a held value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// Shallow key-wise override: keys present in the patch replace the held
    /// value entirely; absent keys are untouched.
    Merge,
    /// The patch becomes the whole value.
    Replace,
}

impl MergePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MergePolicy::Merge => "merge",
            MergePolicy::Replace => "replace",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = MessageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(MergePolicy::Merge),
            "replace" => Ok(MergePolicy::Replace),
            _ => Err(MessageError::UnknownMergePolicy(s.to_string())),
        }
    }
}

/// A plugin-defined settings object.
///
/// The protocol imposes no schema beyond "a JSON object".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept any JSON object; reject every other value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(MessageError::SettingsNotObject("null")),
            Value::Bool(_) => Err(MessageError::SettingsNotObject("a boolean")),
            Value::Number(_) => Err(MessageError::SettingsNotObject("a number")),
            Value::String(_) => Err(MessageError::SettingsNotObject("a string")),
            Value::Array(_) => Err(MessageError::SettingsNotObject("an array")),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Apply `patch` according to `policy`.
    pub fn merge(&mut self, patch: Settings, policy: MergePolicy) {
        match policy {
            MergePolicy::Merge => {
                for (key, value) in patch.0 {
                    self.0.insert(key, value);
                }
            }
            MergePolicy::Replace => *self = patch,
        }
    }

    /// Non-mutating form of [`merge`](Self::merge).
    pub fn merged(&self, patch: Settings, policy: MergePolicy) -> Settings {
        let mut next = self.clone();
        next.merge(patch, policy);
        next
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

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Settings {
    type Error = MessageError;

    fn try_from(value: Value) -> Result<Self> {
        Settings::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
