use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{AlgoliaError, Result};

/// Values supplied for one invocation, keyed by field name.
///
/// Values are kept as the host handed them over: JSON fields stay serialized
/// text until the builder coerces them, collections are nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: Map<String, Value>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V: Into<Value>>(
        mut self,
        name: &str,
        value: V,
    ) -> Self {
        self.set(name, value);
        self
    }

    pub fn set<V: Into<Value>>(
        &mut self,
        name: &str,
        value: V,
    ) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserialize a value into `T`, `None` when absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Option<T> {
        self.values.get(name).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl From<ParameterSet> for Value {
    fn from(params: ParameterSet) -> Self {
        Value::Object(params.values)
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = AlgoliaError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(AlgoliaError::Convert(format!("parameters must be an object, got {}", other))),
        }
    }
}
