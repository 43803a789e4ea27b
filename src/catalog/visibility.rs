//! Display predicates.
//!
//! A field is shown when every one of its conditions holds over a flat
//! context holding `resource`, `operation` and the current sibling values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RESOURCE_KEY: &str = "resource";
pub const OPERATION_KEY: &str = "operation";

/// Comparison operator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    In,
    NotIn,
    Empty,
    NotEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn holds(
        &self,
        ctx: &DisplayContext,
    ) -> bool {
        let actual = ctx.get(&self.key);
        match self.operator {
            ConditionOperator::In => actual.is_some_and(|a| self.values.iter().any(|v| loosely_equal(a, v))),
            ConditionOperator::NotIn => !actual.is_some_and(|a| self.values.iter().any(|v| loosely_equal(a, v))),
            ConditionOperator::Empty => match actual {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(arr)) => arr.is_empty(),
                Some(Value::Object(obj)) => obj.is_empty(),
                _ => false,
            },
            ConditionOperator::NotEmpty => match actual {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Array(arr)) => !arr.is_empty(),
                Some(Value::Object(obj)) => !obj.is_empty(),
                _ => true,
            },
        }
    }
}

/// True when every condition holds; an empty list always holds.
pub fn all_hold(
    conditions: &[Condition],
    ctx: &DisplayContext,
) -> bool {
    conditions.iter().all(|c| c.holds(ctx))
}

/// Form values treat `true` and `"true"` alike, same for numbers.
fn loosely_equal(
    actual: &Value,
    expected: &Value,
) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::String(a), Value::Bool(_) | Value::Number(_)) => *a == expected.to_string(),
        (Value::Bool(_) | Value::Number(_), Value::String(e)) => actual.to_string() == *e,
        _ => false,
    }
}

/// Flat key/value view the predicates are evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayContext {
    values: Map<String, Value>,
}

impl DisplayContext {
    pub fn new(
        resource: &str,
        operation: &str,
    ) -> Self {
        let mut values = Map::new();
        values.insert(RESOURCE_KEY.to_string(), Value::String(resource.to_string()));
        values.insert(OPERATION_KEY.to_string(), Value::String(operation.to_string()));
        Self { values }
    }

    pub fn with<V: Into<Value>>(
        mut self,
        key: &str,
        value: V,
    ) -> Self {
        self.set(key, value);
        self
    }

    pub fn set<V: Into<Value>>(
        &mut self,
        key: &str,
        value: V,
    ) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.values.get(key)
    }
}
