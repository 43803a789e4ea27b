//! Dynamic-choice lookups.
//!
//! A lookup is a read-only list call whose response populates the choices of
//! a `dynamic_options` field (the index-name picker). It is resolved while a
//! form is rendered, never while a request is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AlgoliaError, HttpMethod, RequestDescriptor, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LookupSpec {
    pub name: String,
    pub path: String,
    /// array property holding the listed items
    pub property: String,
    /// item key shown to the user
    pub name_key: String,
    /// item key used as the field value
    pub value_key: String,
}

impl LookupSpec {
    pub fn request(&self) -> RequestDescriptor {
        RequestDescriptor {
            method: HttpMethod::GET,
            path: self.path.clone(),
            query: BTreeMap::new(),
            body: None,
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub value: Value,
}

/// Map a lookup response to name/value choices.
///
/// Items missing the name key are skipped; a missing value key falls back to
/// the name.
pub fn project_choices(
    spec: &LookupSpec,
    response: &Value,
) -> Result<Vec<Choice>> {
    let items = response
        .get(&spec.property)
        .and_then(Value::as_array)
        .ok_or_else(|| AlgoliaError::Convert(format!("lookup '{}' expects an array at '{}'", spec.name, spec.property)))?;

    let choices = items
        .iter()
        .filter_map(|item| {
            let name = match item.get(&spec.name_key)? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let value = item.get(&spec.value_key).cloned().unwrap_or_else(|| Value::String(name.clone()));
            Some(Choice { name, value })
        })
        .collect();

    Ok(choices)
}
