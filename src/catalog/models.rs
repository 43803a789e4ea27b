use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::visibility::{Condition, DisplayContext, all_hold};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
}

impl HttpMethod {
    /// POST and PUT always send a JSON body, `{}` when nothing was placed.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT)
    }
}

/// Kind of value a field holds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    /// short text
    String,
    /// serialized JSON text, parsed when the request is built
    Json,
    Number,
    Boolean,
    /// single choice among `options`
    Options,
    /// several choices among `options`
    MultiOptions,
    /// group of child fields stored as a nested object
    Collection,
    /// single choice populated by a lookup request
    DynamicOptions,
}

/// Where a field value lands in the outbound request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "in", rename_all = "snake_case")]
pub enum Placement {
    /// `{key}` segment of the path template
    Path { key: String },
    Query { key: String },
    /// key of the JSON body object, dotted keys address nested objects
    Body { key: String },
    /// the value is the whole body
    BodyRoot,
    Header { key: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// regex the text value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// JSON schema the parsed value must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    /// `None` for fields that only steer the node (e.g. `simplify`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// operations of the owning resource this field applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// children of a collection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
    /// lookup populating a dynamic choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<String>,
}

impl FieldSpec {
    pub fn applies_to(
        &self,
        operation: &str,
    ) -> bool {
        self.operations.iter().any(|o| o == operation)
    }

    pub fn is_visible(
        &self,
        ctx: &DisplayContext,
    ) -> bool {
        all_hold(&self.conditions, ctx)
    }

    /// True for this field or any descendant using a lookup.
    pub fn uses_lookup(&self) -> bool {
        self.kind == FieldKind::DynamicOptions || self.fields.iter().any(FieldSpec::uses_lookup)
    }
}

/// Post-processing applied to a response when `simplify` is on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseReshape {
    /// keep only these top-level keys, in this order
    Pick { keys: Vec<String> },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reshape: Option<ResponseReshape>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub operations: Vec<OperationSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ResourceSpec {
    pub fn operation(
        &self,
        name: &str,
    ) -> Option<&OperationSpec> {
        self.operations.iter().find(|o| o.name.eq_ignore_ascii_case(name) || o.display_name.eq_ignore_ascii_case(name))
    }

    /// Top-level fields of an operation, in declaration order.
    pub fn fields_for<'a>(
        &'a self,
        operation: &'a str,
    ) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().filter(move |f| f.applies_to(operation))
    }

    pub fn matches(
        &self,
        name: &str,
    ) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.display_name.eq_ignore_ascii_case(name)
    }
}
