use regex::Regex;
use serde_json::{Number, Value};

use crate::{
    AlgoliaError, Result,
    catalog::{ChoiceOption, FieldKind, FieldSpec, Validation},
};

/// Raw value the builder treats as "not supplied".
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Default a required field may fall back to when unset.
///
/// Serialized empty containers (`"[]"`, `"{}"`) are placeholders, not values.
pub fn usable_default(field: &FieldSpec) -> Option<&Value> {
    let default = &field.default;
    if is_empty(default) {
        return None;
    }
    if let Value::String(s) = default {
        if matches!(s.trim(), "[]" | "{}") {
            return None;
        }
    }
    Some(default)
}

/// Coerced value that carries nothing: an empty array or object.
pub fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Convert a raw form value to the JSON value sent on the wire.
///
/// `path` is the field path reported in errors.
pub fn coerce(
    field: &FieldSpec,
    path: &str,
    raw: &Value,
) -> Result<Value> {
    let value = match field.kind {
        FieldKind::String => Value::String(coerce_text(path, raw)?),
        FieldKind::DynamicOptions => Value::String(coerce_text(path, resource_locator_value(raw))?),
        FieldKind::Json => coerce_json(path, raw)?,
        FieldKind::Number => coerce_number(path, raw)?,
        FieldKind::Boolean => coerce_boolean(path, raw)?,
        FieldKind::Options => coerce_option(&field.options, path, raw)?,
        FieldKind::MultiOptions => coerce_multi_options(&field.options, path, raw)?,
        FieldKind::Collection => return Err(AlgoliaError::invalid(path, "a collection has no value of its own")),
    };

    if let Some(validation) = &field.validation {
        validate(validation, path, &value)?;
    }

    Ok(value)
}

fn coerce_text(
    path: &str,
    raw: &Value,
) -> Result<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(AlgoliaError::invalid(path, format!("expected text, got {}", other))),
    }
}

/// Index pickers may hand over `{"mode": "list", "value": "products"}`.
fn resource_locator_value(raw: &Value) -> &Value {
    match raw {
        Value::Object(obj) => obj.get("value").unwrap_or(raw),
        _ => raw,
    }
}

fn coerce_json(
    path: &str,
    raw: &Value,
) -> Result<Value> {
    match raw {
        Value::String(text) => serde_json::from_str(text).map_err(|err| AlgoliaError::MalformedJson {
            field: path.to_string(),
            reason: err.to_string(),
        }),
        other => Ok(other.clone()),
    }
}

fn coerce_number(
    path: &str,
    raw: &Value,
) -> Result<Value> {
    match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| AlgoliaError::invalid(path, format!("'{}' is not a number", s)))
        }
        other => Err(AlgoliaError::invalid(path, format!("expected a number, got {}", other))),
    }
}

fn coerce_boolean(
    path: &str,
    raw: &Value,
) -> Result<Value> {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(AlgoliaError::invalid(path, format!("expected a boolean, got {}", other))),
    }
}

fn coerce_option(
    options: &[ChoiceOption],
    path: &str,
    raw: &Value,
) -> Result<Value> {
    options.iter().find(|o| option_matches(&o.value, raw)).map(|o| o.value.clone()).ok_or_else(|| {
        let allowed: Vec<String> = options.iter().map(|o| o.value.to_string()).collect();
        AlgoliaError::invalid(path, format!("{} is not one of [{}]", raw, allowed.join(", ")))
    })
}

fn coerce_multi_options(
    options: &[ChoiceOption],
    path: &str,
    raw: &Value,
) -> Result<Value> {
    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => s.split(',').map(|item| Value::String(item.trim().to_string())).collect(),
        other => vec![other.clone()],
    };

    let chosen: Result<Vec<Value>> = items.iter().map(|item| coerce_option(options, path, item)).collect();
    Ok(Value::Array(chosen?))
}

/// `true` and `"true"` select the same option.
fn option_matches(
    option: &Value,
    raw: &Value,
) -> bool {
    if option == raw {
        return true;
    }
    match (option, raw) {
        (Value::String(_), Value::String(_)) => false,
        (_, Value::String(s)) => option.to_string() == *s,
        _ => false,
    }
}

fn validate(
    validation: &Validation,
    path: &str,
    value: &Value,
) -> Result<()> {
    if let Some(n) = value.as_f64() {
        if let Some(min) = validation.min {
            if n < min {
                return Err(AlgoliaError::invalid(path, format!("must be at least {}", min)));
            }
        }
        if let Some(max) = validation.max {
            if n > max {
                return Err(AlgoliaError::invalid(path, format!("must be at most {}", max)));
            }
        }
    }

    if let (Some(pattern), Some(text)) = (&validation.pattern, value.as_str()) {
        let re = Regex::new(pattern).map_err(|err| AlgoliaError::Catalog(format!("invalid pattern for '{}': {}", path, err)))?;
        if !re.is_match(text) {
            return Err(AlgoliaError::invalid(path, format!("'{}' does not match {}", text, pattern)));
        }
    }

    if let Some(schema) = &validation.schema {
        let validator = jsonschema::validator_for(schema).map_err(|err| AlgoliaError::Catalog(format!("invalid schema for '{}': {}", path, err)))?;
        if let Err(err) = validator.validate(value) {
            return Err(AlgoliaError::invalid(path, err.to_string()));
        }
    }

    Ok(())
}
