//! Response reshaping.

use serde_json::{Map, Value};

use crate::{
    catalog::{OperationSpec, ResponseReshape},
    common::ParameterSet,
};

/// Parameter names that switch reshaping on.
pub const SIMPLIFY_FLAGS: [&str; 2] = ["simplify", "simplifiedOutput"];

pub fn simplify_requested(params: &ParameterSet) -> bool {
    SIMPLIFY_FLAGS.iter().any(|flag| match params.get(flag) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Filter a response down to the whitelisted top-level keys.
///
/// Keys follow whitelist order; keys absent from the response are dropped.
/// Non-object responses pass through.
pub fn reshape(
    response: Value,
    reshape: &ResponseReshape,
) -> Value {
    match (response, reshape) {
        (Value::Object(mut object), ResponseReshape::Pick { keys }) => {
            let mut picked = Map::new();
            for key in keys {
                if let Some(value) = object.remove(key) {
                    picked.insert(key.clone(), value);
                }
            }
            Value::Object(picked)
        }
        (other, _) => other,
    }
}

/// Apply the operation's reshaping when the parameters ask for it.
pub fn apply(
    operation: &OperationSpec,
    params: &ParameterSet,
    response: Value,
) -> Value {
    match &operation.reshape {
        Some(rule) if simplify_requested(params) => reshape(response, rule),
        _ => response,
    }
}
