use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::{
    AlgoliaError, Result,
    catalog::{Catalog, DisplayContext, FieldKind, FieldSpec, Placement, declares_body_root},
};

use super::{RequestDescriptor, coerce, field_path, path};

/// Read the placed field values back out of a built request.
///
/// Walks the same field table as the builder and extracts each visible
/// field from its placement. The result, keyed by field path, equals the
/// values the builder placed.
pub fn recover_parameters(
    catalog: &Catalog,
    resource: &str,
    operation: &str,
    request: &RequestDescriptor,
) -> Result<BTreeMap<String, Value>> {
    let (resource_spec, operation_spec) = catalog.operation(resource, operation)?;
    let path_values = path::match_template(&operation_spec.path, &request.path)
        .ok_or_else(|| AlgoliaError::Convert(format!("path '{}' does not match '{}'", request.path, operation_spec.path)))?;

    let fields: Vec<&FieldSpec> = resource_spec.fields_for(&operation_spec.name).collect();
    let source = Source { request, path_values };
    let ctx = DisplayContext::new(&resource_spec.name, &operation_spec.name);

    let mut recovered = Vec::new();
    recover_fields(&fields, &source, &ctx, None, &mut recovered)?;

    // a declared body root replaces keyed body values, same as when building
    let has_root = declares_body_root(fields.iter().copied());
    Ok(recovered
        .into_iter()
        .filter(|(_, spec, _)| !(has_root && matches!(spec.placement, Some(Placement::Body { .. }))))
        .map(|(path, _, value)| (path, value))
        .collect())
}

struct Source<'r> {
    request: &'r RequestDescriptor,
    path_values: HashMap<String, String>,
}

fn recover_fields<'a>(
    fields: &[&'a FieldSpec],
    source: &Source<'_>,
    base: &DisplayContext,
    prefix: Option<&str>,
    out: &mut Vec<(String, &'a FieldSpec, Value)>,
) -> Result<()> {
    let mut candidates: Vec<Option<Value>> = Vec::with_capacity(fields.len());
    for field in fields {
        let path = field_path(prefix, &field.name);
        candidates.push(extract(field, &path, source)?);
    }

    let mut ctx = base.clone();
    for (field, candidate) in fields.iter().zip(candidates.iter()) {
        match candidate {
            Some(value) => ctx.set(&field.name, value.clone()),
            None if !field.default.is_null() => ctx.set(&field.name, field.default.clone()),
            None => {}
        }
    }

    for (&field, candidate) in fields.iter().zip(candidates) {
        if !field.is_visible(&ctx) {
            continue;
        }
        let path = field_path(prefix, &field.name);

        if field.kind == FieldKind::Collection {
            let children: Vec<&'a FieldSpec> = field.fields.iter().collect();
            recover_fields(&children, source, &ctx, Some(&path), out)?;
            continue;
        }

        if let Some(value) = candidate {
            if field.required || !coerce::is_empty_container(&value) {
                out.push((path, field, value));
            }
        }
    }

    Ok(())
}

fn extract(
    field: &FieldSpec,
    path: &str,
    source: &Source<'_>,
) -> Result<Option<Value>> {
    let request = source.request;
    let value = match &field.placement {
        Some(Placement::Path { key }) => match source.path_values.get(key) {
            Some(text) => Some(coerce::coerce(field, path, &Value::String(text.clone()))?),
            None => None,
        },
        Some(Placement::Query { key }) => match request.query.get(key) {
            Some(text) => Some(query_value(field, path, text)?),
            None => None,
        },
        Some(Placement::Header { key }) => match request.headers.get(key) {
            Some(text) => Some(coerce::coerce(field, path, &Value::String(text.clone()))?),
            None => None,
        },
        Some(Placement::Body { key }) => request.body.as_ref().and_then(|body| body_value(body, key)).cloned(),
        Some(Placement::BodyRoot) => request.body.clone(),
        None => None,
    };

    Ok(value)
}

fn body_value<'b>(
    body: &'b Value,
    key: &str,
) -> Option<&'b Value> {
    key.split('.').try_fold(body, |current, segment| current.get(segment))
}

/// Undo the query stringification of `query_text`.
fn query_value(
    field: &FieldSpec,
    path: &str,
    text: &str,
) -> Result<Value> {
    match field.kind {
        FieldKind::Json if text.starts_with('{') || text.starts_with('[') => serde_json::from_str(text).map_err(|err| AlgoliaError::MalformedJson {
            field: path.to_string(),
            reason: err.to_string(),
        }),
        FieldKind::Json => Ok(Value::Array(text.split(',').filter(|item| !item.is_empty()).map(|item| Value::String(item.to_string())).collect())),
        _ => coerce::coerce(field, path, &Value::String(text.to_string())),
    }
}
