//! Catalog-wide checks of the builder contract.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{
    AlgoliaError,
    catalog::{Catalog, ConditionOperator, FieldKind, FieldSpec, OperationSpec, Placement, ResourceSpec, visibility::OPERATION_KEY},
    common::ParameterSet,
    request::{RequestBuilder, recover_parameters},
};

fn sample(field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::String | FieldKind::DynamicOptions => json!("sample"),
        FieldKind::Number => json!(field.validation.as_ref().and_then(|v| v.min).map(|min| min as i64).unwrap_or(1)),
        FieldKind::Boolean => json!(true),
        FieldKind::Options => field.options[0].value.clone(),
        FieldKind::MultiOptions => json!([field.options[0].value.clone()]),
        FieldKind::Json => match &field.default {
            Value::String(s) if !s.is_empty() => json!(s),
            _ => json!("{}"),
        },
        FieldKind::Collection => json!({}),
    }
}

fn operations(catalog: &Catalog) -> impl Iterator<Item = (&ResourceSpec, &OperationSpec)> {
    catalog.resources().iter().flat_map(|r| r.operations.iter().map(move |o| (r, o)))
}

fn required_only(
    resource: &ResourceSpec,
    operation: &OperationSpec,
) -> ParameterSet {
    let mut params = ParameterSet::new();
    for field in resource.fields_for(&operation.name).filter(|f| f.required) {
        params.set(&field.name, sample(field));
    }
    params
}

/// Set sibling values so the field's own conditions hold.
fn satisfy(
    params: &mut ParameterSet,
    field: &FieldSpec,
) {
    for condition in &field.conditions {
        if condition.key == OPERATION_KEY {
            continue;
        }
        if let (ConditionOperator::In, Some(value)) = (condition.operator, condition.values.first()) {
            params.set(&condition.key, value.clone());
        }
    }
}

fn hidden_for_operation(
    field: &FieldSpec,
    operation: &str,
) -> bool {
    field
        .conditions
        .iter()
        .any(|c| c.key == OPERATION_KEY && c.operator == ConditionOperator::In && !c.values.iter().any(|v| v == operation))
}

#[test]
fn test_required_only_builds_emit_no_optional_keys() {
    let builder = RequestBuilder::builtin().unwrap();

    for (resource, operation) in operations(builder.catalog()) {
        let params = required_only(resource, operation);
        let request = builder
            .build(&resource.name, &operation.name, &params)
            .unwrap_or_else(|err| panic!("{}.{}: {}", resource.name, operation.name, err));
        let placed = builder.resolve(&resource.name, &operation.name, &params).unwrap();

        for field in &placed {
            assert!(field.spec.required, "{}.{}: optional field {} was placed", resource.name, operation.name, field.path);
        }

        let expected_query: BTreeSet<&str> = placed
            .iter()
            .filter_map(|f| match &f.spec.placement {
                Some(Placement::Query { key }) => Some(key.as_str()),
                _ => None,
            })
            .collect();
        let actual_query: BTreeSet<&str> = request.query.keys().map(String::as_str).collect();
        assert_eq!(actual_query, expected_query, "{}.{}", resource.name, operation.name);

        let has_root = placed.iter().any(|f| f.spec.placement == Some(Placement::BodyRoot));
        if let (false, Some(Value::Object(body))) = (has_root, &request.body) {
            let expected_body: BTreeSet<&str> = placed
                .iter()
                .filter_map(|f| match &f.spec.placement {
                    Some(Placement::Body { key }) => key.split('.').next(),
                    _ => None,
                })
                .collect();
            let actual_body: BTreeSet<&str> = body.keys().map(String::as_str).collect();
            assert_eq!(actual_body, expected_body, "{}.{}", resource.name, operation.name);
        }
    }
}

#[test]
fn test_every_json_field_rejects_malformed_text() {
    let builder = RequestBuilder::builtin().unwrap();
    let mut checked = 0;

    for (resource, operation) in operations(builder.catalog()) {
        for field in resource.fields_for(&operation.name) {
            let targets: Vec<(Option<&FieldSpec>, &FieldSpec)> = if field.kind == FieldKind::Collection {
                field.fields.iter().map(|child| (Some(field), child)).collect()
            } else {
                vec![(None, field)]
            };

            for (parent, target) in targets {
                if target.kind != FieldKind::Json || hidden_for_operation(target, &operation.name) {
                    continue;
                }

                let mut params = required_only(resource, operation);
                let expected_path = match parent {
                    Some(parent) => {
                        let mut children = ParameterSet::new();
                        satisfy(&mut children, target);
                        children.set(&target.name, "{not json");
                        params.set(&parent.name, Value::from(children));
                        format!("{}.{}", parent.name, target.name)
                    }
                    None => {
                        satisfy(&mut params, target);
                        params.set(&target.name, "{not json");
                        target.name.clone()
                    }
                };

                let result = builder.build(&resource.name, &operation.name, &params);
                assert!(
                    matches!(&result, Err(AlgoliaError::MalformedJson { field, .. }) if *field == expected_path),
                    "{}.{} {}: {:?}",
                    resource.name,
                    operation.name,
                    expected_path,
                    result
                );
                checked += 1;
            }
        }
    }

    assert!(checked > 50, "only {} JSON fields checked", checked);
}

#[test]
fn test_round_trip_with_every_field_supplied() {
    let builder = RequestBuilder::builtin().unwrap();

    for (resource, operation) in operations(builder.catalog()) {
        let mut params = ParameterSet::new();
        for field in resource.fields_for(&operation.name) {
            if field.kind == FieldKind::Collection {
                let mut children = ParameterSet::new();
                for child in &field.fields {
                    children.set(&child.name, sample(child));
                }
                params.set(&field.name, Value::from(children));
            } else if !params.contains(&field.name) {
                params.set(&field.name, sample(field));
            }
        }

        let request = builder
            .build(&resource.name, &operation.name, &params)
            .unwrap_or_else(|err| panic!("{}.{}: {}", resource.name, operation.name, err));
        let placed: std::collections::BTreeMap<String, Value> =
            builder.resolve(&resource.name, &operation.name, &params).unwrap().into_iter().map(|f| (f.path, f.value)).collect();
        let recovered = recover_parameters(builder.catalog(), &resource.name, &operation.name, &request).unwrap();

        assert_eq!(recovered, placed, "{}.{}", resource.name, operation.name);
    }
}
