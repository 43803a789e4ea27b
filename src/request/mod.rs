//! Request builder.
//!
//! Turns a `(resource, operation, ParameterSet)` triple into a
//! [`RequestDescriptor`] by interpreting the catalog's field table:
//! visibility, required checks and coercion first, then placement of every
//! surviving value into the path, query, body or headers.
//!
//! Building is pure. Nothing here performs I/O, and a descriptor is either
//! fully built or not built at all.

pub(crate) mod coerce;
pub(crate) mod path;
mod recover;

#[cfg(test)]
mod properties;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    AlgoliaError, Result,
    catalog::{Catalog, DisplayContext, FieldKind, FieldSpec, HttpMethod, OperationSpec, Placement, ResourceSpec, declares_body_root},
    common::ParameterSet,
};

pub use recover::recover_parameters;

/// A concrete request, ready for the transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// resolved path, relative to the API host
    pub path: String,
    pub query: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

/// One field value that passed validation and coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField<'a> {
    /// field name, `collection.child` for nested fields
    pub path: String,
    pub spec: &'a FieldSpec,
    pub value: Value,
}

pub struct RequestBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Builder over the embedded Algolia catalog.
    pub fn builtin() -> Result<RequestBuilder<'static>> {
        Ok(RequestBuilder::new(Catalog::builtin()?))
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn build(
        &self,
        resource: &str,
        operation: &str,
        params: &ParameterSet,
    ) -> Result<RequestDescriptor> {
        let (resource_spec, operation_spec) = self.catalog.operation(resource, operation)?;
        let placed = self.resolve(resource, operation, params)?;
        let request = assemble(operation_spec, &placed)?;

        debug!(
            resource = %resource_spec.name,
            operation = %operation_spec.name,
            method = %request.method,
            path = %request.path,
            "built request"
        );

        Ok(request)
    }

    /// Validate and coerce every visible field, returning the placed values.
    ///
    /// UI-only fields and collections themselves are not returned. When the
    /// operation declares a `body_root` field, keyed body values are dropped.
    pub fn resolve(
        &self,
        resource: &str,
        operation: &str,
        params: &ParameterSet,
    ) -> Result<Vec<ResolvedField<'a>>> {
        let (resource_spec, operation_spec) = self.catalog.operation(resource, operation)?;
        let fields: Vec<&'a FieldSpec> = resource_spec.fields_for(&operation_spec.name).collect();

        let ctx = display_context(resource_spec, operation_spec, &fields, params);
        let mut resolved = Vec::new();
        resolve_fields(&fields, params, &ctx, None, &mut resolved)?;

        Ok(apply_body_root_precedence(operation_spec, &fields, resolved))
    }
}

/// Build a request against the embedded catalog.
pub fn build_request(
    resource: &str,
    operation: &str,
    params: &ParameterSet,
) -> Result<RequestDescriptor> {
    RequestBuilder::builtin()?.build(resource, operation, params)
}

fn display_context(
    resource: &ResourceSpec,
    operation: &OperationSpec,
    fields: &[&FieldSpec],
    params: &ParameterSet,
) -> DisplayContext {
    let mut ctx = DisplayContext::new(&resource.name, &operation.name);
    overlay_values(&mut ctx, fields, params);
    ctx
}

/// Sibling values as the form shows them: supplied value, else the default.
fn overlay_values(
    ctx: &mut DisplayContext,
    fields: &[&FieldSpec],
    params: &ParameterSet,
) {
    for field in fields {
        match params.get(&field.name) {
            Some(value) => ctx.set(&field.name, value.clone()),
            None if !field.default.is_null() => ctx.set(&field.name, field.default.clone()),
            None => {}
        }
    }
}

fn field_path(
    prefix: Option<&str>,
    name: &str,
) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}

fn resolve_fields<'a>(
    fields: &[&'a FieldSpec],
    params: &ParameterSet,
    ctx: &DisplayContext,
    prefix: Option<&str>,
    out: &mut Vec<ResolvedField<'a>>,
) -> Result<()> {
    for &field in fields {
        if !field.is_visible(ctx) {
            continue;
        }
        let path = field_path(prefix, &field.name);

        let raw = match params.get(&field.name) {
            Some(value) => Some(value),
            None if field.required => coerce::usable_default(field),
            None => None,
        };
        let raw = match raw {
            Some(value) if !coerce::is_empty(value) => value,
            _ if field.required => return Err(AlgoliaError::MissingParameter(path)),
            _ => continue,
        };

        if field.kind == FieldKind::Collection {
            let children = ParameterSet::try_from(raw.clone()).map_err(|_| AlgoliaError::invalid(&path, "expected a group of values"))?;
            let child_fields: Vec<&'a FieldSpec> = field.fields.iter().collect();
            let mut child_ctx = ctx.clone();
            overlay_values(&mut child_ctx, &child_fields, &children);
            resolve_fields(&child_fields, &children, &child_ctx, Some(&path), out)?;
            continue;
        }

        let value = coerce::coerce(field, &path, raw)?;
        if !field.required && coerce::is_empty_container(&value) {
            continue;
        }
        if field.placement.is_some() {
            out.push(ResolvedField { path, spec: field, value });
        }
    }

    Ok(())
}

fn apply_body_root_precedence<'a>(
    operation: &OperationSpec,
    fields: &[&FieldSpec],
    resolved: Vec<ResolvedField<'a>>,
) -> Vec<ResolvedField<'a>> {
    if !declares_body_root(fields.iter().copied()) {
        return resolved;
    }

    let (ignored, kept): (Vec<_>, Vec<_>) = resolved.into_iter().partition(|f| matches!(f.spec.placement, Some(Placement::Body { .. })));
    if !ignored.is_empty() {
        let names: Vec<&str> = ignored.iter().map(|f| f.path.as_str()).collect();
        warn!(operation = %operation.name, ignored = ?names, "declared body root replaces keyed body fields");
    }
    kept
}

fn assemble(
    operation: &OperationSpec,
    placed: &[ResolvedField<'_>],
) -> Result<RequestDescriptor> {
    let mut path_values: BTreeMap<&str, String> = BTreeMap::new();
    let mut query = BTreeMap::new();
    let mut headers = BTreeMap::new();
    let mut keyed = Map::new();
    let mut root: Option<Value> = None;

    for field in placed {
        match &field.spec.placement {
            Some(Placement::Path { key }) => {
                path_values.insert(key.as_str(), scalar_text(&field.value));
            }
            Some(Placement::Query { key }) => {
                query.insert(key.clone(), query_text(&field.value));
            }
            Some(Placement::Header { key }) => {
                headers.insert(key.clone(), scalar_text(&field.value));
            }
            Some(Placement::Body { key }) => insert_body_key(&mut keyed, key, field.value.clone())?,
            Some(Placement::BodyRoot) => root = Some(field.value.clone()),
            None => {}
        }
    }

    let body = match root {
        Some(root) => Some(root),
        None if !keyed.is_empty() || operation.method.carries_body() => Some(Value::Object(keyed)),
        None => None,
    };

    // placeholders without a path field mirror the body value of the same key
    let path = path::render(&operation.path, |name| {
        path_values
            .get(name)
            .cloned()
            .or_else(|| body.as_ref().and_then(|b| b.get(name)).map(scalar_text))
    })?;

    Ok(RequestDescriptor {
        method: operation.method,
        path,
        query,
        body,
        headers,
    })
}

fn insert_body_key(
    body: &mut Map<String, Value>,
    key: &str,
    value: Value,
) -> Result<()> {
    let mut segments = key.split('.').peekable();
    let mut target = body;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            target.insert(segment.to_string(), value);
            return Ok(());
        }
        let entry = target.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
        target = entry.as_object_mut().ok_or_else(|| AlgoliaError::Catalog(format!("body key '{}' conflicts with another field", key)))?;
    }

    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lists of plain strings travel comma-separated, other arrays and objects
/// as JSON text.
fn query_text(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(|item| item.as_str().is_some_and(is_list_item)) => {
            items.iter().map(scalar_text).collect::<Vec<_>>().join(",")
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => scalar_text(other),
    }
}

/// Survives a comma join and split unchanged.
fn is_list_item(item: &str) -> bool {
    !item.is_empty() && !item.contains(',') && !item.starts_with(['[', '{'])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn build(
        resource: &str,
        operation: &str,
        params: ParameterSet,
    ) -> Result<RequestDescriptor> {
        build_request(resource, operation, &params)
    }

    #[test]
    fn test_get_object_without_optional_fields() {
        let request = build(
            "Records",
            "getObject",
            ParameterSet::new().with("indexName_string", "products").with("objectID_string", "test-record-123"),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::GET);
        assert_eq!(request.path, "/1/indexes/products/test-record-123");
        assert!(request.query.is_empty());
        assert_eq!(request.body, None);
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_get_object_with_attributes_to_retrieve() {
        let request = build(
            "records",
            "getObject",
            ParameterSet::new()
                .with("indexName_string", "products")
                .with("objectID_string", "test-record-123")
                .with("attributesToRetrieve_json", r#"["name","price"]"#),
        )
        .unwrap();

        assert_eq!(request.query.get("attributesToRetrieve").map(String::as_str), Some("name,price"));
    }

    #[test]
    fn test_query_list_with_commas_travels_as_json() {
        let params = ParameterSet::new().with("indexName_string", "products").with("objectID_string", "1");

        let request = build("records", "getObject", params.clone().with("attributesToRetrieve_json", r#"["1","2"]"#)).unwrap();
        assert_eq!(request.query.get("attributesToRetrieve").map(String::as_str), Some("1,2"));

        let request = build("records", "getObject", params.with("attributesToRetrieve_json", r#"["a,b"]"#)).unwrap();
        assert_eq!(request.query.get("attributesToRetrieve").map(String::as_str), Some(r#"["a,b"]"#));
    }

    #[test]
    fn test_search_single_index_with_additional_property() {
        let request = build(
            "search",
            "searchSingleIndex",
            ParameterSet::new().with("indexName_string", "products").with("additionalProperties", json!({"hitsPerPage_number": 5})),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(request.path, "/1/indexes/products/query");
        assert_eq!(request.body, Some(json!({"hitsPerPage": 5})));
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_search_single_index_without_properties_sends_empty_object() {
        let request = build("search", "searchSingleIndex", ParameterSet::new().with("indexName_string", "products").with("simplify", true)).unwrap();
        assert_eq!(request.body, Some(json!({})));
    }

    #[test]
    fn test_optional_empty_values_are_omitted() {
        let request = build(
            "search",
            "searchSingleIndex",
            ParameterSet::new().with("indexName_string", "products").with(
                "additionalProperties",
                json!({
                    "query_string": "phone",
                    "filters_string": "",
                    "typoTolerance_options": null,
                    "facets_json": "[]",
                    "ignorePlurals_json": ""
                }),
            ),
        )
        .unwrap();

        assert_eq!(request.body, Some(json!({"query": "phone"})));
    }

    #[test]
    fn test_set_dictionary_settings_body() {
        let request = build(
            "dictionaries",
            "setDictionarySettings",
            ParameterSet::new().with("disable_standard_entries_object", r#"{"en":true}"#),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::PUT);
        assert_eq!(request.path, "/1/dictionaries/*/settings");
        assert_eq!(request.body, Some(json!({"disableStandardEntries": {"en": true}})));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = build("records", "getObject", ParameterSet::new().with("indexName_string", "products")).unwrap_err();
        assert_eq!(err, AlgoliaError::MissingParameter("objectID_string".to_string()));

        let err = build("records", "getObject", ParameterSet::new().with("indexName_string", "").with("objectID_string", "1")).unwrap_err();
        assert_eq!(err, AlgoliaError::MissingParameter("indexName_string".to_string()));
    }

    #[test]
    fn test_malformed_json_in_collection_reports_path() {
        let err = build(
            "search",
            "searchSingleIndex",
            ParameterSet::new().with("indexName_string", "products").with("additionalProperties", json!({"facetFilters_json": "[\"brand:apple\""})),
        )
        .unwrap_err();

        assert!(matches!(err, AlgoliaError::MalformedJson { ref field, .. } if field == "additionalProperties.facetFilters_json"));
    }

    #[test]
    fn test_invalid_parameter_bounds() {
        let err = build(
            "search",
            "searchSingleIndex",
            ParameterSet::new().with("indexName_string", "products").with("additionalProperties", json!({"hitsPerPage_number": 0})),
        )
        .unwrap_err();

        assert!(matches!(err, AlgoliaError::InvalidParameter { ref field, .. } if field == "additionalProperties.hitsPerPage_number"));
    }

    #[test]
    fn test_task_id_must_be_an_integer() {
        for operation in ["getTask", "getAppTask"] {
            let err = build("indices", operation, ParameterSet::new().with("indexName_string", "products").with("taskID_number", "2.5")).unwrap_err();
            assert!(matches!(err, AlgoliaError::InvalidParameter { ref field, .. } if field == "taskID_number"), "{}", operation);
        }

        let request = build("indices", "getAppTask", ParameterSet::new().with("taskID_number", "42")).unwrap();
        assert_eq!(request.path, "/1/task/42");
    }

    #[test]
    fn test_unknown_operation() {
        let err = build("records", "explode", ParameterSet::new()).unwrap_err();
        assert!(matches!(err, AlgoliaError::UnknownOperation { .. }));
    }

    #[test]
    fn test_wildcard_path_and_body() {
        let request = build(
            "records",
            "multipleBatch",
            ParameterSet::new().with("requests_json", r#"[{"action":"addObject","indexName":"products","body":{"name":"phone"}}]"#),
        )
        .unwrap();

        assert_eq!(request.path, "/1/indexes/*/batch");
        assert_eq!(request.body, Some(json!({"requests": [{"action": "addObject", "indexName": "products", "body": {"name": "phone"}}]})));
    }

    #[test]
    fn test_path_values_are_encoded() {
        let request = build(
            "records",
            "deleteObject",
            ParameterSet::new().with("indexName_string", "dev products").with("objectID_string", "sku/42"),
        )
        .unwrap();
        assert_eq!(request.path, "/1/indexes/dev%20products/sku%2F42");
        assert_eq!(request.method, HttpMethod::DELETE);
    }

    #[test]
    fn test_body_root_record() {
        let request = build(
            "records",
            "saveObject",
            ParameterSet::new().with("indexName_string", "products").with("record_json", r#"{"name":"phone","price":499}"#),
        )
        .unwrap();

        assert_eq!(request.path, "/1/indexes/products");
        assert_eq!(request.body, Some(json!({"name": "phone", "price": 499})));
    }

    #[test]
    fn test_query_placement_and_booleans() {
        let request = build(
            "records",
            "partialUpdateObject",
            ParameterSet::new()
                .with("indexName_string", "products")
                .with("objectID_string", "1")
                .with("attributesToUpdate_json", r#"{"stock":{"_operation":"Decrement","value":1}}"#)
                .with("createIfNotExists_boolean", false),
        )
        .unwrap();

        assert_eq!(request.path, "/1/indexes/products/1/partial");
        assert_eq!(request.query.get("createIfNotExists").map(String::as_str), Some("false"));
        assert_eq!(request.body, Some(json!({"stock": {"_operation": "Decrement", "value": 1}})));
    }

    #[test]
    fn test_header_placement() {
        let request = build(
            "clusters",
            "assignUserId",
            ParameterSet::new().with("userID_string", "user-42").with("cluster_string", "c1-test"),
        )
        .unwrap();

        assert_eq!(request.path, "/1/clusters/mapping");
        assert_eq!(request.headers.get("X-Algolia-User-ID").map(String::as_str), Some("user-42"));
        assert_eq!(request.body, Some(json!({"cluster": "c1-test"})));
    }

    #[test]
    fn test_save_rule_object_id_binds_body_and_path() {
        let request = build(
            "rules",
            "saveRule",
            ParameterSet::new()
                .with("indexName_string", "products")
                .with("objectID_string", "promo-1")
                .with("consequence_json", r#"{"promote":[{"objectID":"1","position":0}]}"#),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::PUT);
        assert_eq!(request.path, "/1/indexes/products/rules/promo-1");
        assert_eq!(
            request.body,
            Some(json!({"objectID": "promo-1", "consequence": {"promote": [{"objectID": "1", "position": 0}]}}))
        );
    }

    #[test]
    fn test_save_synonym_fields_follow_type() {
        let request = build(
            "synonyms",
            "saveSynonym",
            ParameterSet::new()
                .with("indexName_string", "products")
                .with("objectID_string", "syn-1")
                .with("type_options", "onewaysynonym")
                .with("input_string", "phone")
                .with("synonyms_json", r#"["smartphone","mobile"]"#)
                .with("word_string", "ignored because hidden"),
        )
        .unwrap();

        assert_eq!(request.path, "/1/indexes/products/synonyms/syn-1");
        assert_eq!(
            request.body,
            Some(json!({"objectID": "syn-1", "type": "onewaysynonym", "synonyms": ["smartphone", "mobile"], "input": "phone"}))
        );
    }

    #[test]
    fn test_save_synonym_type_defaults_to_synonym() {
        let request = build(
            "synonyms",
            "saveSynonym",
            ParameterSet::new().with("indexName_string", "products").with("objectID_string", "syn-1").with("synonyms_json", r#"["tv","television"]"#),
        )
        .unwrap();

        assert_eq!(request.body, Some(json!({"objectID": "syn-1", "type": "synonym", "synonyms": ["tv", "television"]})));
    }

    #[test]
    fn test_required_field_shown_by_sibling_is_checked() {
        // `word_string` is required only for alternative corrections
        let err = build(
            "synonyms",
            "saveSynonym",
            ParameterSet::new().with("indexName_string", "products").with("objectID_string", "syn-1").with("type_options", "altcorrection1"),
        )
        .unwrap_err();
        assert_eq!(err, AlgoliaError::MissingParameter("word_string".to_string()));
    }

    #[test]
    fn test_collection_child_condition_on_operation() {
        let params = ParameterSet::new().with("indexName_string", "products").with("additionalProperties", json!({"cursor_string": "abc"}));

        let browse = build("search", "browse", params.clone()).unwrap();
        assert_eq!(browse.body, Some(json!({"cursor": "abc"})));

        let query = build("search", "searchSingleIndex", params).unwrap();
        assert_eq!(query.body, Some(json!({})));
    }

    #[test]
    fn test_resolve_reports_field_paths() {
        let builder = RequestBuilder::builtin().unwrap();
        let resolved = builder
            .resolve(
                "search",
                "searchSingleIndex",
                &ParameterSet::new().with("indexName_string", "products").with("additionalProperties", json!({"query_string": "phone"})),
            )
            .unwrap();

        let paths: Vec<&str> = resolved.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["indexName_string", "additionalProperties.query_string"]);
    }

    #[test]
    fn test_insert_body_key_nests_dotted_keys() {
        let mut body = Map::new();
        insert_body_key(&mut body, "consequence.params.query", json!("phone")).unwrap();
        insert_body_key(&mut body, "consequence.filterPromotes", json!(true)).unwrap();
        assert_eq!(Value::Object(body), json!({"consequence": {"params": {"query": "phone"}, "filterPromotes": true}}));

        let mut body = Map::new();
        insert_body_key(&mut body, "params", json!("text")).unwrap();
        assert!(insert_body_key(&mut body, "params.query", json!("phone")).is_err());
    }

    #[test]
    fn test_declared_body_root_drops_keyed_fields() {
        let operation: OperationSpec = serde_json::from_value(json!({"name": "importObjects", "display_name": "Import", "method": "POST", "path": "/1/import"})).unwrap();
        let raw: FieldSpec = serde_json::from_value(json!({"name": "raw_json", "display_name": "Raw", "kind": "json", "placement": {"in": "body_root"}})).unwrap();
        let requests: FieldSpec = serde_json::from_value(json!({"name": "requests_json", "display_name": "Requests", "kind": "json", "placement": {"in": "body", "key": "requests"}})).unwrap();
        let index: FieldSpec = serde_json::from_value(json!({"name": "indexName_string", "display_name": "Index", "kind": "string", "placement": {"in": "query", "key": "indexName"}})).unwrap();

        let resolved = || {
            vec![
                ResolvedField { path: "requests_json".to_string(), spec: &requests, value: json!([2]) },
                ResolvedField { path: "indexName_string".to_string(), spec: &index, value: json!("products") },
            ]
        };

        // declared root left unset, keyed fields are dropped anyway
        let kept = apply_body_root_precedence(&operation, &[&raw, &requests, &index], resolved());
        let paths: Vec<&str> = kept.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["indexName_string"]);
        assert_eq!(assemble(&operation, &kept).unwrap().body, Some(json!({})));

        let kept = apply_body_root_precedence(&operation, &[&requests, &index], resolved());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_query_text() {
        assert_eq!(query_text(&json!(["name", "price"])), "name,price");
        assert_eq!(query_text(&json!(["a", "b", 3])), r#"["a","b",3]"#);
        assert_eq!(query_text(&json!(["a,b"])), r#"["a,b"]"#);
        assert_eq!(query_text(&json!([])), "[]");
        assert_eq!(query_text(&json!(["", "a"])), r#"["","a"]"#);
        assert_eq!(query_text(&json!(["[x"])), r#"["[x"]"#);
        assert_eq!(query_text(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(query_text(&json!(true)), "true");
    }
}
