//! Operation catalog.
//!
//! Every resource is described by a JSON table embedded at build time:
//! its operations (method, path template, response reshaping) and the fields
//! a user fills in, with their placement in the outbound request. Tables are
//! parsed and checked once, then shared read-only for the process lifetime.

mod models;
pub mod visibility;

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::{AlgoliaError, Result, lookup::LookupSpec, request::path};

pub use models::*;
pub use visibility::{Condition, ConditionOperator, DisplayContext};

/// Name of the UI-only toggle enabling response reshaping.
pub const SIMPLIFY_FIELD: &str = "simplify";

const RESOURCE_SOURCES: [&str; 10] = [
    include_str!("data/search.json"),
    include_str!("data/records.json"),
    include_str!("data/indices.json"),
    include_str!("data/synonyms.json"),
    include_str!("data/rules.json"),
    include_str!("data/clusters.json"),
    include_str!("data/dictionaries.json"),
    include_str!("data/api_keys.json"),
    include_str!("data/vaults.json"),
    include_str!("data/advanced.json"),
];
const LOOKUP_SOURCE: &str = include_str!("data/lookups.json");

static BUILTIN: LazyLock<Result<Catalog>> = LazyLock::new(|| Catalog::from_sources(&RESOURCE_SOURCES, LOOKUP_SOURCE));

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    resources: Vec<ResourceSpec>,
    lookups: Vec<LookupSpec>,
}

/// What a form-rendering host needs to present one operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary<'a> {
    pub resource: &'a str,
    pub operation: &'a str,
    pub display_name: &'a str,
    pub description: &'a str,
    pub method: HttpMethod,
    pub path: &'a str,
    /// true when a field needs the lookup call before it can be rendered
    pub requires_lookup: bool,
    pub fields: Vec<&'a FieldSpec>,
}

impl Catalog {
    /// The embedded Algolia catalog, parsed on first use.
    pub fn builtin() -> Result<&'static Catalog> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    /// Parse resource tables and lookups, then check their consistency.
    pub fn from_sources(
        resources: &[&str],
        lookups: &str,
    ) -> Result<Self> {
        let resources = resources
            .iter()
            .map(|source| serde_json::from_str::<ResourceSpec>(source).map_err(|err| AlgoliaError::Catalog(format!("invalid resource table: {}", err))))
            .collect::<Result<Vec<_>>>()?;
        let lookups = serde_json::from_str::<Vec<LookupSpec>>(lookups).map_err(|err| AlgoliaError::Catalog(format!("invalid lookup table: {}", err)))?;

        let catalog = Self { resources, lookups };
        catalog.check()?;

        Ok(catalog)
    }

    pub fn resources(&self) -> &[ResourceSpec] {
        &self.resources
    }

    /// Find a resource by key or display name, ignoring case.
    pub fn resource(
        &self,
        name: &str,
    ) -> Option<&ResourceSpec> {
        self.resources.iter().find(|r| r.matches(name))
    }

    pub fn operation(
        &self,
        resource: &str,
        operation: &str,
    ) -> Result<(&ResourceSpec, &OperationSpec)> {
        self.resource(resource)
            .and_then(|r| r.operation(operation).map(|o| (r, o)))
            .ok_or_else(|| AlgoliaError::UnknownOperation {
                resource: resource.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Top-level fields of an operation, in form order.
    pub fn fields(
        &self,
        resource: &str,
        operation: &str,
    ) -> Result<Vec<&FieldSpec>> {
        let (resource, operation) = self.operation(resource, operation)?;
        Ok(resource.fields_for(&operation.name).collect())
    }

    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&LookupSpec> {
        self.lookups.iter().find(|l| l.name == name)
    }

    pub fn describe(
        &self,
        resource: &str,
        operation: &str,
    ) -> Result<OperationSummary<'_>> {
        let (resource, operation) = self.operation(resource, operation)?;
        Ok(summarize(resource, operation))
    }

    pub fn describe_all(&self) -> Vec<OperationSummary<'_>> {
        self.resources.iter().flat_map(|r| r.operations.iter().map(move |o| summarize(r, o))).collect()
    }

    fn check(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        let mut resource_names = HashSet::new();
        for resource in &self.resources {
            if !resource_names.insert(resource.name.as_str()) {
                errors.push(format!("duplicate resource '{}'", resource.name));
            }
            self.check_resource(resource, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AlgoliaError::Catalog(errors.join(", ")))
        }
    }

    fn check_resource(
        &self,
        resource: &ResourceSpec,
        errors: &mut Vec<String>,
    ) {
        let mut operation_names = HashSet::new();
        for operation in &resource.operations {
            if !operation_names.insert(operation.name.as_str()) {
                errors.push(format!("{}: duplicate operation '{}'", resource.name, operation.name));
            }
        }

        for field in &resource.fields {
            if field.operations.is_empty() {
                errors.push(format!("{}.{}: field applies to no operation", resource.name, field.name));
            }
            for name in &field.operations {
                if !operation_names.contains(name.as_str()) {
                    errors.push(format!("{}.{}: unknown operation '{}'", resource.name, field.name, name));
                }
            }
            self.check_field(&resource.name, field, false, errors);
        }

        for operation in &resource.operations {
            check_operation(resource, operation, errors);
        }
    }

    fn check_field(
        &self,
        scope: &str,
        field: &FieldSpec,
        nested: bool,
        errors: &mut Vec<String>,
    ) {
        let at = format!("{}.{}", scope, field.name);

        if field.name == visibility::RESOURCE_KEY || field.name == visibility::OPERATION_KEY {
            errors.push(format!("{}: reserved field name", at));
        }

        match field.kind {
            FieldKind::Options | FieldKind::MultiOptions if field.options.is_empty() => {
                errors.push(format!("{}: choice field without options", at));
            }
            FieldKind::Collection => {
                if field.fields.is_empty() {
                    errors.push(format!("{}: empty collection", at));
                }
                if field.placement.is_some() {
                    errors.push(format!("{}: a collection cannot be placed", at));
                }
                for child in &field.fields {
                    self.check_field(&at, child, true, errors);
                }
            }
            FieldKind::DynamicOptions => match &field.lookup {
                Some(name) if self.lookup(name).is_some() => {}
                Some(name) => errors.push(format!("{}: unknown lookup '{}'", at, name)),
                None => errors.push(format!("{}: dynamic choice without lookup", at)),
            },
            FieldKind::Json if !(field.default.is_null() || field.default.is_string()) => {
                errors.push(format!("{}: JSON default must be serialized text", at));
            }
            _ => {}
        }

        if nested {
            if !field.operations.is_empty() {
                errors.push(format!("{}: nested field cannot list operations", at));
            }
            if matches!(field.placement, Some(Placement::Path { .. })) {
                errors.push(format!("{}: nested field cannot be placed in the path", at));
            }
        }

        if let Some(validation) = &field.validation {
            if let Some(pattern) = &validation.pattern {
                if let Err(err) = Regex::new(pattern) {
                    errors.push(format!("{}: invalid pattern: {}", at, err));
                }
            }
            if let Some(schema) = &validation.schema {
                if let Err(err) = jsonschema::validator_for(schema) {
                    errors.push(format!("{}: invalid schema: {}", at, err));
                }
            }
        }
    }
}

fn summarize<'a>(
    resource: &'a ResourceSpec,
    operation: &'a OperationSpec,
) -> OperationSummary<'a> {
    let fields: Vec<&FieldSpec> = resource.fields_for(&operation.name).collect();
    OperationSummary {
        resource: &resource.name,
        operation: &operation.name,
        display_name: &operation.display_name,
        description: &operation.description,
        method: operation.method,
        path: &operation.path,
        requires_lookup: fields.iter().any(|f| f.uses_lookup()),
        fields,
    }
}

fn check_operation(
    resource: &ResourceSpec,
    operation: &OperationSpec,
    errors: &mut Vec<String>,
) {
    let at = format!("{}.{}", resource.name, operation.name);
    let fields: Vec<&FieldSpec> = resource.fields_for(&operation.name).collect();

    if !operation.path.starts_with('/') || !path::placeholders_are_segments(&operation.path) {
        errors.push(format!("{}: malformed path template '{}'", at, operation.path));
    }

    let placeholders = path::placeholders(&operation.path);
    for placeholder in &placeholders {
        let covered = fields.iter().any(|f| match &f.placement {
            Some(Placement::Path { key }) => key == placeholder,
            Some(Placement::Body { key }) => key == placeholder && f.required,
            _ => false,
        });
        if !covered {
            errors.push(format!("{}: no field fills '{{{}}}'", at, placeholder));
        }
    }

    for field in &fields {
        if let Some(Placement::Path { key }) = &field.placement {
            if !placeholders.contains(&key.as_str()) {
                errors.push(format!("{}.{}: path key '{}' not in template", at, field.name, key));
            }
        }
    }

    if operation.reshape.is_some() && !fields.iter().any(|f| f.name == SIMPLIFY_FIELD) {
        errors.push(format!("{}: reshaping declared without a '{}' field", at, SIMPLIFY_FIELD));
    }

    let mut placements = Vec::new();
    collect_placements(fields.iter().copied(), &mut placements);
    if placements.contains(&&Placement::BodyRoot) && placements.iter().any(|p| matches!(p, Placement::Body { .. })) {
        errors.push(format!("{}: body root field mixed with keyed body fields", at));
    }

    let mut names = HashSet::new();
    for field in fields.iter().filter(|f| f.conditions.is_empty()) {
        if !names.insert(field.name.as_str()) {
            errors.push(format!("{}: duplicate field '{}'", at, field.name));
        }
    }
}

/// True when a field, or a collection child, replaces the whole body.
pub(crate) fn declares_body_root<'f>(fields: impl IntoIterator<Item = &'f FieldSpec>) -> bool {
    let mut placements = Vec::new();
    collect_placements(fields, &mut placements);
    placements.contains(&&Placement::BodyRoot)
}

fn collect_placements<'f>(
    fields: impl IntoIterator<Item = &'f FieldSpec>,
    out: &mut Vec<&'f Placement>,
) {
    for field in fields {
        out.extend(field.placement.as_ref());
        collect_placements(&field.fields, out);
    }
}
