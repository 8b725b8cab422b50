//! YAML parser for report definitions
//!
//! Supports both built-in reports (by name) and custom YAML files (by path).

use super::builtin;
use super::types::{ApiKind, ReportDefinition};
use crate::error::{Error, Result};
use crate::pagination::Direction;
use crate::template::extract_variables;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a report definition from a built-in name or a file path
///
/// Names without path separators or a YAML extension are looked up among
/// the built-in reports first.
pub fn load_report(name_or_path: impl AsRef<Path>) -> Result<ReportDefinition> {
    let path = name_or_path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = builtin::get_builtin(&path_str) {
            return load_report_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Report '{}' not found. Built-in reports: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read report file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_report_from_str(&content)
}

/// Load a report definition from a YAML string
pub fn load_report_from_str(yaml: &str) -> Result<ReportDefinition> {
    let def: ReportDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse report YAML: {e}")))?;

    validate_report(&def)?;
    Ok(def)
}

/// Validate a report definition
pub fn validate_report(def: &ReportDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Report name cannot be empty"));
    }

    def.pagination_config(None, None)
        .validate()
        .map_err(|e| Error::config(format!("Report '{}': {e}", def.name)))?;

    match def.api {
        ApiKind::Graphql => validate_graphql(def)?,
        ApiKind::Rest => validate_rest(def)?,
    }

    validate_item_fields(def)
}

fn validate_graphql(def: &ReportDefinition) -> Result<()> {
    let query = def.query.as_deref().unwrap_or_default();
    if query.trim().is_empty() {
        return Err(Error::config(format!(
            "Report '{}' uses the GraphQL API but has no query",
            def.name
        )));
    }

    let connection = def.connection.as_deref().unwrap_or_default();
    if connection.trim().is_empty() {
        return Err(Error::config(format!(
            "Report '{}' uses the GraphQL API but has no connection path",
            def.name
        )));
    }

    if connection.split('.').any(str::is_empty) {
        return Err(Error::config(format!(
            "Report '{}' has an invalid connection path: {connection}",
            def.name
        )));
    }

    Ok(())
}

fn validate_rest(def: &ReportDefinition) -> Result<()> {
    let path = def.path.as_deref().unwrap_or_default();
    if path.trim().is_empty() {
        return Err(Error::config(format!(
            "Report '{}' uses the REST API but has no path",
            def.name
        )));
    }

    if def.pagination.direction == Direction::Backward {
        return Err(Error::config(format!(
            "Report '{}': Link header pagination only walks forward",
            def.name
        )));
    }

    if !def.pagination.paged {
        return Err(Error::config(format!(
            "Report '{}': single-shot queries are only supported for the GraphQL API",
            def.name
        )));
    }

    Ok(())
}

/// Every template string a definition carries
fn templates(def: &ReportDefinition) -> Vec<String> {
    let mut out = Vec::new();
    collect_strings(&Value::Object(def.variables.clone()), &mut out);
    out.extend(def.path.iter().cloned());
    out.extend(def.params.values().cloned());
    out
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Check `{{ item.* }}` references against the item kind's fields
fn validate_item_fields(def: &ReportDefinition) -> Result<()> {
    let fields = def.item_kind.template_fields();

    for template in templates(def) {
        for var in extract_variables(&template) {
            let (root, rest) = var.split_once('.').unwrap_or((var.as_str(), ""));
            match root {
                "item" if fields.contains(&rest) => {}
                "item" => {
                    return Err(Error::config(format!(
                        "Report '{}' references {{{{ {var} }}}} but {} items only have: {}",
                        def.name,
                        def.item_kind,
                        fields.join(", ")
                    )));
                }
                "vars" => {}
                _ => {
                    return Err(Error::config(format!(
                        "Report '{}' references unknown template root in {{{{ {var} }}}}",
                        def.name
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Check that every `{{ vars.* }}` reference resolves in `vars`
pub fn check_vars(def: &ReportDefinition, vars: &Value) -> Result<()> {
    let missing: Vec<String> = templates(def)
        .iter()
        .flat_map(|t| extract_variables(t))
        .filter_map(|var| var.strip_prefix("vars.").map(String::from))
        .filter(|name| vars.get(name).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Report '{}' needs --var for: {}",
            def.name,
            missing.join(", ")
        )))
    }
}
