//! Parameter `$ref` resolution.
//!
//! Only pointers into the document's shared parameter dictionaries are followed:
//! - `#/parameters/<name>`
//! - `#/components/parameters/<name>`
//!
//! Anything else (external files, URLs, other fragments) is unresolvable and the parameter is
//! dropped. Sibling fields next to a `$ref` override the target's fields. Resolution is eager:
//! everything downstream works on [`ConcreteParameter`] only.

use crate::document::{ConcreteParameter, OpenApiDocument, ParamLocation, ParameterDef};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const TOP_LEVEL_PREFIX: &str = "#/parameters/";
const COMPONENTS_PREFIX: &str = "#/components/parameters/";

/// Resolve one parameter. `None` means the reference target is missing or unusable.
#[must_use]
pub fn resolve_parameter(
    param: &ParameterDef,
    doc: &OpenApiDocument,
) -> Option<ConcreteParameter> {
    match param {
        ParameterDef::Concrete(p) => Some(p.clone()),
        ParameterDef::Reference { pointer, overrides } => {
            resolve_reference(pointer, overrides, doc)
        }
    }
}

/// Resolve path-item level and operation level parameters into one ordered list.
///
/// Path-item parameters come first; an operation parameter with the same (location, name)
/// replaces the path-item one in place. Unresolvable references are skipped.
#[must_use]
pub fn resolve_parameters(
    path_item_params: &[ParameterDef],
    operation_params: &[ParameterDef],
    doc: &OpenApiDocument,
) -> Vec<ConcreteParameter> {
    let mut merged: Vec<ConcreteParameter> = Vec::new();
    let mut index: HashMap<(ParamLocation, String), usize> = HashMap::new();

    for p in path_item_params.iter().chain(operation_params) {
        let Some(rp) = resolve_parameter(p, doc) else {
            tracing::debug!(parameter = ?p, "dropping unresolvable parameter reference");
            continue;
        };
        let key = (rp.location, rp.name.clone());
        if let Some(i) = index.get(&key).copied() {
            merged[i] = rp;
        } else {
            index.insert(key, merged.len());
            merged.push(rp);
        }
    }

    merged
}

fn resolve_reference(
    pointer: &str,
    overrides: &Map<String, Value>,
    doc: &OpenApiDocument,
) -> Option<ConcreteParameter> {
    // Override layers, outermost first.
    let mut layers: Vec<&Map<String, Value>> = vec![overrides];
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = pointer;

    let target = loop {
        if !seen.insert(current) {
            tracing::debug!(pointer, "cyclic parameter reference");
            return None;
        }
        let obj = shared_parameter(doc, current)?.as_object()?;
        match obj.get("$ref").and_then(Value::as_str) {
            Some(next) => {
                layers.push(obj);
                current = next;
            }
            None => break obj,
        }
    };

    let mut merged = target.clone();
    for layer in layers.iter().rev() {
        for (k, v) in *layer {
            if k != "$ref" {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    merged.remove("$ref");

    serde_json::from_value(Value::Object(merged)).ok()
}

/// Look up a pointer in the shared parameter dictionaries.
fn shared_parameter<'a>(doc: &'a OpenApiDocument, pointer: &str) -> Option<&'a Value> {
    if let Some(rest) = pointer.strip_prefix(COMPONENTS_PREFIX) {
        let name = unescape_pointer_token(rest)?;
        return doc.component_parameters()?.get(&name);
    }
    if let Some(rest) = pointer.strip_prefix(TOP_LEVEL_PREFIX) {
        let name = unescape_pointer_token(rest)?;
        return doc.parameters.get(&name);
    }
    None
}

/// Decode one JSON pointer token (`~1` → `/`, `~0` → `~`). A nested pointer is rejected.
fn unescape_pointer_token(token: &str) -> Option<String> {
    if token.is_empty() || token.contains('/') {
        return None;
    }
    Some(token.replace("~1", "/").replace("~0", "~"))
}
