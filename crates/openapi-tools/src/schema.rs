//! Input schema synthesis and runtime argument validation.
//!
//! Every tool gets a flat object schema: resolved query/path parameters first, then request-body
//! properties whose names are not already taken by a parameter. The schema is rendered as JSON
//! Schema for protocol descriptors and also checks call arguments before any request is made.

use crate::document::{BodySchema, ConcreteParameter, PrimitiveType, SchemaFragment};
use crate::markdown::normalize_description;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use thiserror::Error;

/// Closed set of argument kinds a field can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    /// One of a fixed set of strings.
    Enum(Vec<String>),
}

impl FieldKind {
    /// A non-empty string enumeration wins over the type tag; unknown tags fall back to string.
    #[must_use]
    pub fn from_fragment(fragment: Option<&SchemaFragment>) -> Self {
        let Some(fragment) = fragment else {
            return FieldKind::String;
        };
        if !fragment.enumeration.is_empty() {
            return FieldKind::Enum(fragment.enumeration.clone());
        }
        match fragment.kind {
            PrimitiveType::Integer | PrimitiveType::Number => FieldKind::Number,
            PrimitiveType::Boolean => FieldKind::Boolean,
            PrimitiveType::Array => FieldKind::Array,
            PrimitiveType::String | PrimitiveType::Object | PrimitiveType::Unknown => {
                FieldKind::String
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum(_) => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::String, Value::String(_))
            | (FieldKind::Number, Value::Number(_))
            | (FieldKind::Boolean, Value::Bool(_))
            | (FieldKind::Array, Value::Array(_)) => true,
            (FieldKind::Enum(allowed), Value::String(s)) => allowed.iter().any(|a| a == s),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
}

impl SchemaField {
    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.kind.type_name()));
        match &self.kind {
            FieldKind::Enum(values) => {
                prop.insert("enum".to_string(), json!(values));
            }
            FieldKind::Array => {
                prop.insert("items".to_string(), json!({}));
            }
            _ => {}
        }
        if let Some(d) = &self.description {
            prop.insert("description".to_string(), json!(d));
        }
        Value::Object(prop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("'{0}' is required")]
    Missing(String),
    #[error("'{field}' must be of type {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
    },
    #[error("'{field}' must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// All violations found in one argument object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<SchemaField>,
}

impl InputSchema {
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON Schema object: `{"type":"object","properties":{..},"required":[..]}`.
    #[must_use]
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        schema
    }

    /// Check call arguments. Optional fields may be absent or `null`; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in field order.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), SchemaViolations> {
        let mut violations = Vec::new();
        for field in &self.fields {
            match args.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        violations.push(SchemaViolation::Missing(field.name.clone()));
                    }
                }
                Some(value) if field.kind.accepts(value) => {}
                Some(_) => violations.push(match &field.kind {
                    FieldKind::Enum(allowed) => SchemaViolation::NotAllowed {
                        field: field.name.clone(),
                        allowed: allowed.clone(),
                    },
                    kind => SchemaViolation::WrongKind {
                        field: field.name.clone(),
                        expected: kind.type_name(),
                    },
                }),
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolations(violations))
        }
    }
}

/// Build the input schema for one operation.
///
/// `params` must already be resolved and merged; only query and path parameters become fields.
#[must_use]
pub fn synthesize(
    params: &[ConcreteParameter],
    body: Option<&BodySchema>,
    html_to_markdown: bool,
) -> InputSchema {
    let describe = |text: Option<&String>| -> Option<String> {
        text.map(|t| normalize_description(t, html_to_markdown))
    };

    let mut fields = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for p in params.iter().filter(|p| p.location.is_argument()) {
        if !claimed.insert(p.name.as_str()) {
            // Same name in query and path; the first declaration keeps the field.
            continue;
        }
        fields.push(SchemaField {
            name: p.name.clone(),
            kind: FieldKind::from_fragment(p.schema.as_ref()),
            required: p.is_required(),
            description: describe(
                p.description
                    .as_ref()
                    .or_else(|| p.schema.as_ref().and_then(|s| s.description.as_ref())),
            ),
        });
    }

    if let Some(body) = body {
        for (name, fragment) in &body.properties {
            if !claimed.insert(name.as_str()) {
                continue;
            }
            fields.push(SchemaField {
                name: name.clone(),
                kind: FieldKind::from_fragment(Some(fragment)),
                required: body.is_required(name),
                description: describe(fragment.description.as_ref()),
            });
        }
    }

    InputSchema { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Operation;

    fn param(value: Value) -> ConcreteParameter {
        serde_json::from_value(value).unwrap()
    }

    fn body(value: Value) -> BodySchema {
        let op: Operation = serde_json::from_value(json!({
            "requestBody": { "content": { "application/json": { "schema": value } } }
        }))
        .unwrap();
        op.body_schema().unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn type_mapping() {
        let frag = |v: Value| SchemaFragment::from_value(&v);
        assert_eq!(
            FieldKind::from_fragment(Some(&frag(json!({"type": "integer"})))),
            FieldKind::Number
        );
        assert_eq!(
            FieldKind::from_fragment(Some(&frag(json!({"type": "boolean"})))),
            FieldKind::Boolean
        );
        assert_eq!(
            FieldKind::from_fragment(Some(&frag(json!({"type": "array"})))),
            FieldKind::Array
        );
        assert_eq!(
            FieldKind::from_fragment(Some(&frag(json!({"type": "object"})))),
            FieldKind::String
        );
        assert_eq!(FieldKind::from_fragment(None), FieldKind::String);
        assert_eq!(
            FieldKind::from_fragment(Some(&frag(json!({"type": "integer", "enum": ["a"]})))),
            FieldKind::Enum(vec!["a".to_string()])
        );
    }

    #[test]
    fn parameters_first_then_unclaimed_body_properties() {
        let params = vec![
            param(json!({"name": "chat_id", "in": "path", "required": true})),
            param(json!({"name": "X-Trace", "in": "header"})),
            param(json!({"name": "limit", "in": "query", "schema": {"type": "integer"}})),
        ];
        let b = body(json!({
            "required": ["text", "chat_id"],
            "properties": {
                "text": { "type": "string" },
                "chat_id": { "type": "integer" },
                "silent": { "type": "boolean" }
            }
        }));
        let schema = synthesize(&params, Some(&b), true);
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["chat_id", "limit", "text", "silent"]);
        assert_eq!(schema.field("chat_id").unwrap().kind, FieldKind::String);
        assert!(schema.field("text").unwrap().required);
        assert!(!schema.field("silent").unwrap().required);
    }

    #[test]
    fn required_rejects_absence_and_optional_accepts_it() {
        let params = vec![
            param(json!({"name": "id", "in": "query", "required": true})),
            param(json!({"name": "page", "in": "query", "schema": {"type": "number"}})),
        ];
        let schema = synthesize(&params, None, true);

        let err = schema.validate(&args(json!({}))).unwrap_err();
        assert_eq!(err.0, vec![SchemaViolation::Missing("id".to_string())]);
        assert!(schema.validate(&args(json!({"id": null}))).is_err());
        assert!(schema.validate(&args(json!({"id": "7"}))).is_ok());
        assert!(schema.validate(&args(json!({"id": "7", "page": null}))).is_ok());
    }

    #[test]
    fn validate_checks_kinds_and_enums() {
        let params = vec![
            param(json!({"name": "n", "in": "query", "schema": {"type": "integer"}})),
            param(json!({"name": "s", "in": "query", "schema": {"enum": ["open", "closed"]}})),
        ];
        let schema = synthesize(&params, None, false);

        let err = schema
            .validate(&args(json!({"n": "1", "s": "pending", "extra": true})))
            .unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert_eq!(
            err.to_string(),
            "'n' must be of type number; 's' must be one of: open, closed"
        );
        assert!(schema.validate(&args(json!({"n": 1.5, "s": "open"}))).is_ok());
    }

    #[test]
    fn json_schema_rendering() {
        let params = vec![
            param(json!({"name": "tags", "in": "query", "required": true, "schema": {"type": "array"}})),
            param(json!({"name": "s", "in": "query", "description": "<b>State</b>", "schema": {"enum": ["a"]}})),
        ];
        let schema = synthesize(&params, None, true).to_json_schema();
        assert_eq!(
            Value::Object(schema),
            json!({
                "type": "object",
                "properties": {
                    "tags": { "type": "array", "items": {} },
                    "s": { "type": "string", "enum": ["a"], "description": "**State**" }
                },
                "required": ["tags"]
            })
        );
    }

    #[test]
    fn html_conversion_can_be_disabled() {
        let params = vec![param(
            json!({"name": "q", "in": "query", "description": "<i>raw</i>"}),
        )];
        let schema = synthesize(&params, None, false);
        assert_eq!(
            schema.field("q").unwrap().description.as_deref(),
            Some("<i>raw</i>")
        );
    }
}
