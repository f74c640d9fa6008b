//! Typed view over the parts of an `OpenAPI` document the compiler consumes.
//!
//! Path items are kept as raw JSON so one malformed entry cannot fail the whole document; the
//! collector deserializes them one at a time. Key order is preserved (`serde_json` is built
//! with `preserve_order`), which is what makes tool order follow declaration order.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub info: Option<Info>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub servers: Vec<Server>,
    /// Path string → raw path item.
    #[serde(default)]
    pub paths: Map<String, Value>,
    /// Top-level shared parameter dictionary (`#/parameters/<name>`).
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    /// Shared parameter dictionary (`#/components/parameters/<name>`).
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: Map<String, Value>,
}

/// Read a field, falling back to its default when it has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring malformed document field");
        T::default()
    }))
}

/// Read a list element by element, dropping entries that do not parse.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        tracing::debug!("ignoring document list that is not an array");
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed list entry");
                None
            }
        })
        .collect())
}

impl OpenApiDocument {
    /// Build a document from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the top level is not an object or `paths` is not an object. Other
    /// malformed sections are treated as absent.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.info.as_ref().and_then(|i| i.title.as_deref())
    }

    /// URL of the first declared server, if any.
    #[must_use]
    pub fn default_server_url(&self) -> Option<&str> {
        self.servers.first().map(|s| s.url.as_str())
    }

    #[must_use]
    pub fn component_parameters(&self) -> Option<&Map<String, Value>> {
        self.components.as_ref().map(|c| &c.parameters)
    }
}

/// One HTTP method on one path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Malformed entries are dropped one by one.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: Option<bool>,
    /// Media type → media type object.
    #[serde(default)]
    pub content: Map<String, Value>,
}

/// Flattened view of a JSON request body: its top-level properties and required names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodySchema {
    pub properties: Vec<(String, SchemaFragment)>,
    pub required: Vec<String>,
}

impl BodySchema {
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}

impl Operation {
    /// Object properties of the JSON request body, if the operation declares any.
    ///
    /// `application/json` wins; otherwise the first media type mentioning `json` is used.
    /// Schema-level `$ref`s are not followed.
    #[must_use]
    pub fn body_schema(&self) -> Option<BodySchema> {
        let body = self.request_body.as_ref()?;
        let media = body.content.get("application/json").or_else(|| {
            body.content
                .iter()
                .find(|(k, _)| k.to_ascii_lowercase().contains("json"))
                .map(|(_, v)| v)
        })?;
        let schema = media.get("schema")?.as_object()?;
        let properties = schema.get("properties")?.as_object()?;

        let properties = properties
            .iter()
            .map(|(name, raw)| (name.clone(), SchemaFragment::from_value(raw)))
            .collect();
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(BodySchema {
            properties,
            required,
        })
    }
}

/// A parameter as written in the document: either concrete or a `$ref` pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterDef {
    Concrete(ConcreteParameter),
    Reference {
        pointer: String,
        /// Sibling fields declared next to `$ref`; they win over the target's fields.
        overrides: Map<String, Value>,
    },
}

impl ParameterDef {
    /// Interpret a raw JSON parameter object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a `$ref` object nor a well-formed parameter.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(de::Error::custom("parameter must be an object"));
        };
        if let Some(pointer) = obj.get("$ref").and_then(Value::as_str) {
            let mut overrides = obj.clone();
            overrides.remove("$ref");
            return Ok(ParameterDef::Reference {
                pointer: pointer.to_string(),
                overrides,
            });
        }
        Ok(ParameterDef::Concrete(serde_json::from_value(value.clone())?))
    }
}

impl<'de> Deserialize<'de> for ParameterDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ParameterDef::from_value(&value).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConcreteParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub schema: Option<SchemaFragment>,
}

impl ConcreteParameter {
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Cookie,
    /// Swagger 2 `body`/`formData` and anything else; never becomes a tool argument.
    #[serde(other)]
    Other,
}

impl ParamLocation {
    /// Query and path parameters are the only ones exposed as tool arguments.
    #[must_use]
    pub fn is_argument(self) -> bool {
        matches!(self, ParamLocation::Query | ParamLocation::Path)
    }
}

/// The few schema facts the compiler uses: type tag, string enumeration, description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFragment {
    pub kind: PrimitiveType,
    pub enumeration: Vec<String>,
    pub description: Option<String>,
}

impl SchemaFragment {
    /// Lenient read: unknown shapes degrade to an untyped fragment instead of failing.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let kind = obj
            .get("type")
            .map(PrimitiveType::from_type_value)
            .unwrap_or_default();
        let enumeration = obj
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            kind,
            enumeration,
            description,
        }
    }
}

impl<'de> Deserialize<'de> for SchemaFragment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(SchemaFragment::from_value(&value))
    }
}

/// Recognized `type` tags. Everything else is `Unknown` and is treated as a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    #[default]
    Unknown,
}

impl PrimitiveType {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "string" => PrimitiveType::String,
            "integer" => PrimitiveType::Integer,
            "number" => PrimitiveType::Number,
            "boolean" => PrimitiveType::Boolean,
            "array" => PrimitiveType::Array,
            "object" => PrimitiveType::Object,
            _ => PrimitiveType::Unknown,
        }
    }

    /// Accepts both `"type": "integer"` and the 3.1 form `"type": ["integer", "null"]`.
    fn from_type_value(value: &Value) -> Self {
        match value {
            Value::String(tag) => Self::from_tag(tag),
            Value::Array(tags) => tags
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map_or(PrimitiveType::Unknown, Self::from_tag),
            _ => PrimitiveType::Unknown,
        }
    }
}
