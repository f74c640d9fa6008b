//! Defensive text encoding of backend responses.
//!
//! [`normalize_response`] turns any [`Payload`] into one JSON text and never fails: values JSON
//! cannot express become placeholders, shared nodes seen twice in one walk become
//! `"[Circular]"`, and if encoding still breaks a small diagnostic object is emitted instead.

use parking_lot::RwLock;
use serde_json::{Map, Number, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub const FUNCTION_PLACEHOLDER: &str = "[Function]";
pub const SYMBOL_PLACEHOLDER: &str = "[Symbol]";
pub const CIRCULAR_PLACEHOLDER: &str = "[Circular]";
pub const SERIALIZATION_ERROR: &str = "[Serialization Error]";

const MAX_DEPTH: usize = 256;
const LAST_RESORT: &str = r#"{"error":"[Serialization Error]"}"#;

pub type ArrayNode = Arc<RwLock<Vec<Payload>>>;
pub type ObjectNode = Arc<RwLock<Vec<(String, Payload)>>>;

/// A backend value, including kinds plain JSON cannot carry.
///
/// Arrays and objects are shared, lockable nodes so that graphs (and cycles) can be expressed.
#[derive(Debug, Clone)]
pub enum Payload {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    /// Integer beyond the 64-bit range, as decimal digits.
    BigInt(String),
    String(String),
    /// Callable value, optionally named.
    Function(Option<String>),
    /// Opaque symbol, optionally described.
    Symbol(Option<String>),
    Array(ArrayNode),
    Object(ObjectNode),
}

impl Payload {
    #[must_use]
    pub fn array(items: Vec<Payload>) -> Self {
        Payload::Array(Arc::new(RwLock::new(items)))
    }

    #[must_use]
    pub fn object(entries: Vec<(String, Payload)>) -> Self {
        Payload::Object(Arc::new(RwLock::new(entries)))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Null,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) if is_big_integer(&n) => Payload::BigInt(n.to_string()),
            Value::Number(n) => Payload::Number(n),
            Value::String(s) => Payload::String(s),
            Value::Array(items) => Payload::array(items.into_iter().map(Payload::from).collect()),
            Value::Object(map) => Payload::object(
                map.into_iter()
                    .map(|(k, v)| (k, Payload::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Integer literal outside the 64-bit range (kept verbatim by `arbitrary_precision`).
fn is_big_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return false;
    }
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Error)]
enum NormalizeError {
    #[error("nesting deeper than 256 levels")]
    TooDeep,
    #[error("value is locked by a writer")]
    Locked,
    #[error("{0}")]
    Encode(#[from] serde_json::Error),
}

/// Encode `payload` as one JSON text. Never panics.
#[must_use]
pub fn normalize_response(payload: &Payload) -> String {
    let mut visited = HashSet::new();
    let encoded = to_json(payload, &mut visited, 0)
        .and_then(|value| serde_json::to_string(&value).map_err(NormalizeError::from));
    match encoded {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "response normalization fell back to error object");
            serde_json::to_string(&json!({
                "error": SERIALIZATION_ERROR,
                "message": e.to_string(),
            }))
            .unwrap_or_else(|_| LAST_RESORT.to_string())
        }
    }
}

fn node_id<T>(node: &Arc<T>) -> usize {
    Arc::as_ptr(node).cast::<()>() as usize
}

fn to_json(
    payload: &Payload,
    visited: &mut HashSet<usize>,
    depth: usize,
) -> Result<Value, NormalizeError> {
    if depth > MAX_DEPTH {
        return Err(NormalizeError::TooDeep);
    }
    let value = match payload {
        Payload::Undefined | Payload::Null => Value::Null,
        Payload::Bool(b) => Value::Bool(*b),
        Payload::Number(n) => Value::Number(n.clone()),
        Payload::BigInt(digits) => Value::String(digits.clone()),
        Payload::String(s) => Value::String(s.clone()),
        Payload::Function(_) => json!(FUNCTION_PLACEHOLDER),
        Payload::Symbol(_) => json!(SYMBOL_PLACEHOLDER),
        Payload::Array(node) => {
            if !visited.insert(node_id(node)) {
                return Ok(json!(CIRCULAR_PLACEHOLDER));
            }
            let items = node.try_read().ok_or(NormalizeError::Locked)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(to_json(item, visited, depth + 1)?);
            }
            Value::Array(out)
        }
        Payload::Object(node) => {
            if !visited.insert(node_id(node)) {
                return Ok(json!(CIRCULAR_PLACEHOLDER));
            }
            let entries = node.try_read().ok_or(NormalizeError::Locked)?;
            let mut out = Map::with_capacity(entries.len());
            for (key, item) in entries.iter() {
                out.insert(key.clone(), to_json(item, visited, depth + 1)?);
            }
            Value::Object(out)
        }
    };
    Ok(value)
}
