//! Response shape normalization.
//!
//! The backend answers list endpoints in three shapes:
//! - a bare array: `[...]`
//! - an envelope: `{status, data: [...], pagination?}`
//! - a nested envelope: `{status, data: {data: [...], pagination}}`
//!
//! and detail endpoints as `{status, data: {...}}` or the bare object.
//! An envelope whose `data` is not an object, and a record without an id,
//! are loud `Validation` failures like any other unknown shape.

use alms_core::Pagination;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::classify;
use crate::error::ErrorRecord;

/// One page of normalized list results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListShape {
    Bare(Vec<Value>),
    Wrapped {
        data: Vec<Value>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Nested {
        data: NestedList,
    },
}

#[derive(Deserialize)]
struct NestedList {
    data: Vec<Value>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailShape {
    Wrapped { data: Map<String, Value> },
    Bare(Map<String, Value>),
}

/// Normalize a list payload of `entity` records.
///
/// # Errors
///
/// Returns a `Validation` [`ErrorRecord`] if the payload matches none of the
/// known shapes or an item does not deserialize.
pub fn list<T: DeserializeOwned>(payload: Value, entity: &str) -> Result<Page<T>, ErrorRecord> {
    let shape: ListShape = serde_json::from_value(payload)
        .map_err(|_| classify::invalid_payload(format!("Unrecognized {entity} response shape")))?;

    let (raw, pagination) = match shape {
        ListShape::Bare(items) => (items, None),
        ListShape::Wrapped { data, pagination } => (data, pagination),
        ListShape::Nested { data } => (data.data, data.pagination),
    };

    let items = raw
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| classify::invalid_payload(format!("Invalid {entity} record: {e}")))
        })
        .collect::<Result<Vec<T>, _>>()?;

    let pagination = pagination.unwrap_or_else(|| Pagination::single_page(items.len()));
    Ok(Page { items, pagination })
}

/// Envelope `status` values; a bare record never carries these.
const ENVELOPE_STATUSES: [&str; 3] = ["success", "error", "fail"];

/// Normalize a single-record payload. The record must carry a non-empty
/// `_id` (or `id`).
///
/// # Errors
///
/// Returns a `Validation` [`ErrorRecord`] if the payload is not a known detail
/// shape, the record has no id, or it does not deserialize as `T`.
pub fn one<T: DeserializeOwned>(payload: Value, entity: &str) -> Result<T, ErrorRecord> {
    let object = detail(payload, entity)?;
    if !has_identity(&object) {
        return Err(classify::invalid_payload(format!("Invalid {entity} record: missing id")));
    }
    decode(object, entity)
}

/// Normalize a single id-less object (aggregates such as dashboard counters).
///
/// # Errors
///
/// Returns a `Validation` [`ErrorRecord`] if the payload is not a known detail
/// shape or does not deserialize as `T`.
pub fn summary<T: DeserializeOwned>(payload: Value, entity: &str) -> Result<T, ErrorRecord> {
    decode(detail(payload, entity)?, entity)
}

fn detail(payload: Value, entity: &str) -> Result<Map<String, Value>, ErrorRecord> {
    let unrecognized = || classify::invalid_payload(format!("Unrecognized {entity} response shape"));
    match serde_json::from_value(payload).map_err(|_| unrecognized())? {
        DetailShape::Wrapped { data } => Ok(data),
        DetailShape::Bare(object) if !is_envelope(&object) => Ok(object),
        DetailShape::Bare(_) => Err(unrecognized()),
    }
}

fn decode<T: DeserializeOwned>(object: Map<String, Value>, entity: &str) -> Result<T, ErrorRecord> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| classify::invalid_payload(format!("Invalid {entity} record: {e}")))
}

/// An object left over after `Wrapped` failed to match: its `data` is missing
/// or not an object, or its `status` is an envelope status.
fn is_envelope(object: &Map<String, Value>) -> bool {
    object.contains_key("data")
        || object
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| ENVELOPE_STATUSES.contains(&status))
}

fn has_identity(object: &Map<String, Value>) -> bool {
    ["_id", "id"].iter().any(|key| {
        object
            .get(*key)
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty())
    })
}

/// Look up `key` in the envelope's `data`, falling back to the top level.
#[must_use]
pub fn lookup<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload
        .get("data")
        .and_then(|data| data.get(key))
        .or_else(|| payload.get(key))
        .filter(|value| !value.is_null())
}

/// Whether a 2xx payload is an envelope reporting failure.
#[must_use]
pub fn is_error_envelope(payload: &Value) -> bool {
    payload.get("status").and_then(Value::as_str) == Some("error")
}
