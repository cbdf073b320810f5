//! CLI Commands

use serde_json::{Map, Number, Value};
use stashline_core::{StashlineError, StashlineResult, StorageConfig, StorageKey, StorageType};
use stashline_state::{
    open_backends, MemoryBackend, SledBackend, StorageEnvironment, StoreHandle,
};
use std::sync::Arc;

/// State shape managed from the command line
pub type Document = Map<String, Value>;

/// Parse a JSON object given on the command line
pub fn parse_document(text: &str) -> StashlineResult<Document> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StashlineError::UsageError(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
        Err(e) => Err(StashlineError::UsageError(format!("invalid JSON: {}", e))),
    }
}

/// Shallow merge: fields in `patch` replace those in `prev`
pub fn merge(prev: &Document, patch: &Document) -> Document {
    let mut next = prev.clone();
    for (field, value) in patch {
        next.insert(field.clone(), value.clone());
    }
    next
}

/// Add `by` to a numeric field, treating a missing field as zero
pub fn increment(prev: &Document, field: &str, by: i64) -> Document {
    let mut next = prev.clone();
    let value = match prev.get(field) {
        None => Value::from(by),
        Some(current) => match current.as_i64() {
            Some(n) => Value::from(n.saturating_add(by)),
            None => {
                let base = current.as_f64().unwrap_or(0.0);
                Number::from_f64(base + by as f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        },
    };
    next.insert(field.to_string(), value);
    next
}

/// Fails when `field` holds something other than a number
pub fn ensure_numeric(doc: &Document, field: &str) -> StashlineResult<()> {
    match doc.get(field) {
        None | Some(Value::Number(_)) => Ok(()),
        Some(other) => Err(StashlineError::UsageError(format!(
            "field '{}' holds {}, not a number",
            field,
            kind_of(other)
        ))),
    }
}

pub fn apply_patch(store: &StoreHandle<Document>, text: &str) -> StashlineResult<()> {
    let patch = parse_document(text)?;
    store.update(move |prev| merge(prev, &patch));
    Ok(())
}

pub fn apply_increment(store: &StoreHandle<Document>, field: &str, by: i64) -> StashlineResult<()> {
    store.with_state(|doc| ensure_numeric(doc, field))?;
    let field = field.to_string();
    store.update(move |prev| increment(prev, &field, by));
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Concrete backends opened by the CLI, for operations outside the store contract
pub struct Backends {
    pub local: Arc<SledBackend>,
    pub session: Arc<MemoryBackend>,
}

impl Backends {
    pub fn open(config: &StorageConfig) -> StashlineResult<Self> {
        let (local, session) = open_backends(config)?;
        Ok(Self { local, session })
    }

    /// Environment sharing these backends, for building stores
    pub fn environment(&self) -> StorageEnvironment {
        StorageEnvironment::new(self.local.clone(), self.session.clone())
    }

    pub fn remove(&self, storage_type: StorageType, key: &StorageKey) -> StashlineResult<()> {
        match storage_type {
            StorageType::Local => self.local.remove(key),
            StorageType::Session => Err(session_only("remove")),
        }
    }

    pub fn keys(&self, storage_type: StorageType) -> StashlineResult<Vec<StorageKey>> {
        match storage_type {
            StorageType::Local => self.local.keys(),
            StorageType::Session => Err(session_only("keys")),
        }
    }
}

// sessionStorage starts empty on every run, so these would never find anything
fn session_only(command: &str) -> StashlineError {
    StashlineError::UsageError(format!(
        "'{}' needs localStorage, sessionStorage does not outlive a single command",
        command
    ))
}
