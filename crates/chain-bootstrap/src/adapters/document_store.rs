//! File Document Store Adapter
//!
//! Implements `DocumentStore` on the local filesystem with TOML, JSON and
//! YAML codecs.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::{Document, DocumentFormat, MergeError, Scalar, Value};
use crate::ports::outbound::DocumentStore;

/// Reads and writes structured documents as plain files.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    /// Create a new store.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, path: &Path, format: DocumentFormat) -> Result<Document, MergeError> {
        let text = fs::read_to_string(path).map_err(|e| MergeError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        decode(&text, format).map_err(|reason| MergeError::Decode {
            path: path.to_path_buf(),
            format,
            reason,
        })
    }

    fn save(
        &self,
        path: &Path,
        format: DocumentFormat,
        document: &Document,
    ) -> Result<(), MergeError> {
        let text = encode(document, format).map_err(|reason| MergeError::Encode {
            path: path.to_path_buf(),
            format,
            reason,
        })?;
        fs::write(path, text).map_err(|e| MergeError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), %format, "document written");
        Ok(())
    }
}

/// Parse `text` as a document of the given format.
pub fn decode(text: &str, format: DocumentFormat) -> Result<Document, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str::<toml::Table>(text)
            .map(document_from_toml)
            .map_err(|e| e.to_string()),
    }
}

/// Render a document in the given format.
pub fn encode(document: &Document, format: DocumentFormat) -> Result<String, String> {
    match format {
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(document).map_err(|e| e.to_string()),
        DocumentFormat::Toml => {
            let table = document_to_toml(document)?;
            toml::to_string(&table).map_err(|e| e.to_string())
        }
    }
}

// =============================================================================
// TOML conversions
// =============================================================================

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::Scalar(Scalar::String(s)),
            toml::Value::Integer(i) => Value::Scalar(Scalar::Integer(i)),
            toml::Value::Float(f) => Value::Scalar(Scalar::Float(f)),
            toml::Value::Boolean(b) => Value::Scalar(Scalar::Bool(b)),
            toml::Value::Datetime(dt) => Value::Scalar(Scalar::String(dt.to_string())),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(document_from_toml(table)),
        }
    }
}

/// Convert a TOML table into a document.
pub fn document_from_toml(table: toml::Table) -> Document {
    table.into_iter().collect()
}

/// Convert a document into a TOML table. Null entries are dropped.
pub fn document_to_toml(document: &Document) -> Result<toml::Table, String> {
    let mut table = toml::Table::new();
    for (key, value) in document {
        if value.is_null() {
            continue;
        }
        table.insert(key.clone(), value_to_toml(value, key)?);
    }
    Ok(table)
}

fn value_to_toml(value: &Value, at: &str) -> Result<toml::Value, String> {
    Ok(match value {
        Value::Scalar(Scalar::Null) => return Err(format!("`{at}` contains a null list item")),
        Value::Scalar(Scalar::Bool(b)) => toml::Value::Boolean(*b),
        Value::Scalar(Scalar::Integer(i)) => toml::Value::Integer(*i),
        Value::Scalar(Scalar::Unsigned(u)) => {
            return Err(format!("`{at}` integer {u} is out of the TOML integer range"))
        }
        Value::Scalar(Scalar::Float(f)) => toml::Value::Float(*f),
        Value::Scalar(Scalar::String(s)) => toml::Value::String(s.clone()),
        Value::List(items) => toml::Value::Array(
            items
                .iter()
                .map(|item| value_to_toml(item, at))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(doc) => toml::Value::Table(document_to_toml(doc)?),
    })
}
