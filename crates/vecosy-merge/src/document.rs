//! The generic parsed-document type and the merge primitive.
//!
//! Every supported format is parsed into a [`serde_json::Value`]: maps,
//! lists and scalars, independent of the source syntax.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{MergeError, MergeResult};

/// A parsed configuration document.
pub type Document = Value;

/// Source syntax of a configuration file, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }

    /// Format of a path, by its extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Serialize a document in this format.
    pub fn render(self, document: &Document) -> MergeResult<String> {
        let render_err = |reason: String| MergeError::Render {
            format: self.to_string(),
            reason,
        };
        match self {
            DocumentFormat::Yaml => {
                serde_yaml::to_string(document).map_err(|e| render_err(e.to_string()))
            }
            DocumentFormat::Json => {
                serde_json::to_string_pretty(document).map_err(|e| render_err(e.to_string()))
            }
            DocumentFormat::Toml => {
                toml::to_string_pretty(document).map_err(|e| render_err(e.to_string()))
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
            DocumentFormat::Toml => "toml",
        })
    }
}

/// Parse file content according to the extension of `path`.
///
/// Empty (or whitespace-only) content is an empty map.
pub fn parse_document(path: &str, content: &[u8]) -> MergeResult<Document> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| MergeError::UnsupportedFormat(path.to_string()))?;
    let parse_err = |reason: String| MergeError::Parse {
        path: path.to_string(),
        reason,
    };

    let text = std::str::from_utf8(content).map_err(|e| parse_err(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let document = match format {
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(text).map_err(|e| parse_err(e.to_string()))?
        }
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(text).map_err(|e| parse_err(e.to_string()))?
        }
        DocumentFormat::Toml => {
            toml::from_str::<Value>(text).map_err(|e| parse_err(e.to_string()))?
        }
    };

    Ok(match document {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

/// Merge `overlay` into `base`.
///
/// Maps merge key by key, recursively. Any other overlay value replaces the
/// base value, lists included. A `null` overlay value never erases an
/// existing one.
pub fn deep_merge(base: &mut Document, overlay: Document) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None if value.is_null() => {}
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Flatten a document into dot-separated keys.
///
/// Nested maps produce `a.b.c`, list items produce `a.list[0]`. Empty maps
/// and lists contribute nothing.
pub fn flatten(document: &Document) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten_into(document, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, format!("{prefix}[{i}]"), out);
            }
        }
        scalar => {
            out.insert(prefix, scalar.clone());
        }
    }
}
