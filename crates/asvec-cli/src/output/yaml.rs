//! Index definitions as YAML, shared by `index ls --yaml` and
//! `index create --file`.

use std::path::Path;

use anyhow::Context;
use asvec_client::IndexDefinition;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// The document `index ls --yaml` emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexFile {
    pub indices: Vec<IndexDefinition>,
}

pub fn to_yaml(definitions: &[IndexDefinition]) -> Result<String> {
    let file = IndexFile {
        indices: definitions.to_vec(),
    };
    Ok(serde_yaml::to_string(&file)?)
}

/// Parses every document in `text`. A document is either a list under
/// `indices`, a bare list, or a single definition.
pub fn parse(text: &str) -> Result<Vec<IndexDefinition>> {
    let mut definitions = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Sequence(_) => {
                definitions.extend(serde_yaml::from_value::<Vec<IndexDefinition>>(value)?);
            }
            _ if value.get("indices").is_some() => {
                definitions.extend(serde_yaml::from_value::<IndexFile>(value)?.indices);
            }
            _ => definitions.push(serde_yaml::from_value(value)?),
        }
    }
    Ok(definitions)
}

/// Reads and parses an index file.
pub fn load(path: &Path) -> Result<Vec<IndexDefinition>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let definitions = parse(&text)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    if definitions.is_empty() {
        return Err(CliError::Arg(format!(
            "no index definitions found in {}",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), count = definitions.len(), "loaded index file");
    Ok(definitions)
}
