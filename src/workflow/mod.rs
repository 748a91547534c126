//! Loading of JSON workflow files.
//!
//! Both encodings written by the editor are accepted: root links as compact
//! `[id, origin, slot, target, slot, type]` arrays with reroute parents under
//! `extra.linkExtensions`, and links as objects. Subgraph definitions are read from
//! `definitions.subgraphs`, including nested `definitions` blocks.

use crate::error::ConversionError;
use crate::graph::{GraphDefinition, IntoGraph};
use std::fs;
use std::path::Path;

mod conversion;
mod types;

pub use conversion::DEFAULT_VIRTUAL_TYPES;
pub use types::*;

impl Workflow {
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json).map_err(|e| ConversionError::JsonParseError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConversionError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

/// Parses a workflow and converts it in one step.
pub fn load_graph(json: &str) -> Result<GraphDefinition, ConversionError> {
    Workflow::from_json(json)?.into_graph()
}
