//! Record shapes held by the registry.

use serde::{Deserialize, Serialize};

/// One registered version of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model name. Shared by every version of the model.
    pub name: String,
    /// Filesystem location of the model artifact.
    pub path: String,
    /// Backend-assigned version, starting at 1 for each name.
    pub version: u32,
    pub active: bool,
    #[serde(default)]
    pub description: String,
    /// Opaque registration context (see `installer::AppContext`).
    #[serde(default)]
    pub app_info: String,
}

/// A named pipeline definition. The description is the pipeline payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub name: String,
    pub description: String,
}

/// One resource path registered under a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub app_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_record_defaults_optional_fields() {
        let json = r#"{"name":"m","path":"/m.tflite","version":2,"active":true}"#;
        let record: ModelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.version, 2);
        assert!(record.active);
        assert!(record.description.is_empty());
        assert!(record.app_info.is_empty());
    }
}
