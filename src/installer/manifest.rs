//! RPK manifest parsing.
//!
//! A manifest is a JSON object whose top-level keys name a category
//! (`model`, `pipeline`, `resource`, singular or plural, any case). Each
//! value is one entry object or an array of them. Structural problems fail
//! the whole parse; a bad entry is logged and skipped.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::registry::{BackendError, RegistrationBackend};

/// Errors that fail the whole manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("Manifest is not a regular file: {0}")]
    NotRegularFile(PathBuf),

    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid manifest JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Manifest root must be a JSON object")]
    NotAnObject,

    #[error("Unknown manifest category '{0}'")]
    UnknownCategory(String),
}

/// Entry kinds a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Model,
    Pipeline,
    Resource,
}

const CATEGORY_KEYS: &[(&str, Category)] = &[
    ("model", Category::Model),
    ("models", Category::Model),
    ("pipeline", Category::Pipeline),
    ("pipelines", Category::Pipeline),
    ("resource", Category::Resource),
    ("resources", Category::Resource),
];

impl Category {
    /// Resolve a top-level key, ignoring ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        CATEGORY_KEYS
            .iter()
            .find(|(spelling, _)| spelling.eq_ignore_ascii_case(key))
            .map(|(_, category)| *category)
    }

    fn as_str(self) -> &'static str {
        match self {
            Category::Model => "model",
            Category::Pipeline => "pipeline",
            Category::Resource => "resource",
        }
    }
}

/// A category value: one entry or a list of entries.
enum Entries<'a> {
    Single(&'a Value),
    Many(&'a [Value]),
}

impl<'a> Entries<'a> {
    fn resolve(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Entries::Many(items),
            other => Entries::Single(other),
        }
    }

    fn iter(&self) -> std::slice::Iter<'a, Value> {
        match *self {
            Entries::Single(value) => std::slice::from_ref(value).iter(),
            Entries::Many(items) => items.iter(),
        }
    }
}

/// Tally of one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub models: usize,
    pub pipelines: usize,
    pub resources: usize,
    /// Entries (or resource paths) dropped for missing or malformed fields.
    pub skipped: usize,
    /// Registrations the backend rejected.
    pub failed: usize,
}

impl ParseReport {
    pub fn registered(&self) -> usize {
        self.models + self.pipelines + self.resources
    }
}

#[derive(Error, Debug)]
enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("no resource path")]
    NoPaths,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn string_field<'v>(entry: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    entry.get(key).and_then(Value::as_str)
}

fn required<'v>(entry: &'v Map<String, Value>, key: &'static str) -> Result<&'v str, EntryError> {
    string_field(entry, key).ok_or(EntryError::MissingField(key))
}

fn is_active(entry: &Map<String, Value>) -> bool {
    string_field(entry, "activate").is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Registers manifest entries against a backend.
pub struct ManifestParser<'a> {
    backend: &'a dyn RegistrationBackend,
}

impl<'a> ManifestParser<'a> {
    pub fn new(backend: &'a dyn RegistrationBackend) -> Self {
        Self { backend }
    }

    /// Parse the manifest at `path`, tagging every registration with `app_info`.
    pub fn parse(&self, path: &Path, app_info: &str) -> Result<ParseReport, ManifestError> {
        let metadata =
            std::fs::metadata(path).map_err(|_| ManifestError::NotFound(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(ManifestError::NotRegularFile(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "manifest loaded");
        self.parse_str(&contents, app_info)
    }

    /// Parse manifest text. Keys are handled in document order; an unknown
    /// key fails the parse but keeps registrations already made.
    pub fn parse_str(&self, contents: &str, app_info: &str) -> Result<ParseReport, ManifestError> {
        let root: Value = serde_json::from_str(contents)?;
        let object = root.as_object().ok_or(ManifestError::NotAnObject)?;

        let mut report = ParseReport::default();
        for (key, value) in object {
            let category = Category::from_key(key).ok_or_else(|| {
                error!(key = %key, "unknown manifest category");
                ManifestError::UnknownCategory(key.clone())
            })?;
            for entry in Entries::resolve(value).iter() {
                self.register_entry(category, entry, app_info, &mut report);
            }
        }

        info!(
            models = report.models,
            pipelines = report.pipelines,
            resources = report.resources,
            skipped = report.skipped,
            failed = report.failed,
            "manifest parsed"
        );
        Ok(report)
    }

    fn register_entry(
        &self,
        category: Category,
        entry: &Value,
        app_info: &str,
        report: &mut ParseReport,
    ) {
        let result = match entry.as_object() {
            None => Err(EntryError::NotAnObject),
            Some(fields) => match category {
                Category::Model => self.register_model(fields, app_info, report),
                Category::Pipeline => self.register_pipeline(fields, report),
                Category::Resource => self.register_resources(fields, app_info, report),
            },
        };
        match result {
            Ok(()) => {}
            Err(EntryError::Backend(e)) => {
                error!(category = category.as_str(), code = e.code(), error = %e, "registration failed");
                report.failed += 1;
            }
            Err(e) => {
                warn!(category = category.as_str(), error = %e, "manifest entry skipped");
                report.skipped += 1;
            }
        }
    }

    fn register_model(
        &self,
        entry: &Map<String, Value>,
        app_info: &str,
        report: &mut ParseReport,
    ) -> Result<(), EntryError> {
        let name = required(entry, "name")?;
        let path = required(entry, "model")?;
        let description = string_field(entry, "description").unwrap_or_default();
        let active = is_active(entry);

        let version = self
            .backend
            .add_model(name, path, active, description, app_info)?;
        info!(name, path, version, active, "model registered");
        report.models += 1;
        Ok(())
    }

    fn register_pipeline(
        &self,
        entry: &Map<String, Value>,
        report: &mut ParseReport,
    ) -> Result<(), EntryError> {
        let name = required(entry, "name")?;
        let description = required(entry, "pipeline")?;

        self.backend.set_pipeline_description(name, description)?;
        info!(name, "pipeline registered");
        report.pipelines += 1;
        Ok(())
    }

    /// One registration per path. Paths are independent of each other.
    fn register_resources(
        &self,
        entry: &Map<String, Value>,
        app_info: &str,
        report: &mut ParseReport,
    ) -> Result<(), EntryError> {
        let name = required(entry, "name")?;
        let description = string_field(entry, "description").unwrap_or_default();
        let paths: Vec<Option<&str>> = match entry.get("path") {
            Some(Value::Array(items)) => items.iter().map(Value::as_str).collect(),
            Some(value) => vec![value.as_str()],
            None => Vec::new(),
        };
        if paths.is_empty() {
            return Err(EntryError::NoPaths);
        }

        for (index, path) in paths.into_iter().enumerate() {
            let Some(path) = path else {
                warn!(name, index, "resource path is not a string, skipped");
                report.skipped += 1;
                continue;
            };
            match self.backend.add_resource(name, path, description, app_info) {
                Ok(()) => {
                    info!(name, path, "resource registered");
                    report.resources += 1;
                }
                Err(e) => {
                    error!(name, path, code = e.code(), error = %e, "resource registration failed");
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryBackend;

    #[test]
    fn category_keys_ignore_case() {
        assert_eq!(Category::from_key("MODELS"), Some(Category::Model));
        assert_eq!(Category::from_key("Pipeline"), Some(Category::Pipeline));
        assert_eq!(Category::from_key("resources"), Some(Category::Resource));
        assert_eq!(Category::from_key("modell"), None);
        assert_eq!(Category::from_key(""), None);
    }

    #[test]
    fn single_object_is_one_entry() {
        let backend = MemoryBackend::new();
        let report = ManifestParser::new(&backend)
            .parse_str(r#"{"model": {"name": "m", "model": "/m.tflite"}}"#, "{}")
            .unwrap();
        assert_eq!(report.models, 1);
        assert_eq!(backend.model_count(), 1);
    }

    #[test]
    fn non_object_root_is_rejected() {
        let backend = MemoryBackend::new();
        let err = ManifestParser::new(&backend).parse_str("[1, 2]", "{}").unwrap_err();
        assert!(matches!(err, ManifestError::NotAnObject));
    }

    #[test]
    fn non_object_entry_is_skipped() {
        let backend = MemoryBackend::new();
        let report = ManifestParser::new(&backend)
            .parse_str(r#"{"models": [42, {"name": "m", "model": "/m"}]}"#, "{}")
            .unwrap();
        assert_eq!(report.models, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn activate_must_be_a_string() {
        let mut entry = Map::new();
        entry.insert("activate".into(), Value::Bool(true));
        assert!(!is_active(&entry));
        entry.insert("activate".into(), Value::String("TrUe".into()));
        assert!(is_active(&entry));
        entry.insert("activate".into(), Value::String("yes".into()));
        assert!(!is_active(&entry));
    }

    #[test]
    fn backend_failure_is_counted_not_fatal() {
        let backend = MemoryBackend::new();
        let report = ManifestParser::new(&backend)
            .parse_str(
                r#"{"models": [{"name": "", "model": "/a"}, {"name": "b", "model": "/b"}]}"#,
                "{}",
            )
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.models, 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let backend = MemoryBackend::new();
        let err = ManifestParser::new(&backend)
            .parse(Path::new("/nonexistent/rpk_config.json"), "{}")
            .unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }
}
