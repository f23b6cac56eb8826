//! In-memory registration backend.
//!
//! Used by the daemon when no external store is configured and by tests as
//! the reference implementation of the backend invariants.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::backend::{BackendError, RegistrationBackend, STATUS_BUSY};
use super::records::{ModelRecord, PipelineRecord, ResourceRecord};

#[derive(Default)]
struct Store {
    models: HashMap<String, Vec<ModelRecord>>,
    /// Last version handed out per name. Survives deletes, so numbers are never reused.
    last_version: HashMap<String, u32>,
    pipelines: HashMap<String, PipelineRecord>,
    resources: Vec<ResourceRecord>,
}

impl Store {
    fn versions(&self, name: &str) -> Result<&Vec<ModelRecord>, BackendError> {
        self.models
            .get(name)
            .filter(|versions| !versions.is_empty())
            .ok_or_else(|| BackendError::not_found(format!("no model named '{}'", name)))
    }

    fn version_mut(&mut self, name: &str, version: u32) -> Result<&mut ModelRecord, BackendError> {
        self.models
            .get_mut(name)
            .and_then(|versions| versions.iter_mut().find(|m| m.version == version))
            .ok_or_else(|| {
                BackendError::not_found(format!("no model '{}' with version {}", name, version))
            })
    }
}

/// Thread-safe in-memory model registry.
#[derive(Default)]
pub struct MemoryBackend {
    store: RwLock<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored description of a pipeline, if any.
    pub fn pipeline(&self, name: &str) -> Option<PipelineRecord> {
        self.store.read().pipelines.get(name).cloned()
    }

    /// Every resource record registered under `name`, in insertion order.
    pub fn resources(&self, name: &str) -> Vec<ResourceRecord> {
        self.store
            .read()
            .resources
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect()
    }

    /// Number of model versions across all names.
    pub fn model_count(&self) -> usize {
        self.store.read().models.values().map(Vec::len).sum()
    }
}

fn require(value: &str, field: &str) -> Result<(), BackendError> {
    if value.is_empty() {
        return Err(BackendError::invalid_parameter(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, BackendError> {
    serde_json::to_string(value)
        .map_err(|e| BackendError::invalid_parameter(format!("cannot serialize record: {}", e)))
}

impl RegistrationBackend for MemoryBackend {
    fn add_model(
        &self,
        name: &str,
        path: &str,
        active: bool,
        description: &str,
        app_info: &str,
    ) -> Result<u32, BackendError> {
        require(name, "name")?;
        require(path, "path")?;

        let mut store = self.store.write();
        let last = store.last_version.entry(name.to_string()).or_insert(0);
        *last += 1;
        let version = *last;
        let versions = store.models.entry(name.to_string()).or_default();
        if active {
            versions.iter_mut().for_each(|m| m.active = false);
        }
        versions.push(ModelRecord {
            name: name.to_string(),
            path: path.to_string(),
            version,
            active,
            description: description.to_string(),
            app_info: app_info.to_string(),
        });
        Ok(version)
    }

    fn update_model_description(
        &self,
        name: &str,
        version: u32,
        description: &str,
    ) -> Result<(), BackendError> {
        require(name, "name")?;
        let mut store = self.store.write();
        store.version_mut(name, version)?.description = description.to_string();
        Ok(())
    }

    fn activate_model(&self, name: &str, version: u32) -> Result<(), BackendError> {
        require(name, "name")?;
        let mut store = self.store.write();
        store.version_mut(name, version)?;
        if let Some(versions) = store.models.get_mut(name) {
            for model in versions.iter_mut() {
                model.active = model.version == version;
            }
        }
        Ok(())
    }

    fn get_model(&self, name: &str, version: u32) -> Result<String, BackendError> {
        let store = self.store.read();
        let model = store
            .versions(name)?
            .iter()
            .find(|m| m.version == version)
            .ok_or_else(|| {
                BackendError::not_found(format!("no model '{}' with version {}", name, version))
            })?;
        to_json(model)
    }

    fn get_activated_model(&self, name: &str) -> Result<String, BackendError> {
        let store = self.store.read();
        let model = store
            .versions(name)?
            .iter()
            .find(|m| m.active)
            .ok_or_else(|| BackendError::not_found(format!("no active version of '{}'", name)))?;
        to_json(model)
    }

    fn get_all_models(&self, name: &str) -> Result<String, BackendError> {
        let store = self.store.read();
        to_json(store.versions(name)?)
    }

    fn delete_model(&self, name: &str, version: u32, force: bool) -> Result<(), BackendError> {
        let mut store = self.store.write();
        if store.version_mut(name, version)?.active && !force {
            return Err(BackendError::new(
                STATUS_BUSY,
                format!("model '{}' version {} is active", name, version),
            ));
        }
        if let Some(versions) = store.models.get_mut(name) {
            versions.retain(|m| m.version != version);
            if versions.is_empty() {
                store.models.remove(name);
            }
        }
        Ok(())
    }

    fn set_pipeline_description(
        &self,
        name: &str,
        description: &str,
    ) -> Result<(), BackendError> {
        require(name, "name")?;
        require(description, "description")?;
        self.store.write().pipelines.insert(
            name.to_string(),
            PipelineRecord {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        Ok(())
    }

    fn add_resource(
        &self,
        name: &str,
        path: &str,
        description: &str,
        app_info: &str,
    ) -> Result<(), BackendError> {
        require(name, "name")?;
        require(path, "path")?;
        self.store.write().resources.push(ResourceRecord {
            name: name.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            app_info: app_info.to_string(),
        });
        Ok(())
    }
}
