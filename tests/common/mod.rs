//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mlops_agent::installer::{PackageHandle, PackageInfoError, PackageInfoSource};
use mlops_agent::registry::{BackendError, RegistrationBackend, STATUS_INVALID_PARAMETER};
use parking_lot::Mutex;

/// One backend call, as observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    AddModel {
        name: String,
        path: String,
        active: bool,
        description: String,
        app_info: String,
    },
    SetPipeline {
        name: String,
        description: String,
    },
    AddResource {
        name: String,
        path: String,
        description: String,
        app_info: String,
    },
    Other(&'static str),
}

/// Backend that records every call and succeeds, except for names listed
/// in `reject`.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Recorded>>,
    reject: Vec<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().clone()
    }

    pub fn models(&self) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Recorded::AddModel { .. }))
            .collect()
    }

    pub fn resources(&self) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Recorded::AddResource { .. }))
            .collect()
    }

    fn record(&self, name: &str, call: Recorded) -> Result<(), BackendError> {
        self.calls.lock().push(call);
        if self.reject.iter().any(|r| r == name) {
            return Err(BackendError::new(STATUS_INVALID_PARAMETER, "rejected"));
        }
        Ok(())
    }
}

impl RegistrationBackend for RecordingBackend {
    fn add_model(
        &self,
        name: &str,
        path: &str,
        active: bool,
        description: &str,
        app_info: &str,
    ) -> Result<u32, BackendError> {
        self.record(
            name,
            Recorded::AddModel {
                name: name.into(),
                path: path.into(),
                active,
                description: description.into(),
                app_info: app_info.into(),
            },
        )?;
        Ok(1)
    }

    fn update_model_description(&self, name: &str, _: u32, _: &str) -> Result<(), BackendError> {
        self.record(name, Recorded::Other("update_model_description"))
    }

    fn activate_model(&self, name: &str, _: u32) -> Result<(), BackendError> {
        self.record(name, Recorded::Other("activate_model"))
    }

    fn get_model(&self, name: &str, _: u32) -> Result<String, BackendError> {
        self.record(name, Recorded::Other("get_model"))?;
        Ok("{}".into())
    }

    fn get_activated_model(&self, name: &str) -> Result<String, BackendError> {
        self.record(name, Recorded::Other("get_activated_model"))?;
        Ok("{}".into())
    }

    fn get_all_models(&self, name: &str) -> Result<String, BackendError> {
        self.record(name, Recorded::Other("get_all_models"))?;
        Ok("[]".into())
    }

    fn delete_model(&self, name: &str, _: u32, _: bool) -> Result<(), BackendError> {
        self.record(name, Recorded::Other("delete_model"))
    }

    fn set_pipeline_description(&self, name: &str, description: &str) -> Result<(), BackendError> {
        self.record(
            name,
            Recorded::SetPipeline {
                name: name.into(),
                description: description.into(),
            },
        )
    }

    fn add_resource(
        &self,
        name: &str,
        path: &str,
        description: &str,
        app_info: &str,
    ) -> Result<(), BackendError> {
        self.record(
            name,
            Recorded::AddResource {
                name: name.into(),
                path: path.into(),
                description: description.into(),
                app_info: app_info.into(),
            },
        )
    }
}

/// Package metadata as the package manager would report it.
#[derive(Debug, Clone, Default)]
pub struct FakePackage {
    pub package_type: Option<String>,
    pub root_path: Option<PathBuf>,
    pub res_type: Option<String>,
    pub res_version: Option<String>,
}

impl FakePackage {
    pub fn rpk(root: &Path, res_type: &str) -> Self {
        Self {
            package_type: Some("rpk".into()),
            root_path: Some(root.to_path_buf()),
            res_type: Some(res_type.into()),
            res_version: Some("1.0.0".into()),
        }
    }
}

#[derive(Default)]
pub struct FakePackages {
    packages: HashMap<String, FakePackage>,
}

impl FakePackages {
    pub fn with(pkg_id: &str, package: FakePackage) -> Self {
        let mut packages = HashMap::new();
        packages.insert(pkg_id.to_string(), package);
        Self { packages }
    }
}

struct FakeHandle {
    pkg_id: String,
    package: FakePackage,
}

fn missing(pkg_id: &str, field: &'static str) -> PackageInfoError {
    PackageInfoError::MissingField {
        pkg_id: pkg_id.to_string(),
        field,
    }
}

impl PackageHandle for FakeHandle {
    fn package_type(&self) -> Result<String, PackageInfoError> {
        self.package.package_type.clone().ok_or_else(|| missing(&self.pkg_id, "type"))
    }

    fn root_path(&self) -> Result<PathBuf, PackageInfoError> {
        self.package.root_path.clone().ok_or_else(|| missing(&self.pkg_id, "root_path"))
    }

    fn res_type(&self) -> Result<String, PackageInfoError> {
        self.package.res_type.clone().ok_or_else(|| missing(&self.pkg_id, "res_type"))
    }

    fn res_version(&self) -> Result<String, PackageInfoError> {
        self.package.res_version.clone().ok_or_else(|| missing(&self.pkg_id, "res_version"))
    }
}

impl PackageInfoSource for FakePackages {
    fn open(&self, pkg_id: &str) -> Result<Box<dyn PackageHandle>, PackageInfoError> {
        let package = self
            .packages
            .get(pkg_id)
            .cloned()
            .ok_or_else(|| PackageInfoError::NotFound(pkg_id.to_string()))?;
        Ok(Box::new(FakeHandle {
            pkg_id: pkg_id.to_string(),
            package,
        }))
    }
}

/// Write `contents` as the manifest of a package rooted at `root`.
pub fn write_manifest(root: &Path, res_type: &str, contents: &str) -> PathBuf {
    let path = mlops_agent::installer::manifest_path(root, res_type);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
