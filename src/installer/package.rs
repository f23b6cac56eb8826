//! Package metadata lookup.
//!
//! The package manager owns the metadata of installed packages. The
//! installer only needs four fields of it, each read independently.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageInfoError {
    #[error("Invalid package id '{0}'")]
    InvalidId(String),

    #[error("Package '{0}' not found")]
    NotFound(String),

    #[error("Failed to read package info for '{pkg_id}': {message}")]
    Read { pkg_id: String, message: String },

    #[error("Package '{pkg_id}' has no {field}")]
    MissingField { pkg_id: String, field: &'static str },
}

/// Source of package metadata handles.
pub trait PackageInfoSource {
    fn open(&self, pkg_id: &str) -> Result<Box<dyn PackageHandle>, PackageInfoError>;
}

/// Metadata of one package. Released on drop.
pub trait PackageHandle {
    fn package_type(&self) -> Result<String, PackageInfoError>;
    fn root_path(&self) -> Result<PathBuf, PackageInfoError>;
    fn res_type(&self) -> Result<String, PackageInfoError>;
    fn res_version(&self) -> Result<String, PackageInfoError>;
}

/// On-disk package descriptor, `<pkg_id>.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDescriptor {
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub root_path: Option<PathBuf>,
    pub res_type: Option<String>,
    pub res_version: Option<String>,
}

/// Package database backed by a directory of TOML descriptors.
#[derive(Debug, Clone)]
pub struct TomlPackageDb {
    dir: PathBuf,
}

impl TomlPackageDb {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn descriptor_path(&self, pkg_id: &str) -> Result<PathBuf, PackageInfoError> {
        let valid = !pkg_id.is_empty()
            && pkg_id != "."
            && pkg_id != ".."
            && !pkg_id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(PackageInfoError::InvalidId(pkg_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.toml", pkg_id)))
    }
}

impl PackageInfoSource for TomlPackageDb {
    fn open(&self, pkg_id: &str) -> Result<Box<dyn PackageHandle>, PackageInfoError> {
        let path = self.descriptor_path(pkg_id)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PackageInfoError::NotFound(pkg_id.to_string()),
            _ => PackageInfoError::Read {
                pkg_id: pkg_id.to_string(),
                message: e.to_string(),
            },
        })?;
        let descriptor: PackageDescriptor =
            toml::from_str(&contents).map_err(|e| PackageInfoError::Read {
                pkg_id: pkg_id.to_string(),
                message: e.to_string(),
            })?;
        Ok(Box::new(DescriptorHandle {
            pkg_id: pkg_id.to_string(),
            descriptor,
        }))
    }
}

struct DescriptorHandle {
    pkg_id: String,
    descriptor: PackageDescriptor,
}

impl DescriptorHandle {
    fn field<T: Clone>(&self, value: &Option<T>, field: &'static str) -> Result<T, PackageInfoError> {
        value.clone().ok_or_else(|| PackageInfoError::MissingField {
            pkg_id: self.pkg_id.clone(),
            field,
        })
    }
}

impl PackageHandle for DescriptorHandle {
    fn package_type(&self) -> Result<String, PackageInfoError> {
        self.field(&self.descriptor.package_type, "type")
    }

    fn root_path(&self) -> Result<PathBuf, PackageInfoError> {
        self.field(&self.descriptor.root_path, "root_path")
    }

    fn res_type(&self) -> Result<String, PackageInfoError> {
        self.field(&self.descriptor.res_type, "res_type")
    }

    fn res_version(&self) -> Result<String, PackageInfoError> {
        self.field(&self.descriptor.res_version, "res_version")
    }
}
