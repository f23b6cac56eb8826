//! RPK package installer.
//!
//! Invoked by the package manager through [`PluginHook`]. For RPK packages
//! the manifest under the package root is parsed and every declared model,
//! pipeline and resource is registered with the backend.

mod app_context;
mod manifest;
mod package;
mod plugin;

pub use app_context::AppContext;
pub use manifest::{Category, ManifestError, ManifestParser, ParseReport};
pub use package::{
    PackageDescriptor, PackageHandle, PackageInfoError, PackageInfoSource, TomlPackageDb,
};
pub use plugin::{
    manifest_path, HookArgs, InstallError, InstallOutcome, Metadata, MetadataPlugin, PluginHook,
    RpkInstaller, UnknownHook, MANIFEST_FILE_NAME, RPK_PACKAGE_TYPE,
};
