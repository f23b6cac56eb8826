//! Package-manager plugin hooks and the RPK install orchestrator.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::app_context::AppContext;
use super::manifest::{ManifestError, ManifestParser, ParseReport};
use super::package::{PackageInfoError, PackageInfoSource};
use crate::registry::RegistrationBackend;

/// Package type handled by [`RpkInstaller`].
pub const RPK_PACKAGE_TYPE: &str = "rpk";

pub const MANIFEST_FILE_NAME: &str = "rpk_config.json";

/// `<root>/res/global/<res_type>/rpk_config.json`
pub fn manifest_path(root: &std::path::Path, res_type: &str) -> PathBuf {
    root.join("res")
        .join("global")
        .join(res_type)
        .join(MANIFEST_FILE_NAME)
}

/// Metadata key/value pair passed by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub key: String,
    pub value: String,
}

impl Metadata {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Arguments common to every hook invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookArgs<'a> {
    pub pkg_id: &'a str,
    pub app_id: Option<&'a str>,
    pub metadata: &'a [Metadata],
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Package info unavailable: {0}")]
    PackageInfo(#[from] PackageInfoError),

    #[error("Failed to serialize app info: {0}")]
    AppInfo(#[from] serde_json::Error),

    #[error("Manifest {path} rejected: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Not an RPK package; nothing to register.
    Skipped { package_type: String },
    Installed { manifest: PathBuf, report: ParseReport },
}

/// Lifecycle callbacks of a metadata plugin.
///
/// Only `install` carries logic; every other hook is a composition of
/// `install` and `uninstall`.
pub trait MetadataPlugin {
    fn install(&self, args: &HookArgs<'_>) -> Result<InstallOutcome, InstallError>;

    /// Registered data is left in place.
    fn uninstall(&self, args: &HookArgs<'_>) -> Result<(), InstallError> {
        info!(pkg_id = args.pkg_id, "uninstall: nothing to clean up");
        Ok(())
    }

    /// Uninstall then install. Failures of either step are logged only;
    /// the package manager always sees a successful upgrade.
    fn upgrade(&self, args: &HookArgs<'_>) -> Result<(), InstallError> {
        if let Err(e) = self.uninstall(args) {
            warn!(pkg_id = args.pkg_id, error = %e, "upgrade: uninstall step failed");
        }
        match self.install(args) {
            Ok(outcome) => debug!(pkg_id = args.pkg_id, ?outcome, "upgrade: install step done"),
            Err(e) => warn!(pkg_id = args.pkg_id, error = %e, "upgrade: install step failed"),
        }
        Ok(())
    }

    fn recover_install(&self, args: &HookArgs<'_>) -> Result<(), InstallError> {
        self.uninstall(args)
    }

    fn recover_upgrade(&self, args: &HookArgs<'_>) -> Result<(), InstallError> {
        self.upgrade(args)
    }

    fn recover_uninstall(&self, args: &HookArgs<'_>) -> Result<InstallOutcome, InstallError> {
        self.install(args)
    }

    fn clean(&self, _args: &HookArgs<'_>) -> Result<(), InstallError> {
        Ok(())
    }

    fn undo(&self, _args: &HookArgs<'_>) -> Result<(), InstallError> {
        Ok(())
    }
}

/// The eight entry points the package manager calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginHook {
    Install,
    Uninstall,
    Upgrade,
    RecoverInstall,
    RecoverUpgrade,
    RecoverUninstall,
    Clean,
    Undo,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown plugin hook '{0}'")]
pub struct UnknownHook(pub String);

impl PluginHook {
    pub const ALL: [PluginHook; 8] = [
        PluginHook::Install,
        PluginHook::Uninstall,
        PluginHook::Upgrade,
        PluginHook::RecoverInstall,
        PluginHook::RecoverUpgrade,
        PluginHook::RecoverUninstall,
        PluginHook::Clean,
        PluginHook::Undo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PluginHook::Install => "INSTALL",
            PluginHook::Uninstall => "UNINSTALL",
            PluginHook::Upgrade => "UPGRADE",
            PluginHook::RecoverInstall => "RECOVERINSTALL",
            PluginHook::RecoverUpgrade => "RECOVERUPGRADE",
            PluginHook::RecoverUninstall => "RECOVERUNINSTALL",
            PluginHook::Clean => "CLEAN",
            PluginHook::Undo => "UNDO",
        }
    }

    /// Run the hook. Returns 0 on success and -1 on failure, as the
    /// package manager expects.
    pub fn run(self, plugin: &dyn MetadataPlugin, args: &HookArgs<'_>) -> i32 {
        info!(
            hook = self.as_str(),
            pkg_id = args.pkg_id,
            app_id = args.app_id.unwrap_or_default(),
            "plugin hook called"
        );
        let result = match self {
            PluginHook::Install => plugin.install(args).map(|_| ()),
            PluginHook::Uninstall => plugin.uninstall(args),
            PluginHook::Upgrade => plugin.upgrade(args),
            PluginHook::RecoverInstall => plugin.recover_install(args),
            PluginHook::RecoverUpgrade => plugin.recover_upgrade(args),
            PluginHook::RecoverUninstall => plugin.recover_uninstall(args).map(|_| ()),
            PluginHook::Clean => plugin.clean(args),
            PluginHook::Undo => plugin.undo(args),
        };
        match result {
            Ok(()) => 0,
            Err(e) => {
                error!(hook = self.as_str(), pkg_id = args.pkg_id, error = %e, "plugin hook failed");
                -1
            }
        }
    }
}

impl fmt::Display for PluginHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginHook {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginHook::ALL
            .into_iter()
            .find(|hook| hook.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownHook(s.to_string()))
    }
}

/// Registers the manifest of RPK packages on install.
pub struct RpkInstaller<'a> {
    packages: &'a dyn PackageInfoSource,
    backend: &'a dyn RegistrationBackend,
}

impl<'a> RpkInstaller<'a> {
    pub fn new(packages: &'a dyn PackageInfoSource, backend: &'a dyn RegistrationBackend) -> Self {
        Self { packages, backend }
    }
}

impl MetadataPlugin for RpkInstaller<'_> {
    fn install(&self, args: &HookArgs<'_>) -> Result<InstallOutcome, InstallError> {
        for entry in args.metadata {
            info!(key = %entry.key, value = %entry.value, "package metadata");
        }

        let handle = self.packages.open(args.pkg_id)?;
        let package_type = handle.package_type()?;
        if package_type != RPK_PACKAGE_TYPE {
            info!(pkg_id = args.pkg_id, package_type = %package_type, "not an rpk package, skipped");
            return Ok(InstallOutcome::Skipped { package_type });
        }

        let root = handle.root_path()?;
        let res_type = handle.res_type()?;
        let res_version = handle.res_version()?;
        drop(handle);

        let context = AppContext::new(args.pkg_id, args.app_id, res_type, res_version);
        let app_info = context.to_app_info()?;
        let manifest = manifest_path(&root, &context.res_type);

        let report = ManifestParser::new(self.backend)
            .parse(&manifest, &app_info)
            .map_err(|source| InstallError::Manifest {
                path: manifest.clone(),
                source,
            })?;
        info!(
            pkg_id = args.pkg_id,
            manifest = %manifest.display(),
            registered = report.registered(),
            "rpk package installed"
        );
        Ok(InstallOutcome::Installed { manifest, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn hook_names_parse_ignoring_case() {
        assert_eq!("install".parse(), Ok(PluginHook::Install));
        assert_eq!("RecoverUpgrade".parse(), Ok(PluginHook::RecoverUpgrade));
        assert_eq!("UNDO".parse(), Ok(PluginHook::Undo));
        assert_eq!(
            "reinstall".parse::<PluginHook>(),
            Err(UnknownHook("reinstall".into()))
        );
        for hook in PluginHook::ALL {
            assert_eq!(hook.to_string().parse(), Ok(hook));
        }
    }

    #[test]
    fn manifest_path_follows_convention() {
        assert_eq!(
            manifest_path(Path::new("/opt/usr/globalapps/pkg"), "mlmodels"),
            PathBuf::from("/opt/usr/globalapps/pkg/res/global/mlmodels/rpk_config.json")
        );
    }
}
