//! Registration context derived once per package install.

use serde::Serialize;

/// Identifies the package and app a registration originates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub pkg_id: String,
    /// Empty when the host supplied no app id.
    pub app_id: String,
    pub res_type: String,
    pub res_version: String,
}

#[derive(Serialize)]
struct AppInfoJson<'a> {
    is_rpk: &'static str,
    pkg_id: &'a str,
    app_id: &'a str,
    res_type: &'a str,
    res_version: &'a str,
}

impl AppContext {
    pub fn new(
        pkg_id: impl Into<String>,
        app_id: Option<&str>,
        res_type: impl Into<String>,
        res_version: impl Into<String>,
    ) -> Self {
        Self {
            pkg_id: pkg_id.into(),
            app_id: app_id.unwrap_or_default().to_string(),
            res_type: res_type.into(),
            res_version: res_version.into(),
        }
    }

    /// The opaque `app_info` string passed on every registration call.
    pub fn to_app_info(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&AppInfoJson {
            is_rpk: "T",
            pkg_id: &self.pkg_id,
            app_id: &self.app_id,
            res_type: &self.res_type,
            res_version: &self.res_version,
        })
    }
}
