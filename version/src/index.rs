//! Package-index client.
//!
//! The index is a single JSON document listing every released version
//! of every module, shaped as
//! `{"extensions": {"<module>": [{"metadata": {"version": ..}}, ..]}}`.
//! The engine only needs one fact from it: the highest major among the
//! module's stable releases.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, VersionError};
use crate::modver::ModuleVersion;

/// Default index document location.
pub const DEFAULT_INDEX_URL: &str =
    "https://azcliextensionsync.blob.core.windows.net/index1/index.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches released-version history from the package index.
pub struct PackageIndexClient {
    url: String,
}

impl PackageIndexClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Fetches the index and returns the module's highest stable major.
    ///
    /// `Ok(None)` means the module is not listed. `Ok(Some(0))` means it
    /// is listed but has never shipped a stable release. One attempt,
    /// short timeout; any transport or shape failure is
    /// [`VersionError::IndexUnavailable`].
    pub fn last_stable_major(&self, module_name: &str) -> Result<Option<u64>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| VersionError::IndexUnavailable(err.to_string()))?;
        let document: Value = client
            .get(&self.url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| VersionError::IndexUnavailable(err.to_string()))?
            .json()
            .map_err(|err| VersionError::IndexUnavailable(err.to_string()))?;
        debug!(url = %self.url, module = module_name, "package index fetched");
        find_max_stable_major(&document, module_name)
    }
}

impl Default for PackageIndexClient {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_URL)
    }
}

/// Extracts the highest stable major for a module from a parsed index
/// document.
///
/// A release counts as stable when its version parses with no
/// pre-release suffix and its metadata carries neither the preview nor
/// the experimental flag. Releases with unparseable versions are
/// skipped.
pub fn find_max_stable_major(document: &Value, module_name: &str) -> Result<Option<u64>> {
    let extensions = document
        .get("extensions")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            VersionError::IndexUnavailable("document has no 'extensions' object".to_string())
        })?;
    let Some(releases) = extensions.get(module_name).and_then(Value::as_array) else {
        return Ok(None);
    };

    let mut max_stable_major = None;
    for release in releases {
        let metadata = release.get("metadata").unwrap_or(&Value::Null);
        let Some(raw_version) = metadata.get("version").and_then(Value::as_str) else {
            continue;
        };
        let version: ModuleVersion = match raw_version.parse() {
            Ok(version) => version,
            Err(_) => {
                warn!(module = module_name, version = raw_version, "unparseable release version");
                continue;
            }
        };
        let flagged = metadata
            .get("azext.isPreview")
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || metadata
                .get("azext.isExperimental")
                .and_then(Value::as_bool)
                .unwrap_or(false);
        if !version.is_pre() && !flagged {
            max_stable_major = Some(max_stable_major.unwrap_or(0).max(version.major));
        }
    }
    // listed but never stable still beats "unknown module"
    Ok(Some(max_stable_major.unwrap_or(0)))
}
