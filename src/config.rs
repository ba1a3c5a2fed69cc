//! Service configuration: the profiles/contexts JSON document.
//!
//! The document is parsed once at process start and treated as an
//! immutable snapshot; hot reload is out of scope.  If the local
//! hostname matches a profile name, that profile's fields override the
//! `default` profile at load time, so one document can serve a whole
//! deployment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading the configuration document
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A requested profile is not defined
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

/// One service profile entry.  Deployment-specific fields are optional
/// and fall back to the defaults of `ResolvedProfile`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// Profile class (`public`, `external`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Query-manager base URL for catalog SQL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<String>,
    /// Root of the cached spectrum tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,
    /// Root of the authoritative FITS archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fits_root: Option<PathBuf>,
    /// Catalog timeout, seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// One dataset context entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContextConfig {
    /// Context class (`public`, `external`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Catalog name -> description
    #[serde(default)]
    pub catalogs: BTreeMap<String, String>,
}

/// A profile with every deployment field filled in.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    /// Profile name
    pub name: String,
    /// Query-manager base URL
    pub catalog_url: String,
    /// Root of the cached spectrum tree
    pub cache_root: PathBuf,
    /// Root of the authoritative FITS archive
    pub fits_root: PathBuf,
    /// Catalog timeout, seconds
    pub timeout: u64,
}

/// The parsed configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Service profiles by name
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
    /// Dataset contexts by name
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextConfig>,
}

impl Config {
    /// Read and parse the document at `path`, then apply the hostname
    /// override.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&text)?;
        if let Ok(host) = hostname::get() {
            config.apply_host_override(&host.to_string_lossy());
        }
        Ok(config)
    }

    /// A built-in document covering the SDSS releases, used when no
    /// configuration file is given (tests, the cache tool).
    pub fn builtin() -> Config {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".to_string(),
            ProfileConfig {
                kind: "public".into(),
                description: "Default service profile".into(),
                ..ProfileConfig::default()
            },
        );
        let mut contexts = BTreeMap::new();
        for release in ["dr16", "dr15", "dr14", "dr13", "dr12"] {
            contexts.insert(
                format!("sdss_{release}"),
                ContextConfig {
                    kind: "public".into(),
                    description: format!("SDSS data release {}", &release[2..]),
                    catalogs: BTreeMap::from([(
                        format!("sdss_{release}.specobj"),
                        "Spectroscopic objects".to_string(),
                    )]),
                },
            );
        }
        contexts.insert(
            "default".to_string(),
            ContextConfig {
                kind: "public".into(),
                description: "Default dataset context (newest SDSS release)".into(),
                catalogs: BTreeMap::from([(
                    "sdss_dr16.specobj".to_string(),
                    "Spectroscopic objects".to_string(),
                )]),
            },
        );
        Config { profiles, contexts }
    }

    /// Overlay the host-named profile onto `default`, field by field.
    pub fn apply_host_override(&mut self, host: &str) {
        let short = host.split('.').next().unwrap_or(host).to_string();
        let Some(overlay) = self
            .profiles
            .get(host)
            .or_else(|| self.profiles.get(&short))
            .cloned()
        else {
            return;
        };
        log::info!("applying profile override for host {host}");
        let base = self.profiles.entry("default".to_string()).or_default();
        if overlay.catalog_url.is_some() {
            base.catalog_url = overlay.catalog_url;
        }
        if overlay.cache_root.is_some() {
            base.cache_root = overlay.cache_root;
        }
        if overlay.fits_root.is_some() {
            base.fits_root = overlay.fits_root;
        }
        if overlay.timeout.is_some() {
            base.timeout = overlay.timeout;
        }
    }

    /// True when `name` names a profile.
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// True when `name` names a context.
    pub fn has_context(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    /// Resolve a profile's deployment fields, filling defaults.
    pub fn resolve_profile(&self, name: &str) -> Result<ResolvedProfile, ConfigError> {
        let name = if name.is_empty() { "default" } else { name };
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        Ok(ResolvedProfile {
            name: name.to_string(),
            catalog_url: profile
                .catalog_url
                .clone()
                .unwrap_or_else(|| "https://datalab.noirlab.edu/query".to_string()),
            cache_root: profile
                .cache_root
                .clone()
                .unwrap_or_else(|| PathBuf::from("/ssd0/sdss")),
            fits_root: profile
                .fits_root
                .clone()
                .unwrap_or_else(|| PathBuf::from("/net/mss1/archive/hlsp/sdss")),
            timeout: profile.timeout.unwrap_or(crate::catalog::DEFAULT_TIMEOUT_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_default_entries() {
        let cfg = Config::builtin();
        assert!(cfg.has_profile("default"));
        assert!(cfg.has_context("default"));
        assert!(cfg.has_context("sdss_dr16"));
        assert!(!cfg.has_context("sdss_dr1"));
    }

    #[test]
    fn test_parse_document() {
        let doc = r#"{
            "profiles": {
                "default": {"type": "public", "description": "base"},
                "gp07": {"type": "internal", "description": "pod",
                         "cache_root": "/data/cache"}
            },
            "contexts": {
                "default": {"type": "public", "description": "newest",
                            "catalogs": {"sdss_dr16.specobj": "objects"}}
            }
        }"#;
        let cfg: Config = serde_json::from_str(doc).unwrap();
        assert_eq!(cfg.profiles.len(), 2);
        assert_eq!(
            cfg.contexts["default"].catalogs["sdss_dr16.specobj"],
            "objects"
        );
    }

    #[test]
    fn test_host_override_merges_into_default() {
        let doc = r#"{
            "profiles": {
                "default": {"type": "public", "description": "base"},
                "gp07": {"type": "internal", "description": "pod",
                         "cache_root": "/data/cache", "timeout": 30}
            },
            "contexts": {}
        }"#;
        let mut cfg: Config = serde_json::from_str(doc).unwrap();
        cfg.apply_host_override("gp07.datalab.noirlab.edu");
        let resolved = cfg.resolve_profile("default").unwrap();
        assert_eq!(resolved.cache_root, PathBuf::from("/data/cache"));
        assert_eq!(resolved.timeout, 30);
        // Untouched fields keep their defaults.
        assert_eq!(resolved.fits_root, PathBuf::from("/net/mss1/archive/hlsp/sdss"));
    }

    #[test]
    fn test_unknown_profile_fails() {
        let cfg = Config::builtin();
        assert!(matches!(
            cfg.resolve_profile("nonesuch"),
            Err(ConfigError::UnknownProfile(_))
        ));
    }
}
