//! # Dataset Adapters
//!
//! A dataset context is a named strategy that knows where a release's
//! files live, which reduction versions it may carry, and which catalog
//! answers its metadata queries.  Adapters are selected by name from a
//! registry assembled once at startup and immutable afterwards.
//!
//! Today's only concrete strategy is the SDSS family, parameterized by
//! data release.

mod error;
pub mod locate;
mod sdss;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::id::{CanonicalId, SpecTuple, WildcardTuple};
use crate::spectrum::SpectrumRecord;

pub use error::DatasetError;
pub use sdss::{run2d_for_release, SdssDataset};

/// Client-visible spectrum data formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Cached row-array form
    Npy,
    /// Raw authoritative file
    Fits,
}

impl DataFormat {
    /// Interpret the wire spelling; `fits` selects the authoritative
    /// form, anything else (`npy`, `numpy`, ...) the cached one.
    pub fn from_wire(s: &str) -> DataFormat {
        if s.trim().to_ascii_lowercase().starts_with("fits") {
            DataFormat::Fits
        } else {
            DataFormat::Npy
        }
    }
}

/// A tabular-metadata query against a context's catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Restrict to one packed identifier
    pub id: Option<u64>,
    /// Projection column list; the primary key is always included
    pub fields: String,
    /// Schema-qualified table name
    pub catalog: String,
    /// WHERE condition, or a verbatim ORDER/LIMIT tail
    pub cond: String,
}

/// A dataset strategy, dispatched by variant.
#[derive(Debug, Clone)]
pub enum Dataset {
    /// The SDSS spectral family
    Sdss(SdssDataset),
}

impl Dataset {
    /// The data release this strategy serves.
    pub fn release(&self) -> &str {
        match self {
            Dataset::Sdss(d) => d.release(),
        }
    }

    /// Run a tabular-metadata query, returning CSV bytes.
    pub async fn query(&self, q: &CatalogQuery) -> Result<String, DatasetError> {
        match self {
            Dataset::Sdss(d) => d.query(q).await,
        }
    }

    /// Resolve an identifier to its spectrum file.
    pub fn data_path(&self, id: &CanonicalId, fmt: DataFormat) -> Result<PathBuf, DatasetError> {
        match self {
            Dataset::Sdss(d) => d.data_path(id, fmt),
        }
    }

    /// Resolve an identifier to its preview plot.
    pub fn preview_path(&self, id: &CanonicalId) -> Result<PathBuf, DatasetError> {
        match self {
            Dataset::Sdss(d) => d.preview_path(id),
        }
    }

    /// Decode the file at `path` into a row-array record.
    pub fn get_data(&self, path: &Path) -> Result<SpectrumRecord, DatasetError> {
        match self {
            Dataset::Sdss(d) => d.get_data(path),
        }
    }

    /// Expand a wildcarded tuple against the catalog.
    pub async fn expand_id(&self, w: &WildcardTuple) -> Result<Vec<SpecTuple>, DatasetError> {
        match self {
            Dataset::Sdss(d) => d.expand_id(w).await,
        }
    }
}

/// Name-keyed registry of dataset strategies, loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    map: HashMap<String, Arc<Dataset>>,
}

impl Registry {
    /// Build a registry from context names of the form `sdss_<release>`.
    ///
    /// `default` aliases the newest release.
    pub fn new(
        contexts: impl IntoIterator<Item = String>,
        cache_root: &Path,
        fits_root: &Path,
        catalog: Arc<CatalogClient>,
    ) -> Self {
        let mut map = HashMap::new();
        for name in contexts {
            let release = name.strip_prefix("sdss_").unwrap_or("dr16");
            let ds = Arc::new(Dataset::Sdss(SdssDataset::new(
                release,
                cache_root.to_path_buf(),
                fits_root.to_path_buf(),
                Arc::clone(&catalog),
            )));
            map.insert(name, ds);
        }
        if !map.contains_key("default") {
            let newest = map.get("sdss_dr16").cloned().or_else(|| map.values().next().cloned());
            if let Some(ds) = newest {
                map.insert("default".into(), ds);
            }
        }
        Registry { map }
    }

    /// Look up a context by name.
    pub fn get(&self, name: &str) -> Result<&Arc<Dataset>, DatasetError> {
        let key = if name.is_empty() { "default" } else { name };
        self.map
            .get(key)
            .ok_or_else(|| DatasetError::UnknownContext(key.to_string()))
    }

    /// Registered context names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
