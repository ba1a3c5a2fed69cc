//! # Client SDK
//!
//! A thin blocking wrapper over the service's HTTP surface.  The client
//! formats identifier lists into the wire form, issues requests, and
//! post-processes binary payloads back into typed records.
//!
//! ```rust,no_run
//! use specserver::client::{IdList, SpecClient};
//!
//! let client = SpecClient::new("http://localhost:6998/spec");
//! let ids = IdList::from_ids(&[2210146812474530816]);
//! let spectra = client.get_spec(&ids)?;
//! println!("{} rows", spectra[0].len());
//! # Ok::<(), specserver::client::ClientError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use crate::spectrum::{npy, FormatError, SpectrumRecord};

/// Sentinel file enabling client debug output at construction time.
const DEBUG_SENTINEL: &str = "/tmp/SDC_DEBUG";

/// Default per-request timeout, seconds; forwarded to the service in the
/// `X-DL-TimeoutRequest` header.
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Errors surfaced by the client SDK
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error body
    #[error("service error: {0}")]
    Service(String),

    /// A binary payload failed to parse
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A JSON body failed to parse
    #[error("bad JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// A spatial search region for identifier queries.
///
/// Replaces the arity-overloaded entry points of older client APIs with
/// one tagged value.
#[derive(Debug, Clone)]
pub enum SearchRegion {
    /// Radial search around explicit coordinates, degrees
    RaDecSize {
        /// Right ascension of the center
        ra: f64,
        /// Declination of the center
        dec: f64,
        /// Search radius
        size: f64,
    },
    /// Radial search around a coordinate pair
    CenterSize {
        /// `(ra, dec)` center, degrees
        pos: (f64, f64),
        /// Search radius, degrees
        size: f64,
    },
    /// Polygon search over vertex coordinates, degrees
    Polygon(Vec<(f64, f64)>),
}

impl SearchRegion {
    /// The spatial-index predicate for this region.
    pub fn to_sql(&self) -> String {
        match self {
            SearchRegion::RaDecSize { ra, dec, size } => {
                format!("q3c_radial_query(ra,dec,{ra},{dec},{size})")
            }
            SearchRegion::CenterSize { pos, size } => {
                format!("q3c_radial_query(ra,dec,{},{},{size})", pos.0, pos.1)
            }
            SearchRegion::Polygon(vertices) => {
                let flat: Vec<String> = vertices
                    .iter()
                    .flat_map(|(ra, dec)| [ra.to_string(), dec.to_string()])
                    .collect();
                format!("q3c_poly_query(ra,dec,ARRAY[{}])", flat.join(","))
            }
        }
    }
}

/// An identifier list in wire form.
#[derive(Debug, Clone)]
pub struct IdList(String);

impl IdList {
    /// Wrap an already-formatted wire string.
    pub fn raw(wire: &str) -> Self {
        IdList(wire.to_string())
    }

    /// Format packed identifiers.
    pub fn from_ids(ids: &[u64]) -> Self {
        IdList(
            ids.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Format `(plate, mjd, fiber)` tuples.
    pub fn from_tuples(tuples: &[(u32, u32, u32)]) -> Self {
        IdList(
            tuples
                .iter()
                .map(|(p, m, f)| format!("({p},{m},{f})"))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    /// The wire spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of top-level entries (tuples count as one).
    pub fn len(&self) -> usize {
        if self.0.contains('(') {
            self.0.matches('(').count()
        } else {
            self.0.split(',').filter(|t| !t.trim().is_empty()).count()
        }
    }

    /// True when the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Waterfall request options.
#[derive(Debug, Clone)]
pub struct StackOptions {
    /// `(xscale, yscale)` relative resize
    pub scale: (f32, f32),
    /// Stripe thickness in rows
    pub thickness: u32,
    /// Invert intensities
    pub inverse: bool,
    /// Colormap name
    pub cmap: String,
    /// Absolute width, 0 for native
    pub width: u32,
    /// Absolute height, 0 for native
    pub height: u32,
}

impl Default for StackOptions {
    fn default() -> Self {
        StackOptions {
            scale: (1.0, 1.0),
            thickness: 1,
            inverse: false,
            cmap: "gray".into(),
            width: 0,
            height: 0,
        }
    }
}

/// Blocking client for the spectro service.
#[derive(Debug, Clone)]
pub struct SpecClient {
    svc_url: String,
    context: String,
    profile: String,
    timeout: u64,
    debug: bool,
    http: reqwest::blocking::Client,
}

impl SpecClient {
    /// Create a client for the service at `svc_url` (including the
    /// `/spec` prefix).
    pub fn new(svc_url: &str) -> Self {
        let debug = Path::new(DEBUG_SENTINEL).exists();
        if debug {
            log::debug!("client debug enabled by {DEBUG_SENTINEL}");
        }
        SpecClient {
            svc_url: svc_url.trim_end_matches('/').to_string(),
            context: "default".into(),
            profile: "default".into(),
            timeout: DEFAULT_TIMEOUT_SECS,
            debug,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Select the dataset context for subsequent calls.
    pub fn set_context(&mut self, context: &str) {
        self.context = context.to_string();
    }

    /// The selected dataset context.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Select the service profile for subsequent calls.
    pub fn set_profile(&mut self, profile: &str) {
        self.profile = profile.to_string();
    }

    /// The selected service profile.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Override the request timeout, seconds.
    pub fn set_timeout(&mut self, secs: u64) {
        self.timeout = secs;
    }

    fn check(&self, body: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        // Error bodies are short text; avoid copying large payloads.
        if body.len() < 4096 {
            if let Ok(text) = std::str::from_utf8(&body) {
                if text.starts_with("Error:") || text.starts_with("Param Error:") {
                    return Err(ClientError::Service(text.to_string()));
                }
            }
        }
        Ok(body)
    }

    fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .http
            .get(format!("{}{path}", self.svc_url))
            .query(query)
            .header("X-DL-TimeoutRequest", self.timeout.to_string())
            .timeout(Duration::from_secs(self.timeout))
            .send()?;
        self.check(resp.bytes()?.to_vec())
    }

    fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<Vec<u8>, ClientError> {
        if self.debug {
            log::debug!("POST {}{path}", self.svc_url);
        }
        let resp = self
            .http
            .post(format!("{}{path}", self.svc_url))
            .form(form)
            .header("X-DL-TimeoutRequest", self.timeout.to_string())
            .timeout(Duration::from_secs(self.timeout))
            .send()?;
        self.check(resp.bytes()?.to_vec())
    }

    /// Liveness probe.
    pub fn is_alive(&self) -> bool {
        self.http
            .get(format!("{}/ping", self.svc_url))
            .timeout(Duration::from_secs(5))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Enumerate service profiles in the requested format.
    pub fn profiles(&self, format: &str) -> Result<String, ClientError> {
        let body = self.get_bytes("/profiles", &[("format", format.to_string())])?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Enumerate dataset contexts in the requested format.
    pub fn contexts(&self, format: &str) -> Result<String, ClientError> {
        let body = self.get_bytes("/contexts", &[("format", format.to_string())])?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Enumerate a context's catalogs.
    pub fn catalogs(&self, context: &str, format: &str) -> Result<String, ClientError> {
        let body = self.get_bytes(
            "/catalogs",
            &[
                ("context", context.to_string()),
                ("format", format.to_string()),
            ],
        )?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Query for spectrum identifiers inside a search region.
    ///
    /// `constraint` is appended to the WHERE clause, or verbatim when it
    /// begins with ORDER/LIMIT.
    pub fn query(
        &self,
        region: &SearchRegion,
        constraint: Option<&str>,
    ) -> Result<Vec<u64>, ClientError> {
        let mut cond = region.to_sql();
        if let Some(extra) = constraint {
            let extra = extra.trim();
            if !extra.is_empty() {
                let head = extra.to_ascii_lowercase();
                if head.starts_with("order") || head.starts_with("limit") {
                    cond.push(' ');
                    cond.push_str(extra);
                } else {
                    cond.push_str(" AND ");
                    cond.push_str(extra);
                }
            }
        }

        let body = self.get_bytes(
            "/query",
            &[
                ("fields", "specobjid".to_string()),
                ("cond", cond),
                ("context", self.context.clone()),
                ("profile", self.profile.clone()),
            ],
        )?;
        let text = String::from_utf8_lossy(&body);
        let mut ids = Vec::new();
        for line in text.lines().skip(1) {
            let cell = line.split(',').next().unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            ids.push(
                cell.parse::<u64>()
                    .map_err(|_| ClientError::Service(format!("bad identifier cell '{cell}'")))?,
            );
        }
        Ok(ids)
    }

    fn spec_form(&self, ids: &IdList, align: bool, w0: f64, w1: f64) -> Vec<(&'static str, String)> {
        vec![
            ("id_list", ids.as_str().to_string()),
            ("values", "all".into()),
            ("format", "npy".into()),
            ("align", align.to_string()),
            ("w0", w0.to_string()),
            ("w1", w1.to_string()),
            ("context", self.context.clone()),
            ("profile", self.profile.clone()),
            ("debug", self.debug.to_string()),
        ]
    }

    /// The common wavelength span of an identifier list.
    pub fn list_span(&self, ids: &IdList) -> Result<(f64, f64), ClientError> {
        let body = self.post_form("/listSpan", &self.spec_form(ids, false, 0.0, 0.0))?;
        let v: serde_json::Value = serde_json::from_slice(&body)?;
        let w0 = v["w0"].as_f64().unwrap_or(0.0);
        let w1 = v["w1"].as_f64().unwrap_or(0.0);
        Ok((w0, w1))
    }

    /// Retrieve spectra unaligned, each at its native length.
    ///
    /// Issues one request per identifier so rows come back as
    /// independent records in input order.
    pub fn get_spec(&self, ids: &IdList) -> Result<Vec<SpectrumRecord>, ClientError> {
        let mut out = Vec::new();
        for id in crate::id::parse::split_tokens(ids.as_str()) {
            let one = IdList::raw(&id);
            let body = self.post_form("/getSpec", &self.spec_form(&one, false, 0.0, 0.0))?;
            let payload = npy::decode(&body)?;
            out.extend(payload.into_rows()?);
        }
        Ok(out)
    }

    /// Retrieve spectra aligned onto a common wavelength span.
    ///
    /// The span is computed server-side via `/listSpan`, then the whole
    /// stack is fetched in one request and split into rows.
    pub fn get_spec_aligned(&self, ids: &IdList) -> Result<Vec<SpectrumRecord>, ClientError> {
        let (w0, w1) = self.list_span(ids)?;
        let body = self.post_form("/getSpec", &self.spec_form(ids, true, w0, w1))?;
        let payload = npy::decode(&body)?;
        Ok(payload.into_rows()?)
    }

    /// Retrieve the raw authoritative file for a single identifier.
    pub fn get_spec_fits(&self, id: u64) -> Result<Vec<u8>, ClientError> {
        let ids = IdList::from_ids(&[id]);
        let mut form = self.spec_form(&ids, false, 0.0, 0.0);
        for slot in form.iter_mut() {
            if slot.0 == "format" {
                slot.1 = "fits".into();
            }
        }
        self.post_form("/getSpec", &form)
    }

    /// Fetch the preview plot for one identifier.
    pub fn preview(&self, id: u64) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(
            "/preview",
            &[
                ("id", id.to_string()),
                ("context", self.context.clone()),
                ("profile", self.profile.clone()),
            ],
        )
    }

    /// Fetch a grid mosaic page of preview plots.
    ///
    /// The window `nx * ny` starting at `page` is selected client-side,
    /// mirroring the paging of the service's older clients.
    pub fn plot_grid(
        &self,
        ids: &[u64],
        nx: usize,
        ny: usize,
        page: usize,
    ) -> Result<Vec<u8>, ClientError> {
        let cell = nx * ny;
        let window: &[u64] = if cell >= ids.len() {
            ids
        } else {
            let start = (page * cell).min(ids.len());
            let end = (start + cell).min(ids.len());
            &ids[start..end]
        };
        self.post_form(
            "/plotGrid",
            &[
                ("id_list", IdList::from_ids(window).as_str().to_string()),
                ("ncols", ny.to_string()),
                ("context", self.context.clone()),
                ("profile", self.profile.clone()),
            ],
        )
    }

    /// Fetch the z-scaled waterfall of an identifier list.
    pub fn stacked_image(&self, ids: &IdList, opts: &StackOptions) -> Result<Vec<u8>, ClientError> {
        self.post_form(
            "/stackedImage",
            &[
                ("id_list", ids.as_str().to_string()),
                ("xscale", opts.scale.0.to_string()),
                ("yscale", opts.scale.1.to_string()),
                ("thickness", opts.thickness.to_string()),
                ("inverse", opts.inverse.to_string()),
                ("cmap", opts.cmap.clone()),
                ("width", opts.width.to_string()),
                ("height", opts.height.to_string()),
                ("context", self.context.clone()),
                ("profile", self.profile.clone()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_sql() {
        let r = SearchRegion::RaDecSize {
            ra: 30.0,
            dec: 1.0,
            size: 0.5,
        };
        assert_eq!(r.to_sql(), "q3c_radial_query(ra,dec,30,1,0.5)");

        let p = SearchRegion::Polygon(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(p.to_sql(), "q3c_poly_query(ra,dec,ARRAY[0,0,1,0,1,1])");
    }

    #[test]
    fn test_id_list_formatting() {
        let ids = IdList::from_ids(&[1, 2, 3]);
        assert_eq!(ids.as_str(), "1,2,3");
        assert_eq!(ids.len(), 3);

        let tuples = IdList::from_tuples(&[(1963, 54331, 19), (1963, 54331, 20)]);
        assert_eq!(tuples.as_str(), "(1963,54331,19) (1963,54331,20)");
        assert_eq!(tuples.len(), 2);
        assert!(!tuples.is_empty());
    }
}
