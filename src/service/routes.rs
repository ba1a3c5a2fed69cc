use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};

use crate::align;
use crate::dataset::{CatalogQuery, DataFormat, Dataset};
use crate::id::expand::expand_id_list;
use crate::render::{self, Colormap, WaterfallParams};
use crate::spectrum::{loader, npy, SpectrumRecord};

use super::{AppState, Params, SvcError};

type Handler = Result<Response, SvcError>;

fn png_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

fn binary_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response()
}

fn csv_response(text: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], text).into_response()
}

/// Validate the profile slot and resolve the context slot to a dataset.
fn dataset_of<'a>(state: &'a AppState, p: &Params) -> Result<&'a Arc<Dataset>, SvcError> {
    let profile = p.str("profile").trim();
    if !profile.is_empty() && !state.config.has_profile(profile) {
        return Err(SvcError::Param(format!("unknown profile: {profile}")));
    }
    Ok(state.registry.get(p.str("context").trim())?)
}

/// Decode the flags every request may carry.
fn common_flags(p: &Params) -> Result<(bool, bool), SvcError> {
    Ok((p.bool("debug", false)?, p.bool("verbose", false)?))
}

/// Load every identifier's record, strictly in order.
async fn load_all(
    ds: &Dataset,
    wire: &str,
    values: Option<&[String]>,
) -> Result<Vec<SpectrumRecord>, SvcError> {
    let ids = expand_id_list(ds, wire).await?;
    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        let (_, rec) = loader::load(ds, id, values).await?;
        records.push(rec);
    }
    Ok(records)
}

// ---------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------

pub(super) async fn root() -> String {
    format!("Hello from Spectro Service! {}\n", env!("CARGO_PKG_VERSION"))
}

pub(super) async fn ping() -> &'static str {
    "OK"
}

pub(super) async fn available() -> &'static str {
    "True"
}

pub(super) async fn shutdown() -> &'static str {
    // Shutdown is delegated to the process supervisor.
    log::warn!("shutdown requested over HTTP; ignoring");
    "OK"
}

pub(super) async fn toggle_debug(State(state): State<Arc<AppState>>) -> String {
    let new = !state.debug.fetch_xor(true, Ordering::Relaxed);
    log::info!("debug flag now {new}");
    if new { "True".into() } else { "False".into() }
}

// ---------------------------------------------------------------------
// Profile / context enumeration
// ---------------------------------------------------------------------

/// Render name/type/description triples in the requested format.
fn listing(entries: &[(String, String, String)], format: &str) -> Response {
    match format {
        "json" => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(name, kind, desc)| {
                    (
                        name.clone(),
                        serde_json::json!({"type": kind, "description": desc}),
                    )
                })
                .collect();
            Json(serde_json::Value::Object(map)).into_response()
        }
        "csv" => {
            let mut out = String::from("name,type,description\n");
            for (name, kind, desc) in entries {
                out.push_str(&format!("{name},{kind},{desc}\n"));
            }
            csv_response(out)
        }
        _ => {
            let mut out = String::new();
            for (name, _, desc) in entries {
                out.push_str(&format!("{name:<16} {desc}\n"));
            }
            out.into_response()
        }
    }
}

pub(super) async fn profiles(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let only = p.str("profile").trim().to_string();
    let entries: Vec<_> = state
        .config
        .profiles
        .iter()
        .filter(|(name, _)| only.is_empty() || **name == only)
        .map(|(name, cfg)| (name.clone(), cfg.kind.clone(), cfg.description.clone()))
        .collect();
    if !only.is_empty() && entries.is_empty() {
        return Err(SvcError::Param(format!("unknown profile: {only}")));
    }
    Ok(listing(&entries, p.str("format")))
}

pub(super) async fn contexts(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let only = p.str("context").trim().to_string();
    let entries: Vec<_> = state
        .config
        .contexts
        .iter()
        .filter(|(name, _)| only.is_empty() || **name == only)
        .map(|(name, cfg)| (name.clone(), cfg.kind.clone(), cfg.description.clone()))
        .collect();
    if !only.is_empty() && entries.is_empty() {
        return Err(SvcError::Param(format!("unknown context: {only}")));
    }
    Ok(listing(&entries, p.str("format")))
}

pub(super) async fn catalogs(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let name = {
        let c = p.str("context").trim();
        if c.is_empty() { "default" } else { c }
    };
    let ctx = state
        .config
        .contexts
        .get(name)
        .ok_or_else(|| SvcError::Param(format!("unknown context: {name}")))?;

    match p.str("format") {
        "csv" => {
            let mut out = String::from("catalog,description\n");
            for (cat, desc) in &ctx.catalogs {
                out.push_str(&format!("{cat},{desc}\n"));
            }
            Ok(csv_response(out))
        }
        _ => {
            let mut out = String::new();
            for (cat, desc) in &ctx.catalogs {
                out.push_str(&format!("{cat:<28} {desc}\n"));
            }
            Ok(out.into_response())
        }
    }
}

pub(super) async fn validate(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> &'static str {
    let p = Params::new(map);
    let ok = match p.str("what") {
        "context" => state.config.has_context(p.str("value")),
        "profile" => state.config.has_profile(p.str("value")),
        _ => false,
    };
    if ok { "OK" } else { "Error" }
}

// ---------------------------------------------------------------------
// Data endpoints
// ---------------------------------------------------------------------

pub(super) async fn query(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let (_debug, _verbose) = common_flags(&p)?;
    let ds = dataset_of(&state, &p)?;

    let catalog = {
        let c = p.str("catalog").trim();
        if c.is_empty() {
            format!("sdss_{}.specobj", ds.release())
        } else {
            c.to_string()
        }
    };
    let q = CatalogQuery {
        id: p.u64_opt("id")?,
        fields: p.str("fields").to_string(),
        catalog,
        cond: p.str("cond").to_string(),
    };
    let csv_text = ds.query(&q).await?;
    Ok(csv_response(csv_text))
}

pub(super) async fn get_spec(
    State(state): State<Arc<AppState>>,
    Form(map): Form<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let (_debug, _verbose) = common_flags(&p)?;
    let ds = dataset_of(&state, &p)?;

    let wire = p.required("id_list")?;
    let format = DataFormat::from_wire(p.str("format"));
    let align_rows = p.bool("align", false)?;
    let w0 = p.f64("w0", 0.0)?;
    let w1 = p.f64("w1", 0.0)?;
    let values = p.values("values");

    if format == DataFormat::Fits {
        // The authoritative file passes through raw, one id at a time.
        let ids = expand_id_list(ds, wire).await?;
        let [id] = ids.as_slice() else {
            return Err(SvcError::Param(format!(
                "fits format serves a single identifier, got {}",
                ids.len()
            )));
        };
        let path = ds.data_path(id, DataFormat::Fits)?;
        let bytes = tokio::fs::read(&path).await?;
        return Ok(binary_response(bytes));
    }

    let records = load_all(ds, wire, values.as_deref()).await?;
    if records.is_empty() {
        return Err(SvcError::Param("identifier list expanded to nothing".into()));
    }

    let bytes = if align_rows {
        let (w0, w1) = if w0 == 0.0 && w1 == 0.0 {
            let span = align::span_of(&records)?;
            (span.w0, span.w1)
        } else {
            (w0, w1)
        };
        let rows = align::align_records(&records, w0, w1)?;
        npy::encode_2d(&rows)?
    } else {
        // Unaligned spectra keep their native lengths; emit each record
        // as its own payload, concatenated in input order.
        let mut out = Vec::new();
        for rec in &records {
            out.extend(npy::encode_1d(rec));
        }
        out
    };
    Ok(binary_response(bytes))
}

pub(super) async fn preview(
    State(state): State<Arc<AppState>>,
    Query(map): Query<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let ds = dataset_of(&state, &p)?;
    let ids = expand_id_list(ds, p.required("id")?).await?;
    let id = ids
        .first()
        .ok_or_else(|| SvcError::Param("identifier expanded to nothing".into()))?;
    let path = ds.preview_path(id)?;
    let bytes = tokio::fs::read(&path).await?;
    Ok(png_response(bytes))
}

pub(super) async fn plot_grid(
    State(state): State<Arc<AppState>>,
    Form(map): Form<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let (_debug, _verbose) = common_flags(&p)?;
    let ds = dataset_of(&state, &p)?;
    let ncols = p.u32("ncols", 1)?;
    if ncols == 0 {
        return Err(SvcError::Param("ncols must be >= 1".into()));
    }

    let ids = expand_id_list(ds, p.required("id_list")?).await?;
    let mut pngs = Vec::with_capacity(ids.len());
    for id in &ids {
        let path = ds.preview_path(id)?;
        pngs.push(tokio::fs::read(&path).await?);
    }
    let png = render::compose_grid(&pngs, ncols as usize)?;
    Ok(png_response(png))
}

pub(super) async fn list_span(
    State(state): State<Arc<AppState>>,
    Form(map): Form<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let (_debug, _verbose) = common_flags(&p)?;
    let ds = dataset_of(&state, &p)?;

    let loglam_only = vec!["loglam".to_string()];
    let records = load_all(ds, p.required("id_list")?, Some(&loglam_only)).await?;
    let span = align::span_of(&records)?;
    Ok(Json(serde_json::json!({"w0": span.w0, "w1": span.w1})).into_response())
}

pub(super) async fn stacked_image(
    State(state): State<Arc<AppState>>,
    Form(map): Form<HashMap<String, String>>,
) -> Handler {
    let p = Params::new(map);
    let (_debug, _verbose) = common_flags(&p)?;
    let ds = dataset_of(&state, &p)?;

    let cmap_name = p.str("cmap");
    let cmap = Colormap::by_name(cmap_name)
        .ok_or_else(|| SvcError::Param(format!("unknown colormap: {cmap_name}")))?;
    let params = WaterfallParams {
        thickness: p.u32("thickness", 1)?,
        inverse: p.bool("inverse", false)?,
        cmap,
        xscale: p.f64("xscale", 1.0)? as f32,
        yscale: p.f64("yscale", 1.0)? as f32,
        width: p.u32("width", 0)?,
        height: p.u32("height", 0)?,
    };

    let flux_only = vec!["flux".to_string()];
    let records = load_all(ds, p.required("id_list")?, Some(&flux_only)).await?;
    let png = render::waterfall(&records, &params)?;
    Ok(png_response(png))
}
