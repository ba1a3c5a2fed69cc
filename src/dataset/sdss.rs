use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogError};
use crate::id::{CanonicalId, FieldSpec, ReductionVersion, SpecTuple, WildcardTuple};
use crate::spectrum::{fits, npy, SpectrumRecord};

use super::locate::{Extension, Locator};
use super::{CatalogQuery, DataFormat, DatasetError};

/// The catalog's id column.  The external schema stores the packed
/// identifier as a signed BIGINT, so WHERE clauses cast the unsigned id
/// through two's complement and result columns are re-typed back to u64
/// before CSV emission (see `retype_id_column`).
const PRIMARY_KEY: &str = "specobjid";

/// Metadata table consulted for wildcard expansion.  Always the current
/// release: older releases are not guaranteed to carry the metadata
/// columns, so expansion is pinned here regardless of the requested
/// release.
const METADATA_TABLE: &str = "sdss_dr16.specobj";

/// Permitted RUN2D values per SDSS data release, in probe order.
pub fn run2d_for_release(release: &str) -> Vec<ReductionVersion> {
    let names: &[&str] = match release {
        "dr16" => &["26", "103", "104", "v5_13_0"],
        "dr15" | "dr14" => &["26", "103", "104", "v5_10_0"],
        "dr13" => &["26", "103", "104", "v5_9_0"],
        "dr12" => &["26", "103", "104", "v5_7_0", "v5_7_2"],
        "dr11" => &["26", "103", "104", "v5_6_5"],
        "dr10" => &["26", "103", "104", "v5_5_12"],
        "dr9" => &["26", "103", "104", "v5_4_45"],
        "dr8" => &["26", "103", "104"],
        _ => &["26", "103", "104", "v5_13_0"],
    };
    names
        .iter()
        .filter_map(|n| ReductionVersion::parse(n).ok())
        .collect()
}

/// Dataset strategy for the SDSS spectral family, parameterized by
/// release.
#[derive(Debug, Clone)]
pub struct SdssDataset {
    release: String,
    cache_root: PathBuf,
    fits_root: PathBuf,
    run2d: Vec<ReductionVersion>,
    catalog: Arc<CatalogClient>,
}

impl SdssDataset {
    /// Build a strategy for `release` with the given file roots.
    pub fn new(
        release: &str,
        cache_root: PathBuf,
        fits_root: PathBuf,
        catalog: Arc<CatalogClient>,
    ) -> Self {
        SdssDataset {
            release: release.to_string(),
            run2d: run2d_for_release(release),
            cache_root,
            fits_root,
            catalog,
        }
    }

    /// The data release this strategy serves.
    pub fn release(&self) -> &str {
        &self.release
    }

    fn locator(&self) -> Locator<'_> {
        Locator::new(&self.release, &self.cache_root, &self.fits_root, &self.run2d)
    }

    /// Resolve an identifier to its spectrum file.
    ///
    /// For the cached format the whole resolution is retried against the
    /// authoritative FITS layout before giving up.
    pub fn data_path(&self, id: &CanonicalId, fmt: DataFormat) -> Result<PathBuf, DatasetError> {
        let coords = id.coordinates();
        let locator = self.locator();
        match fmt {
            DataFormat::Fits => locator.resolve(&coords, Extension::Fits),
            DataFormat::Npy => locator
                .resolve(&coords, Extension::Npy)
                .or_else(|| locator.resolve(&coords, Extension::Fits)),
        }
        .ok_or_else(|| DatasetError::NotFound(format!("no spectrum file for {coords}")))
    }

    /// Resolve an identifier to its preview plot.
    pub fn preview_path(&self, id: &CanonicalId) -> Result<PathBuf, DatasetError> {
        let coords = id.coordinates();
        self.locator()
            .resolve(&coords, Extension::Png)
            .ok_or_else(|| DatasetError::NotFound(format!("no preview for {coords}")))
    }

    /// Decode the file at `path` into a row-array record.
    pub fn get_data(&self, path: &Path) -> Result<SpectrumRecord, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let bytes = std::fs::read(path).map_err(crate::spectrum::FormatError::Io)?;
        let record = match ext.as_str() {
            "npy" => npy::decode(&bytes)?.record,
            "fits" => fits::decode_table(&bytes)?,
            other => {
                return Err(crate::spectrum::FormatError::UnsupportedFormat(format!(
                    ".{other} file"
                ))
                .into())
            }
        };
        Ok(record)
    }

    /// Run a tabular-metadata query and return CSV bytes.
    pub async fn query(&self, q: &CatalogQuery) -> Result<String, DatasetError> {
        let mut projection = q.fields.trim().to_string();
        if projection.is_empty() {
            projection = PRIMARY_KEY.to_string();
        } else if !projection
            .split(',')
            .any(|f| f.trim().eq_ignore_ascii_case(PRIMARY_KEY))
        {
            projection = format!("{PRIMARY_KEY},{projection}");
        }

        let mut sql = format!("SELECT {projection} FROM {}", q.catalog);
        if let Some(id) = q.id {
            sql.push_str(&format!(" WHERE {PRIMARY_KEY} = {}", id as i64));
        } else {
            let cond = q.cond.trim();
            if !cond.is_empty() {
                let head = cond.to_ascii_lowercase();
                if head.starts_with("order") || head.starts_with("limit") {
                    sql.push(' ');
                    sql.push_str(cond);
                } else {
                    sql.push_str(" WHERE ");
                    sql.push_str(cond);
                }
            }
        }

        let csv_text = self.catalog.query_csv(&sql).await?;
        retype_id_column(&csv_text).map_err(DatasetError::from)
    }

    /// Expand a wildcarded tuple against the metadata catalog.
    pub async fn expand_id(&self, w: &WildcardTuple) -> Result<Vec<SpecTuple>, DatasetError> {
        if matches!(w.plate, FieldSpec::Any) && matches!(w.mjd, FieldSpec::Any) {
            return Err(DatasetError::UnderconstrainedWildcard(
                "at least one of plate or mjd must be given".into(),
            ));
        }

        let mut clauses = Vec::new();
        if let Some(c) = numeric_clause("plate", &w.plate) {
            clauses.push(c);
        }
        if let Some(c) = numeric_clause("mjd", &w.mjd) {
            clauses.push(c);
        }
        if let Some(c) = numeric_clause("fiberid", &w.fiber) {
            clauses.push(c);
        }
        if let Some(c) = string_clause("run2d", &w.run2d) {
            clauses.push(c);
        }
        if let Some(survey) = &w.survey {
            if survey != "*" && !survey.is_empty() {
                clauses.push(format!("survey = '{}'", survey.replace('\'', "")));
            }
        }

        let sql = format!(
            "SELECT plate,mjd,fiberid,run2d,survey FROM {METADATA_TABLE} WHERE {}",
            clauses.join(" AND ")
        );
        let body = self.catalog.query_csv(&sql).await?;
        parse_expansion_csv(&body).map_err(DatasetError::from)
    }
}

fn numeric_clause(col: &str, spec: &FieldSpec) -> Option<String> {
    match spec {
        FieldSpec::Any => None,
        FieldSpec::One(v) => Some(format!("{col} = {}", v.trim())),
        FieldSpec::List(vs) => Some(format!(
            "{col} IN ({})",
            vs.iter().map(|v| v.trim()).collect::<Vec<_>>().join(",")
        )),
        FieldSpec::Range(a, b) => Some(format!("{col} BETWEEN {a} AND {b}")),
    }
}

fn string_clause(col: &str, spec: &FieldSpec) -> Option<String> {
    let quote = |v: &str| format!("'{}'", v.trim().replace('\'', ""));
    match spec {
        FieldSpec::Any => None,
        FieldSpec::One(v) => Some(format!("{col} = {}", quote(v))),
        FieldSpec::List(vs) => Some(format!(
            "{col} IN ({})",
            vs.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
        )),
        FieldSpec::Range(a, b) => Some(format!("{col} BETWEEN '{a}' AND '{b}'")),
    }
}

/// Rewrite the id column from the catalog's signed spelling back to the
/// unsigned wire form.
fn retype_id_column(csv_text: &str) -> Result<String, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| CatalogError::NotCsv(e.to_string()))?
        .clone();
    let id_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(PRIMARY_KEY));

    let Some(id_col) = id_col else {
        return Ok(csv_text.to_string());
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| CatalogError::NotCsv(e.to_string()))?;
    for row in reader.records() {
        let row = row.map_err(|e| CatalogError::NotCsv(e.to_string()))?;
        let fields: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i == id_col {
                    if let Ok(signed) = v.trim().parse::<i64>() {
                        return (signed as u64).to_string();
                    }
                }
                v.to_string()
            })
            .collect();
        writer
            .write_record(&fields)
            .map_err(|e| CatalogError::NotCsv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CatalogError::NotCsv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CatalogError::NotCsv(e.to_string()))
}

/// Decode expansion rows into tuples, in catalog order.
fn parse_expansion_csv(body: &str) -> Result<Vec<SpecTuple>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let mut out = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| CatalogError::NotCsv(e.to_string()))?;
        if row.len() < 5 {
            return Err(CatalogError::NotCsv(format!(
                "expected 5 expansion columns, got {}",
                row.len()
            )));
        }
        let parse_u32 = |i: usize| -> Result<u32, CatalogError> {
            row[i]
                .trim()
                .parse()
                .map_err(|_| CatalogError::NotCsv(format!("bad numeric cell '{}'", &row[i])))
        };
        let run2d = match row[3].trim() {
            "" => None,
            spelled => Some(
                ReductionVersion::parse(spelled)
                    .map_err(|_| CatalogError::NotCsv(format!("bad run2d cell '{spelled}'")))?,
            ),
        };
        // Sub-surveys of the main survey share its file tree.
        let survey = match row[4].trim() {
            s if s.starts_with("segue") || s.is_empty() => "sdss".to_string(),
            s => s.to_string(),
        };
        out.push(SpecTuple {
            plate: parse_u32(0)?,
            mjd: parse_u32(1)?,
            fiber: parse_u32(2)?,
            run2d,
            survey,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run2d_probe_order() {
        let dr16 = run2d_for_release("dr16");
        let spelled: Vec<String> = dr16.iter().map(|r| r.to_string()).collect();
        assert_eq!(spelled, vec!["26", "103", "104", "v5_13_0"]);

        let dr12 = run2d_for_release("dr12");
        assert_eq!(dr12.len(), 5);
    }

    #[test]
    fn test_numeric_clauses() {
        assert_eq!(
            numeric_clause("plate", &FieldSpec::One("1963".into())),
            Some("plate = 1963".into())
        );
        assert_eq!(
            numeric_clause("plate", &FieldSpec::List(vec!["1962".into(), "1963".into()])),
            Some("plate IN (1962,1963)".into())
        );
        assert_eq!(
            numeric_clause("fiberid", &FieldSpec::Range(100, 200)),
            Some("fiberid BETWEEN 100 AND 200".into())
        );
        assert_eq!(numeric_clause("mjd", &FieldSpec::Any), None);
    }

    #[test]
    fn test_retype_id_column_reinterprets_signed() {
        let csv_in = "specobjid,z\n-1,0.5\n123,0.7\n";
        let out = retype_id_column(csv_in).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("specobjid,z"));
        assert_eq!(lines.next(), Some("18446744073709551615,0.5"));
        assert_eq!(lines.next(), Some("123,0.7"));
    }

    #[test]
    fn test_parse_expansion_normalizes_segue() {
        let body = "plate,mjd,fiberid,run2d,survey\n\
                    1963,54331,1,103,segue1\n\
                    1963,54331,2,v5_13_0,eboss\n";
        let tuples = parse_expansion_csv(body).unwrap();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].survey, "sdss");
        assert_eq!(tuples[1].survey, "eboss");
        assert_eq!(tuples[0].run2d, Some(ReductionVersion::Numeric(103)));
    }
}
