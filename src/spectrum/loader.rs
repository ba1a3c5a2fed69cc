//! Spectrum loading: identifier in, typed record out.

use std::path::PathBuf;

use crate::dataset::{DataFormat, Dataset, DatasetError};
use crate::id::CanonicalId;

use super::{fits, npy, FormatError, SpectrumRecord};

/// Resolve an identifier to its cached array and decode it.
///
/// Resolution prefers the cached `.npy` form and falls back to the
/// authoritative FITS table, which is decoded and re-emitted in the
/// cached shape.  When `values` requests a column subset, the record is
/// repacked to those columns (plus the wavelength axis) before it is
/// handed to the alignment engine; filtering happens pre-align so the
/// response schema equals the requested schema.
pub async fn load(
    ds: &Dataset,
    id: &CanonicalId,
    values: Option<&[String]>,
) -> Result<(PathBuf, SpectrumRecord), DatasetError> {
    let path = ds.data_path(id, DataFormat::Npy)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(FormatError::Io)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let record = match ext.as_str() {
        "npy" => {
            let payload = npy::decode(&bytes)?;
            if payload.shape.len() != 1 {
                return Err(FormatError::Corrupt("cached spectrum is not 1-D".into()).into());
            }
            payload.record
        }
        "fits" => fits::decode_table(&bytes)?,
        other => return Err(FormatError::UnsupportedFormat(format!(".{other} file")).into()),
    };

    record.validate()?;
    let record = match values {
        Some(names) if !names.is_empty() => record.select(names)?,
        _ => record,
    };
    log::debug!("loaded {} rows from {}", record.len(), path.display());
    Ok((path, record))
}
