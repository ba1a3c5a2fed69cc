//! # Alignment Engine
//!
//! Pads a set of spectra to a common log-wavelength span so they stack
//! into a rectangular row array.  Spectra are sampled uniformly in
//! log10 wavelength, so padding is computed in that space: each row is
//! extended with zero-valued samples on both ends and its wavelength
//! axis rewritten as a uniform ramp from `w0` to `w1`.
//!
//! Dispersion is recomputed per spectrum rather than assumed constant
//! across the set; surveys in practice fix it, but the engine only
//! requires that the padded rows agree in length when stacked.

use crate::spectrum::{columns, ColumnData, FormatError, SpectrumRecord};

mod error;

#[cfg(test)]
mod tests;

pub use error::AlignError;

/// The common wavelength span of an identifier set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Minimum first-sample loglam across the set
    pub w0: f64,
    /// Maximum last-sample loglam across the set
    pub w1: f64,
    /// Number of spectra inspected
    pub n: usize,
}

/// Compute the common span over already-loaded records.
pub fn span_of(records: &[SpectrumRecord]) -> Result<Span, AlignError> {
    if records.is_empty() {
        return Err(AlignError::EmptyList);
    }
    let mut w0 = f64::INFINITY;
    let mut w1 = f64::NEG_INFINITY;
    for rec in records {
        let loglam = rec.loglam()?;
        let (first, last) = match (loglam.first(), loglam.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => {
                return Err(AlignError::Format(FormatError::MalformedSpectrum(
                    "empty wavelength axis".into(),
                )))
            }
        };
        w0 = w0.min(first);
        w1 = w1.max(last);
    }
    Ok(Span {
        w0,
        w1,
        n: records.len(),
    })
}

/// Round to nearest, ties to even.
fn round_half_even(x: f64) -> f64 {
    let floor = x.floor();
    if (x - floor - 0.5).abs() < f64::EPSILON {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        x.round()
    }
}

/// Left/right pad counts for one spectrum against a target span.
pub fn pad_counts(first: f64, last: f64, len: usize, w0: f64, w1: f64) -> (usize, usize) {
    let disp = (last - first) / len as f64;
    let lpad = round_half_even(((first - w0) / disp).max(0.0)) as usize;
    let rpad = round_half_even(((w1 - last) / disp).max(0.0)) as usize;
    (lpad, rpad)
}

/// A uniform loglam ramp with exact endpoints.
fn ramp(w0: f64, w1: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            if i == 0 {
                w0
            } else if i == len - 1 {
                w1
            } else {
                w0 + (w1 - w0) * (i as f64) / ((len - 1) as f64)
            }
        })
        .collect()
}

/// Pad one record to the target span.
///
/// A record whose span already equals the target passes through
/// untouched.  Otherwise every column is zero-padded and the wavelength
/// axis replaced by the uniform ramp, so aligned rows agree on
/// `loglam[0] = w0` and `loglam[len-1] = w1` exactly.
pub fn pad_to_span(rec: &SpectrumRecord, w0: f64, w1: f64) -> Result<SpectrumRecord, AlignError> {
    let loglam = rec.loglam()?;
    let (first, last) = match (loglam.first(), loglam.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => {
            return Err(AlignError::Format(FormatError::MalformedSpectrum(
                "empty wavelength axis".into(),
            )))
        }
    };

    let (lpad, rpad) = pad_counts(first, last, loglam.len(), w0, w1);
    if lpad == 0 && rpad == 0 {
        return Ok(rec.clone());
    }

    let mut padded = rec.padded(lpad, rpad);
    let new_len = padded.len();
    let axis = ramp(w0, w1, new_len);
    let data = match rec
        .column(columns::LOGLAM)
        .map(|c| &c.data)
    {
        Some(ColumnData::F64(_)) => ColumnData::F64(axis),
        _ => ColumnData::F32(axis.iter().map(|v| *v as f32).collect()),
    };
    padded.set_column(columns::LOGLAM, data)?;
    Ok(padded)
}

/// Pad every record to the span and verify they form a rectangle.
///
/// Row order follows input order.  Rows that disagree in padded length
/// (pathological dispersion spread) fail rather than stack raggedly.
pub fn align_records(
    records: &[SpectrumRecord],
    w0: f64,
    w1: f64,
) -> Result<Vec<SpectrumRecord>, AlignError> {
    let rows: Vec<SpectrumRecord> = records
        .iter()
        .map(|r| pad_to_span(r, w0, w1))
        .collect::<Result<_, _>>()?;
    if let Some(first) = rows.first() {
        for (k, row) in rows.iter().enumerate() {
            if row.len() != first.len() {
                return Err(AlignError::LengthMismatch {
                    row: k,
                    len: row.len(),
                    expected: first.len(),
                });
            }
        }
    }
    Ok(rows)
}
