use super::*;
use crate::spectrum::{columns, Column, ColumnData, SpectrumRecord};

/// A spectrum sampled uniformly in loglam from `start`, `len` samples at
/// step `disp`.
fn spectrum(start: f64, disp: f64, len: usize) -> SpectrumRecord {
    let loglam: Vec<f32> = (0..len).map(|i| (start + disp * i as f64) as f32).collect();
    let flux: Vec<f32> = (0..len).map(|i| 1.0 + i as f32).collect();
    SpectrumRecord::new(vec![
        Column::new(columns::LOGLAM, ColumnData::F32(loglam)),
        Column::new(columns::FLUX, ColumnData::F32(flux)),
        Column::new(columns::IVAR, ColumnData::F32(vec![1.0; len])),
        Column::new(columns::MODEL, ColumnData::F32(vec![0.0; len])),
        Column::new(columns::SKY, ColumnData::F32(vec![0.0; len])),
    ])
    .unwrap()
}

#[test]
fn test_span_over_two_spectra() {
    let a = spectrum(3.55, 0.01, 41); // 3.55 .. 3.95
    let b = spectrum(3.56, 0.01, 41); // 3.56 .. 3.96
    let span = span_of(&[a, b]).unwrap();
    assert!((span.w0 - 3.55).abs() < 1e-6);
    assert!((span.w1 - 3.96).abs() < 1e-6);
    assert_eq!(span.n, 2);
}

#[test]
fn test_span_of_empty_list_fails() {
    assert!(matches!(span_of(&[]), Err(AlignError::EmptyList)));
}

#[test]
fn test_pad_counts_match_definition() {
    // disp = (last - first) / len = 0.4 / 40 = 0.01
    let (lpad, rpad) = pad_counts(3.55, 3.95, 40, 3.54, 3.97);
    assert_eq!(lpad, 1); // (3.55 - 3.54) / 0.01
    assert_eq!(rpad, 2); // (3.97 - 3.95) / 0.01
}

#[test]
fn test_pad_rounds_half_to_even() {
    // 0.5 sample of padding on each side rounds to the even count.
    let (lpad, _) = pad_counts(3.555, 3.955, 40, 3.55, 3.955);
    assert_eq!(lpad, 0); // 0.5 -> 0
    let (lpad, _) = pad_counts(3.565, 3.965, 40, 3.55, 3.965);
    assert_eq!(lpad, 2); // 1.5 -> 2
}

#[test]
fn test_matching_span_passes_through() {
    let rec = spectrum(3.55, 0.01, 41);
    let loglam = rec.loglam().unwrap();
    let padded = pad_to_span(&rec, loglam[0], loglam[40]).unwrap();
    assert_eq!(padded, rec);
}

#[test]
fn test_padded_rows_share_axis_endpoints() {
    let a = spectrum(3.55, 0.01, 41);
    let b = spectrum(3.56, 0.01, 41);
    let span = span_of(std::slice::from_ref(&a)).unwrap();
    let span_b = span_of(std::slice::from_ref(&b)).unwrap();
    let (w0, w1) = (span.w0.min(span_b.w0), span.w1.max(span_b.w1));

    let rows = align_records(&[a, b], w0, w1).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), rows[1].len());
    for row in &rows {
        let axis = row.loglam().unwrap();
        assert!((axis[0] - w0).abs() < 1e-6);
        assert!((axis[axis.len() - 1] - w1).abs() < 1e-6);
    }
}

#[test]
fn test_alignment_is_span_idempotent() {
    let a = spectrum(3.55, 0.0001, 400);
    let b = spectrum(3.57, 0.0001, 400);
    let span = span_of(&[a.clone(), b.clone()]).unwrap();
    let rows = align_records(&[a, b], span.w0, span.w1).unwrap();

    // Running the span over aligned output returns the inputs exactly.
    let again = span_of(&rows).unwrap();
    assert_eq!(again.w0 as f32, span.w0 as f32);
    assert_eq!(again.w1 as f32, span.w1 as f32);
}

#[test]
fn test_padding_zero_fills_data_columns() {
    let a = spectrum(3.56, 0.01, 11);
    let padded = pad_to_span(&a, 3.54, 3.66).unwrap();
    let flux = padded.flux().unwrap();
    assert_eq!(padded.len(), 11 + 2); // lpad 2 (0.02 / disp ~0.0109 -> 1.83 -> 2), rpad 0
    assert_eq!(flux[0], 0.0);
    assert_eq!(flux[1], 0.0);
    assert_eq!(flux[2], 1.0);
}

#[test]
fn test_missing_loglam_is_malformed() {
    let rec = SpectrumRecord::new(vec![Column::new(
        columns::FLUX,
        ColumnData::F32(vec![1.0, 2.0]),
    )])
    .unwrap();
    assert!(matches!(
        pad_to_span(&rec, 3.5, 3.6),
        Err(AlignError::Format(_))
    ));
}

#[test]
fn test_order_preserved_through_alignment() {
    let specs: Vec<SpectrumRecord> = (0..4).map(|k| spectrum(3.55 + 0.01 * k as f64, 0.01, 21)).collect();
    let span = span_of(&specs).unwrap();
    let rows = align_records(&specs, span.w0, span.w1).unwrap();
    // Row k keeps spectrum k's flux at its shifted position.
    for (k, row) in rows.iter().enumerate() {
        let flux = row.flux().unwrap();
        assert_eq!(flux[k], 1.0, "row {k} lost its leading sample");
    }
}
