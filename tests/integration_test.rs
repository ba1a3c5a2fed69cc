//! End-to-end exercises of the public API: locate a spectrum on disk,
//! load it, align a set, and serialize the stack.

use std::path::Path;
use std::sync::Arc;

use specserver::catalog::CatalogClient;
use specserver::dataset::{DataFormat, Dataset, SdssDataset};
use specserver::id::{parse_id_list, CanonicalId, IdToken, ReductionVersion, SpecObjId, SpecTuple};
use specserver::prelude::*;
use specserver::spectrum::{columns, loader, npy};

fn sample_record(start: f64, len: usize) -> SpectrumRecord {
    let disp = 0.0001;
    let loglam: Vec<f32> = (0..len).map(|i| (start + disp * i as f64) as f32).collect();
    let flux: Vec<f32> = (0..len).map(|i| 1.0 + (i % 5) as f32).collect();
    SpectrumRecord::new(vec![
        Column::new(columns::LOGLAM, ColumnData::F32(loglam)),
        Column::new(columns::FLUX, ColumnData::F32(flux)),
        Column::new(columns::IVAR, ColumnData::F32(vec![1.0; len])),
        Column::new(columns::MODEL, ColumnData::F32(vec![0.0; len])),
        Column::new(columns::SKY, ColumnData::F32(vec![0.0; len])),
    ])
    .unwrap()
}

fn dataset(root: &Path) -> Dataset {
    let catalog = Arc::new(CatalogClient::new("http://localhost:0", 1));
    Dataset::Sdss(SdssDataset::new(
        "dr16",
        root.to_path_buf(),
        root.to_path_buf(),
        catalog,
    ))
}

fn write_cached(root: &Path, run2d: &str, fiber: u32, start: f64) {
    let dir = root.join(format!("dr16/sdss/spectro/redux/{run2d}/spectra/1963"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("spec-1963-54331-{fiber:04}.npy")),
        npy::encode_1d(&sample_record(start, 200)),
    )
    .unwrap();
}

#[tokio::test]
async fn test_load_by_packed_id() {
    let dir = tempfile::tempdir().unwrap();
    write_cached(dir.path(), "103", 19, 3.55);

    let ds = dataset(dir.path());
    let run2d = ReductionVersion::parse("103").unwrap();
    let id = CanonicalId::Packed(SpecObjId::pack(1963, 54331, 19, &run2d).unwrap());

    let (path, rec) = loader::load(&ds, &id, None).await.unwrap();
    assert!(path.ends_with("spec-1963-54331-0019.npy"));
    assert_eq!(rec.len(), 200);
    assert!(rec.validate().is_ok());
}

#[tokio::test]
async fn test_locator_probes_run2d_order() {
    // No run2d on the tuple: the locator walks the release's permitted
    // versions in order and finds the file under 103.
    let dir = tempfile::tempdir().unwrap();
    write_cached(dir.path(), "103", 20, 3.55);

    let ds = dataset(dir.path());
    let id = CanonicalId::Tuple(SpecTuple::new(1963, 54331, 20));
    let (path, _) = loader::load(&ds, &id, None).await.unwrap();
    assert!(path.to_string_lossy().contains("/redux/103/"));
}

#[tokio::test]
async fn test_locator_glob_fallback() {
    // Spectrum only exists under the secondary spectra/full layout.
    let dir = tempfile::tempdir().unwrap();
    let full = dir
        .path()
        .join("dr16/eboss/spectro/redux/v5_13_0/spectra/full/1963");
    std::fs::create_dir_all(&full).unwrap();
    std::fs::write(
        full.join("spec-1963-54331-0021.npy"),
        npy::encode_1d(&sample_record(3.55, 200)),
    )
    .unwrap();

    let ds = dataset(dir.path());
    let id = CanonicalId::Tuple(SpecTuple::new(1963, 54331, 21));
    let (path, _) = loader::load(&ds, &id, None).await.unwrap();
    assert!(path.to_string_lossy().contains("/spectra/full/"));
}

#[tokio::test]
async fn test_missing_spectrum_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let ds = dataset(dir.path());
    let id = CanonicalId::Tuple(SpecTuple::new(1963, 54331, 99));
    match loader::load(&ds, &id, None).await {
        Err(DatasetError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_data_path_fits_does_not_fall_back_to_cache() {
    let dir = tempfile::tempdir().unwrap();
    write_cached(dir.path(), "103", 22, 3.55);
    let ds = dataset(dir.path());
    let id = CanonicalId::Tuple(SpecTuple::new(1963, 54331, 22));

    assert!(ds.data_path(&id, DataFormat::Npy).is_ok());
    assert!(ds.data_path(&id, DataFormat::Fits).is_err());
}

#[test]
fn test_wire_to_stack_roundtrip() {
    // Parse a mixed wire list, align the records, serialize the stack,
    // and read it back: order and geometry survive.
    let tokens =
        parse_id_list("(1963,54331,19,'103') (1963,54331,20,'103')").unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| matches!(t, IdToken::Literal(_))));

    let records = vec![sample_record(3.55, 300), sample_record(3.57, 300)];
    let span = span_of(&records).unwrap();
    assert_eq!(span.n, 2);

    let rows = align_records(&records, span.w0, span.w1).unwrap();
    let bytes = npy::encode_2d(&rows).unwrap();
    let payload = npy::decode(&bytes).unwrap();
    assert_eq!(payload.shape[0], 2);

    let back = payload.into_rows().unwrap();
    assert_eq!(back, rows);
    // Row 0 keeps its unpadded leading flux; row 1 is left-padded.
    assert_eq!(back[0].flux().unwrap()[0], 1.0);
    assert_eq!(back[1].flux().unwrap()[0], 0.0);
}

#[test]
fn test_unaligned_rows_keep_native_lengths() {
    let records = vec![
        sample_record(3.55, 120),
        sample_record(3.60, 80),
        sample_record(3.52, 250),
    ];
    // Serialize each unaligned record independently, then parse the
    // concatenation back in order.
    let mut bytes = Vec::new();
    for rec in &records {
        bytes.extend(npy::encode_1d(rec));
    }

    let mut offset = 0;
    for rec in &records {
        let chunk = &bytes[offset..];
        let payload = npy::decode(chunk).unwrap();
        assert_eq!(payload.record.len(), rec.len());
        offset += npy::encode_1d(rec).len();
    }
    assert_eq!(offset, bytes.len());
}
