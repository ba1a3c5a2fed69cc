use super::*;

fn sample_record(n: usize, loglam0: f64, step: f64) -> SpectrumRecord {
    let loglam: Vec<f32> = (0..n).map(|i| (loglam0 + step * i as f64) as f32).collect();
    let flux: Vec<f32> = (0..n).map(|i| i as f32 * 0.5).collect();
    let ivar: Vec<f32> = vec![1.0; n];
    let model: Vec<f32> = vec![0.25; n];
    let sky: Vec<f32> = vec![0.0; n];
    SpectrumRecord::new(vec![
        Column::new(columns::LOGLAM, ColumnData::F32(loglam)),
        Column::new(columns::FLUX, ColumnData::F32(flux)),
        Column::new(columns::IVAR, ColumnData::F32(ivar)),
        Column::new(columns::MODEL, ColumnData::F32(model)),
        Column::new(columns::SKY, ColumnData::F32(sky)),
    ])
    .unwrap()
}

#[test]
fn test_record_validates_required_columns() {
    let rec = sample_record(16, 3.55, 0.0001);
    assert!(rec.validate().is_ok());

    let partial = SpectrumRecord::new(vec![Column::new(
        columns::FLUX,
        ColumnData::F32(vec![1.0, 2.0]),
    )])
    .unwrap();
    assert!(matches!(
        partial.validate(),
        Err(FormatError::MalformedSpectrum(_))
    ));
}

#[test]
fn test_record_rejects_descending_loglam() {
    let mut rec = sample_record(8, 3.55, 0.0001);
    rec.set_column(columns::LOGLAM, ColumnData::F32(vec![3.6, 3.5, 3.4, 3.3, 3.2, 3.1, 3.0, 2.9]))
        .unwrap();
    assert!(matches!(
        rec.validate(),
        Err(FormatError::MalformedSpectrum(_))
    ));
}

#[test]
fn test_select_keeps_wavelength_axis() {
    let rec = sample_record(8, 3.55, 0.0001);
    let sub = rec.select(&["flux".into()]).unwrap();
    assert!(sub.column(columns::FLUX).is_some());
    assert!(sub.column(columns::LOGLAM).is_some());
    assert!(sub.column(columns::SKY).is_none());

    assert!(rec.select(&["nonesuch".into()]).is_err());
}

#[test]
fn test_npy_roundtrip_1d() {
    let rec = sample_record(32, 3.55, 0.0001);
    let bytes = npy::encode_1d(&rec);
    let payload = npy::decode(&bytes).unwrap();
    assert_eq!(payload.shape, vec![32]);
    assert_eq!(payload.record, rec);
}

#[test]
fn test_npy_roundtrip_2d() {
    let a = sample_record(16, 3.55, 0.0001);
    let b = sample_record(16, 3.55, 0.0001);
    let bytes = npy::encode_2d(&[a.clone(), b.clone()]).unwrap();
    let payload = npy::decode(&bytes).unwrap();
    assert_eq!(payload.shape, vec![2, 16]);
    let rows = payload.into_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], a);
    assert_eq!(rows[1], b);
}

#[test]
fn test_npy_header_is_aligned() {
    let rec = sample_record(4, 3.55, 0.0001);
    let bytes = npy::encode_1d(&rec);
    // Data offset (magic + version + length word + header) is a multiple
    // of 64, per the format convention.
    let hlen = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!((10 + hlen) % 64, 0);
}

#[test]
fn test_npy_rejects_mismatched_stack() {
    let a = sample_record(16, 3.55, 0.0001);
    let b = sample_record(20, 3.55, 0.0001);
    assert!(npy::encode_2d(&[a, b]).is_err());
}

#[test]
fn test_npy_rejects_garbage() {
    assert!(npy::decode(b"not a payload").is_err());
}

/// Build a minimal FITS file: empty primary HDU + one BINTABLE with the
/// cached column set, 2 rows.
fn sample_fits() -> Vec<u8> {
    fn card(key: &str, value: &str) -> Vec<u8> {
        let mut text = format!("{key:<8}= {value}");
        text.push_str(&" ".repeat(80 - text.len()));
        text.into_bytes()
    }
    fn pad_block(buf: &mut Vec<u8>, fill: u8) {
        while buf.len() % 2880 != 0 {
            buf.push(fill);
        }
    }

    let mut out = Vec::new();
    out.extend(card("SIMPLE", "T"));
    out.extend(card("BITPIX", "8"));
    out.extend(card("NAXIS", "0"));
    out.extend(format!("{:<80}", "END").into_bytes());
    pad_block(&mut out, b' ');

    let names = ["FLUX", "LOGLAM", "IVAR", "MODEL", "SKY"];
    out.extend(card("XTENSION", "'BINTABLE'"));
    out.extend(card("BITPIX", "8"));
    out.extend(card("NAXIS", "2"));
    out.extend(card("NAXIS1", "20"));
    out.extend(card("NAXIS2", "2"));
    out.extend(card("PCOUNT", "0"));
    out.extend(card("GCOUNT", "1"));
    out.extend(card("TFIELDS", "5"));
    for (i, name) in names.iter().enumerate() {
        out.extend(card(&format!("TTYPE{}", i + 1), &format!("'{name}'")));
        out.extend(card(&format!("TFORM{}", i + 1), "'E'"));
    }
    out.extend(format!("{:<80}", "END").into_bytes());
    pad_block(&mut out, b' ');

    for row in 0..2u32 {
        for col in 0..5u32 {
            let v = (row * 10 + col) as f32;
            out.extend(v.to_be_bytes());
        }
    }
    pad_block(&mut out, 0);
    out
}

#[test]
fn test_fits_table_decode() {
    let rec = fits::decode_table(&sample_fits()).unwrap();
    assert_eq!(rec.len(), 2);
    let flux = rec.flux().unwrap();
    assert_eq!(flux, vec![0.0, 10.0]);
    let loglam = rec.loglam().unwrap();
    assert_eq!(loglam, vec![1.0, 11.0]);
    // Names come back lower-cased.
    assert!(rec.column("sky").is_some());
}

#[test]
fn test_fits_rejects_non_fits() {
    assert!(fits::decode_table(b"XTENSION nonsense").is_err());
}
