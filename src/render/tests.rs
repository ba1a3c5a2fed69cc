use super::*;
use crate::spectrum::{columns, Column, ColumnData, SpectrumRecord};

fn spectrum(start: f64, disp: f64, len: usize) -> SpectrumRecord {
    let loglam: Vec<f32> = (0..len).map(|i| (start + disp * i as f64) as f32).collect();
    let flux: Vec<f32> = (0..len).map(|i| (i % 7) as f32).collect();
    SpectrumRecord::new(vec![
        Column::new(columns::LOGLAM, ColumnData::F32(loglam)),
        Column::new(columns::FLUX, ColumnData::F32(flux)),
    ])
    .unwrap()
}

fn png_dims(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

#[test]
fn test_waterfall_dimensions() {
    let specs: Vec<SpectrumRecord> = (0..3).map(|_| spectrum(3.55, 0.001, 64)).collect();
    let png = waterfall(&specs, &WaterfallParams::default()).unwrap();
    assert_eq!(png_dims(&png), (64, 3));
}

#[test]
fn test_waterfall_thickness_replicates_rows() {
    let specs: Vec<SpectrumRecord> = (0..2).map(|_| spectrum(3.55, 0.001, 32)).collect();
    let params = WaterfallParams {
        thickness: 3,
        ..WaterfallParams::default()
    };
    let png = waterfall(&specs, &params).unwrap();
    assert_eq!(png_dims(&png), (32, 6));
}

#[test]
fn test_waterfall_relative_scaling_wins() {
    let specs = vec![spectrum(3.55, 0.001, 100)];
    let params = WaterfallParams {
        thickness: 4,
        xscale: 0.5,
        yscale: 2.0,
        width: 999,
        height: 999,
        ..WaterfallParams::default()
    };
    let png = waterfall(&specs, &params).unwrap();
    assert_eq!(png_dims(&png), (50, 8));
}

#[test]
fn test_waterfall_absolute_resize() {
    let specs = vec![spectrum(3.55, 0.001, 100)];
    let params = WaterfallParams {
        width: 40,
        height: 10,
        ..WaterfallParams::default()
    };
    let png = waterfall(&specs, &params).unwrap();
    assert_eq!(png_dims(&png), (40, 10));
}

#[test]
fn test_waterfall_colormap_produces_color() {
    let specs = vec![spectrum(3.55, 0.001, 16)];
    let params = WaterfallParams {
        cmap: Colormap::Summer,
        ..WaterfallParams::default()
    };
    let png = waterfall(&specs, &params).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    // Summer pins blue at a constant 102.
    assert!(img.pixels().all(|p| p.0[2] == 102));
}

#[test]
fn test_waterfall_rejects_zero_thickness() {
    let specs = vec![spectrum(3.55, 0.001, 16)];
    let params = WaterfallParams {
        thickness: 0,
        ..WaterfallParams::default()
    };
    assert!(matches!(
        waterfall(&specs, &params),
        Err(RenderError::Invalid(_))
    ));
}

#[test]
fn test_waterfall_empty_list_fails() {
    assert!(waterfall(&[], &WaterfallParams::default()).is_err());
}

fn tiny_png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[test]
fn test_grid_layout_uses_per_row_and_column_maxima() {
    // 2x2 grid with ragged member sizes.
    let pngs = vec![
        tiny_png(10, 5),
        tiny_png(20, 8),
        tiny_png(15, 12),
        tiny_png(5, 4),
    ];
    let png = compose_grid(&pngs, 2).unwrap();
    // Columns: max(10,15)=15, max(20,5)=20; rows: max(5,8)=8, max(12,4)=12.
    assert_eq!(png_dims(&png), (35, 20));
}

#[test]
fn test_grid_single_column() {
    let pngs = vec![tiny_png(10, 5), tiny_png(12, 6)];
    let png = compose_grid(&pngs, 1).unwrap();
    assert_eq!(png_dims(&png), (12, 11));
}

#[test]
fn test_grid_rejects_bad_inputs() {
    assert!(compose_grid(&[], 2).is_err());
    assert!(compose_grid(&[tiny_png(4, 4)], 0).is_err());
}
