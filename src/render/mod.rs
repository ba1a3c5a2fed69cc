//! # Waterfall and Mosaic Rendering
//!
//! Turns sets of spectra into visual summaries: the z-scaled waterfall
//! ("stacked image") of many flux rows, and the grid mosaic of
//! per-spectrum preview plots.

mod cmap;
mod zscale;

#[cfg(test)]
mod tests;

use std::io::Cursor;

use image::{
    imageops::{self, FilterType},
    DynamicImage, GrayImage, ImageFormat, Rgba, RgbaImage,
};

use crate::align::{self, AlignError};
use crate::spectrum::SpectrumRecord;

pub use cmap::Colormap;
pub use zscale::zscale;

/// Errors raised while rasterizing
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Span or padding failure over the input set
    #[error(transparent)]
    Align(#[from] AlignError),

    /// PNG encode/decode failure
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Parameters describe an impossible raster
    #[error("invalid render request: {0}")]
    Invalid(String),
}

/// Waterfall rendering controls.
#[derive(Debug, Clone)]
pub struct WaterfallParams {
    /// Vertical replication per spectrum, >= 1
    pub thickness: u32,
    /// Invert the 8-bit intensities
    pub inverse: bool,
    /// Colormap; `gray` stays single-channel
    pub cmap: Colormap,
    /// Horizontal scale factor; 1.0 leaves the width alone
    pub xscale: f32,
    /// Vertical scale factor; 1.0 leaves the height alone
    pub yscale: f32,
    /// Absolute width in pixels; 0 means no absolute resize
    pub width: u32,
    /// Absolute height in pixels; 0 means no absolute resize
    pub height: u32,
}

impl Default for WaterfallParams {
    fn default() -> Self {
        WaterfallParams {
            thickness: 1,
            inverse: false,
            cmap: Colormap::Gray,
            xscale: 1.0,
            yscale: 1.0,
            width: 0,
            height: 0,
        }
    }
}

/// Render the z-scaled waterfall of a spectrum set as PNG bytes.
///
/// Only the flux column is padded to the common span; each padded row is
/// replicated `thickness` times so narrow stripes stay visible.  Row
/// order follows input order, top to bottom.
pub fn waterfall(records: &[SpectrumRecord], params: &WaterfallParams) -> Result<Vec<u8>, RenderError> {
    if params.thickness == 0 {
        return Err(RenderError::Invalid("thickness must be >= 1".into()));
    }
    let span = align::span_of(records)?;

    let mut rows: Vec<Vec<f32>> = Vec::with_capacity(records.len() * params.thickness as usize);
    for rec in records {
        let loglam = rec.loglam().map_err(AlignError::from)?;
        let flux = rec.flux().map_err(AlignError::from)?;
        let (first, last) = match (loglam.first(), loglam.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Err(RenderError::Invalid("spectrum has no samples".into())),
        };
        let (lpad, rpad) = align::pad_counts(first, last, loglam.len(), span.w0, span.w1);

        let mut row = vec![0.0f32; lpad + flux.len() + rpad];
        for (i, v) in flux.iter().enumerate() {
            row[lpad + i] = *v as f32;
        }
        for _ in 0..params.thickness {
            rows.push(row.clone());
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Err(RenderError::Invalid("no samples to render".into()));
    }
    if let Some(row) = rows.iter().position(|r| r.len() != width) {
        return Err(AlignError::LengthMismatch {
            row,
            len: rows[row].len(),
            expected: width,
        }
        .into());
    }
    let height = rows.len();

    // Display limits from the full pixel population.
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    let (z1, z2) = zscale(&flat);
    let denom = if z2 == 0.0 { 1.0 } else { z2 };

    let mut gray = GrayImage::new(width as u32, height as u32);
    for (y, row) in rows.iter().enumerate() {
        for (x, v) in row.iter().enumerate() {
            let scaled = (255.0 * (*v as f64 - z1) / denom).round().clamp(0.0, 255.0) as u8;
            let value = if params.inverse { 255 - scaled } else { scaled };
            gray.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    let mut img = if params.cmap.is_gray() {
        DynamicImage::ImageLuma8(gray)
    } else {
        let mut rgba = RgbaImage::new(width as u32, height as u32);
        for (x, y, px) in gray.enumerate_pixels() {
            rgba.put_pixel(x, y, Rgba(params.cmap.rgba(px.0[0])));
        }
        DynamicImage::ImageRgba8(rgba)
    };

    // Relative scaling wins over absolute dimensions.
    if params.xscale != 1.0 || params.yscale != 1.0 {
        let w = ((img.width() as f32 * params.xscale).round() as u32).max(1);
        let h = ((img.height() as f32 * params.yscale).round() as u32).max(1);
        img = img.resize_exact(w, h, FilterType::Triangle);
    } else if params.width > 0 && params.height > 0 {
        img = img.resize_exact(params.width, params.height, FilterType::Triangle);
    }

    encode_png(&img)
}

/// Compose preview PNGs into a grid mosaic on a white canvas.
///
/// Column widths and row heights are the per-column and per-row maxima
/// of the input dimensions; images paste at native size, left to right,
/// top to bottom.
pub fn compose_grid(pngs: &[Vec<u8>], ncols: usize) -> Result<Vec<u8>, RenderError> {
    if ncols == 0 {
        return Err(RenderError::Invalid("ncols must be >= 1".into()));
    }
    if pngs.is_empty() {
        return Err(RenderError::Invalid("no preview images".into()));
    }
    let images: Vec<RgbaImage> = pngs
        .iter()
        .map(|b| Ok(image::load_from_memory(b)?.to_rgba8()))
        .collect::<Result<_, RenderError>>()?;

    let nrows = images.len().div_ceil(ncols);
    let mut col_w = vec![0u32; ncols];
    let mut row_h = vec![0u32; nrows];
    for (i, img) in images.iter().enumerate() {
        let (r, c) = (i / ncols, i % ncols);
        col_w[c] = col_w[c].max(img.width());
        row_h[r] = row_h[r].max(img.height());
    }

    // Cumulative-sum layout of cell origins.
    let x_off: Vec<u32> = col_w
        .iter()
        .scan(0u32, |acc, w| {
            let at = *acc;
            *acc += w;
            Some(at)
        })
        .collect();
    let y_off: Vec<u32> = row_h
        .iter()
        .scan(0u32, |acc, h| {
            let at = *acc;
            *acc += h;
            Some(at)
        })
        .collect();

    let total_w: u32 = col_w.iter().sum();
    let total_h: u32 = row_h.iter().sum();
    let mut canvas = RgbaImage::from_pixel(total_w, total_h, Rgba([255, 255, 255, 255]));
    for (i, img) in images.iter().enumerate() {
        let (r, c) = (i / ncols, i % ncols);
        imageops::overlay(&mut canvas, img, x_off[c] as i64, y_off[r] as i64);
    }

    let rgb: DynamicImage = DynamicImage::ImageRgba8(canvas).to_rgb8().into();
    encode_png(&rgb)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
