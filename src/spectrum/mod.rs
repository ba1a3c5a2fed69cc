//! # Spectrum Records
//!
//! The row-array representation of a single spectrum, the binary codecs
//! that move it on and off disk, and the loader that resolves an
//! identifier into a typed record.
//!
//! A record is a set of equal-length, lower-case-named columns.  The
//! cached on-disk form is the NumPy structured-array format so that the
//! service and any NumPy-speaking client round-trip the same bytes; the
//! authoritative form is the survey's FITS binary table, decoded from
//! HDU 1 and re-emitted in the cached shape.

/// Column name constants for the cached record schema
pub mod columns;
pub mod fits;
pub mod loader;
pub mod npy;
mod record;

mod error;

#[cfg(test)]
mod tests;

pub use error::FormatError;
pub use record::{Column, ColumnData, SpectrumRecord};
