//! # specserver - Spectroscopic Data Service
//!
//! `specserver` delivers astronomical spectra from large survey data
//! releases over HTTP, together with a thin client SDK.  A client asks
//! which spectra exist near a point on the sky (optionally subject to a
//! tabular constraint), then fetches the spectral arrays for those
//! identifiers, either raw per spectrum or padded onto a common
//! wavelength span so the set stacks into one rectangular array.  The
//! service also renders visual summaries: per-spectrum previews, grid
//! mosaics, and z-scaled waterfalls of many spectra.
//!
//! ## Key Pieces
//!
//! - **Identifier codec**: the packed 64-bit `specobjid` whose
//!   bit-fields encode plate / mjd / fiber / reduction version, with
//!   exact pack/unpack round-trip ([`id`]).
//! - **Identifier expansion**: heterogeneous, wildcard-bearing id lists
//!   resolve to concrete identifiers in input order ([`id::expand`]).
//! - **Dataset adapters**: per-release strategies that locate cached
//!   files, answer tabular queries, and expand wildcards against the
//!   survey catalog ([`dataset`]).
//! - **Alignment engine**: common-span computation and log-wavelength
//!   padding so spectra stack row-for-row ([`align`]).
//! - **Rendering**: z-scale waterfalls and preview mosaics ([`render`]).
//! - **Service facade**: the `/spec` HTTP surface ([`service`]).
//! - **Client SDK**: blocking wrapper returning typed records
//!   ([`client`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use specserver::id::{ReductionVersion, SpecObjId};
//!
//! // The identifier codec is the wire contract with clients.
//! let run2d = ReductionVersion::parse("v5_7_0")?;
//! let id = SpecObjId::pack(4055, 55359, 408, &run2d)?;
//! assert_eq!(id.value(), 4565636362342690816);
//! # Ok::<(), specserver::id::IdError>(())
//! ```
//!
//! Serving is a one-liner once state is assembled:
//!
//! ```rust,no_run
//! use specserver::config::Config;
//! use specserver::service::{self, AppState};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let state = AppState::new(Config::builtin(), "default")?;
//! service::serve(state, "localhost", 6999).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Data Shapes
//!
//! Spectra travel as NumPy structured arrays (see [`spectrum::npy`]), so
//! a NumPy-speaking client parses the same bytes the server writes.
//! Aligned stacks serialize with shape `(rows, cols)`, single spectra
//! with shape `(n,)`; required columns are `loglam`, `flux`, `ivar`,
//! `model`, and `sky`.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod align;
pub mod catalog;
pub mod client;
pub mod config;
pub mod dataset;
pub mod id;
pub mod render;
pub mod service;
pub mod spectrum;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::align::{align_records, pad_to_span, span_of, AlignError, Span};
    pub use crate::catalog::{CatalogClient, CatalogError};
    pub use crate::client::{ClientError, IdList, SearchRegion, SpecClient, StackOptions};
    pub use crate::config::{Config, ConfigError};
    pub use crate::dataset::{
        CatalogQuery, DataFormat, Dataset, DatasetError, Registry, SdssDataset,
    };
    pub use crate::id::{
        parse_id_list, CanonicalId, IdError, IdToken, ReductionVersion, SpecObjId, SpecTuple,
    };
    pub use crate::render::{waterfall, Colormap, RenderError, WaterfallParams};
    pub use crate::service::{AppState, SvcError};
    pub use crate::spectrum::{Column, ColumnData, FormatError, SpectrumRecord};
}
