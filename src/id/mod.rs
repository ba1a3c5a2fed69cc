//! # Spectrum Identifier Module
//!
//! Everything that names a spectrum lives here: the packed 64-bit
//! `specobjid` codec, the wire-form parser for heterogeneous identifier
//! lists, and the expansion engine that turns wildcarded tuples into
//! concrete identifiers.
//!
//! ## Example
//!
//! ```rust
//! use specserver::id::{ReductionVersion, SpecObjId};
//!
//! let run2d = ReductionVersion::parse("103")?;
//! let id = SpecObjId::pack(1963, 54331, 19, &run2d)?;
//! assert_eq!(id.value(), 2210146812474530816);
//!
//! let u = id.unpack();
//! assert_eq!((u.plate, u.mjd, u.fiber), (1963, 54331, 19));
//! assert_eq!(u.run2d_str(), "103");
//! # Ok::<(), specserver::id::IdError>(())
//! ```

mod codec;
mod error;
pub mod expand;
pub(crate) mod parse;

#[cfg(test)]
mod tests;

pub use codec::{ReductionVersion, SpecObjId, SpecTuple, UnpackedId};
pub use error::IdError;
pub use parse::{parse_id_list, CanonicalId, FieldSpec, IdToken, WildcardTuple};
