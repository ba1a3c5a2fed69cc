//! Identifier expansion: wire form in, concrete identifiers out.
//!
//! Wildcarded tuples are resolved through the dataset adapter's catalog;
//! everything else maps directly.  Output order preserves input order,
//! with each expansion spliced in at the position of its parent token.

use crate::dataset::{Dataset, DatasetError};

use super::{parse_id_list, CanonicalId, IdToken};

/// Expand an identifier wire form into the ordered concrete list.
pub async fn expand_id_list(ds: &Dataset, wire: &str) -> Result<Vec<CanonicalId>, DatasetError> {
    let tokens = parse_id_list(wire)?;
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            IdToken::Packed(id) => out.push(CanonicalId::Packed(id)),
            IdToken::Literal(t) => out.push(CanonicalId::Tuple(t)),
            IdToken::Wildcard(w) => {
                let expanded = ds.expand_id(&w).await?;
                log::debug!("expanded wildcard tuple to {} identifiers", expanded.len());
                out.extend(expanded.into_iter().map(CanonicalId::Tuple));
            }
        }
    }
    Ok(out)
}
