//! # spec-cache - Cache-Priming Tool
//!
//! Converts authoritative FITS spectra into the cached row-array form
//! the service prefers, mirroring the layout of the archive tree under
//! the cache root.
//!
//! ## Usage
//!
//! ```bash
//! spec-cache --fits-root /net/mss1/archive/hlsp/sdss \
//!            --cache-root /ssd0/sdss \
//!            --release dr16 \
//!            "2210146812474530816" "(1963,54331,120,'103')"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use specserver::catalog::CatalogClient;
use specserver::dataset::{DataFormat, Dataset, SdssDataset};
use specserver::id::{parse_id_list, CanonicalId, IdToken};
use specserver::spectrum::npy;

/// Prime the spectrum cache from authoritative FITS files
#[derive(Parser)]
#[command(name = "spec-cache")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root of the authoritative FITS archive
    #[arg(long, value_name = "DIR")]
    fits_root: PathBuf,

    /// Root of the cache tree to write into
    #[arg(long, value_name = "DIR")]
    cache_root: PathBuf,

    /// Data release the identifiers belong to
    #[arg(long, default_value = "dr16")]
    release: String,

    /// Overwrite cache entries that already exist
    #[arg(long)]
    force: bool,

    /// Identifiers (packed values or concrete tuples; no wildcards)
    #[arg(value_name = "ID", required = true)]
    ids: Vec<String>,

    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // The cache tool runs offline; wildcard expansion needs the catalog
    // and is rejected below before any network use could happen.
    let catalog = Arc::new(CatalogClient::new("http://localhost:0", 1));
    let ds = Dataset::Sdss(SdssDataset::new(
        &args.release,
        args.cache_root.clone(),
        args.fits_root.clone(),
        catalog,
    ));

    let mut converted = 0usize;
    for wire in &args.ids {
        for token in parse_id_list(wire).with_context(|| format!("parsing '{wire}'"))? {
            let id = match token {
                IdToken::Packed(v) => CanonicalId::Packed(v),
                IdToken::Literal(t) => CanonicalId::Tuple(t),
                IdToken::Wildcard(_) => {
                    bail!("wildcard identifiers need the catalog; pass concrete ids")
                }
            };

            let src = ds
                .data_path(&id, DataFormat::Fits)
                .with_context(|| format!("locating {wire}"))?;
            let rel = src
                .strip_prefix(&args.fits_root)
                .with_context(|| format!("{} is outside the archive root", src.display()))?;
            let dst = args.cache_root.join(rel).with_extension("npy");
            if dst.exists() && !args.force {
                log::info!("skipping existing {}", dst.display());
                continue;
            }

            let record = ds
                .get_data(&src)
                .with_context(|| format!("decoding {}", src.display()))?;
            record
                .validate()
                .with_context(|| format!("validating {}", src.display()))?;

            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&dst, npy::encode_1d(&record))
                .with_context(|| format!("writing {}", dst.display()))?;
            log::info!("{} -> {}", src.display(), dst.display());
            converted += 1;
        }
    }

    println!("converted {converted} spectra");
    Ok(())
}
