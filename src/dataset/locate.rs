//! Resolution of survey coordinates to spectrum files on disk.

use std::path::{Path, PathBuf};

use crate::id::{ReductionVersion, SpecTuple};

/// On-disk file kind the locator resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// Cached row-array form
    Npy,
    /// Preview plot
    Png,
    /// Authoritative survey file
    Fits,
}

impl Extension {
    /// File-name suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Npy => "npy",
            Extension::Png => "png",
            Extension::Fits => "fits",
        }
    }
}

/// Resolves survey coordinates to a spectrum file on disk.
///
/// The expected layout is
/// `<root>/<release>/<survey>/spectro/redux/<run2d>/spectra/<plate>/
/// spec-<plate>-<mjd>-<fiber>.<ext>` with zero-padded widths 4/5/4.
/// Cached (`npy`/`png`) files live under the cache root, authoritative
/// `fits` files under the archive root.
pub struct Locator<'a> {
    release: &'a str,
    cache_root: &'a Path,
    fits_root: &'a Path,
    run2d: &'a [ReductionVersion],
}

impl<'a> Locator<'a> {
    /// A locator over one release's roots and probe order.
    pub fn new(
        release: &'a str,
        cache_root: &'a Path,
        fits_root: &'a Path,
        run2d: &'a [ReductionVersion],
    ) -> Self {
        Locator {
            release,
            cache_root,
            fits_root,
            run2d,
        }
    }

    fn root(&self, extn: Extension) -> &Path {
        match extn {
            Extension::Fits => self.fits_root,
            _ => self.cache_root,
        }
    }

    fn file_name(coords: &SpecTuple, extn: Extension) -> String {
        format!(
            "spec-{:04}-{:05}-{:04}.{}",
            coords.plate,
            coords.mjd,
            coords.fiber,
            extn.as_str()
        )
    }

    /// The path a spectrum is expected at under a given reduction version.
    pub fn expected(
        &self,
        coords: &SpecTuple,
        run2d: &ReductionVersion,
        extn: Extension,
    ) -> PathBuf {
        self.root(extn)
            .join(self.release)
            .join(&coords.survey)
            .join("spectro/redux")
            .join(run2d.to_string())
            .join("spectra")
            .join(format!("{:04}", coords.plate))
            .join(Self::file_name(coords, extn))
    }

    /// Resolve `coords` to an existing file, or `None` after exhausting
    /// the expected path, the permitted run2d probe order, and the
    /// secondary `spectra/full` glob.
    pub fn resolve(&self, coords: &SpecTuple, extn: Extension) -> Option<PathBuf> {
        if let Some(run2d) = coords.run2d {
            let path = self.expected(coords, &run2d, extn);
            if path.exists() {
                return Some(path);
            }
            log::debug!("expected path missing: {}", path.display());
        }

        for run2d in self.run2d {
            let path = self.expected(coords, run2d, extn);
            if path.exists() {
                return Some(path);
            }
        }

        // Secondary location: any survey, any reduction, under spectra/full.
        let pattern = format!(
            "{}/{}/*/spectro/redux/*/spectra/full/{:04}/{}",
            self.root(extn).display(),
            self.release,
            coords.plate,
            Self::file_name(coords, extn)
        );
        if let Ok(paths) = glob::glob(&pattern) {
            for path in paths.flatten() {
                if path.exists() {
                    return Some(path);
                }
            }
        }
        None
    }
}
