/// Column names as constants for type safety
/// Log10 wavelength axis; ascending, uniform step within one spectrum
pub const LOGLAM: &str = "loglam";
/// Calibrated flux
pub const FLUX: &str = "flux";
/// Inverse variance of the flux
pub const IVAR: &str = "ivar";
/// Best-fit model flux
pub const MODEL: &str = "model";
/// Subtracted sky flux
pub const SKY: &str = "sky";
/// AND-combined pixel mask
pub const AND_MASK: &str = "and_mask";
/// OR-combined pixel mask
pub const OR_MASK: &str = "or_mask";
/// Wavelength dispersion in pixel units
pub const WDISP: &str = "wdisp";

/// Columns every cached spectrum must carry.
pub const REQUIRED: [&str; 5] = [LOGLAM, FLUX, IVAR, MODEL, SKY];
