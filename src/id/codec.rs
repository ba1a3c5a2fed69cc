use std::fmt;

use super::IdError;

const PLATE_BITS: u32 = 14;
const FIBER_BITS: u32 = 12;
const MJD_BITS: u32 = 14;
const RUN2D_BITS: u32 = 14;

const PLATE_SHIFT: u32 = 50;
const FIBER_SHIFT: u32 = 38;
const MJD_SHIFT: u32 = 24;
const RUN2D_SHIFT: u32 = 10;

/// MJD values are stored relative to this epoch and must exceed it.
pub const MJD_BASE: u32 = 50000;

/// The 2-D reduction pipeline version that produced a spectrum.
///
/// Encoded in 14 bits of the packed identifier.  The numeric form covers
/// the legacy codes (26, 103, 104); the string form is `vN_M_P` with
/// `5 <= N <= 6` and `M`, `P` below 100, encoded as
/// `(N - 5) * 10000 + M * 100 + P`.
///
/// Three encodings collide between the two spellings (103 = v5_1_3,
/// 104 = v5_1_4, 26 = v5_0_26).  The integer spelling is canonical for
/// those: decoding always returns `Numeric`, so `"103"` round-trips as
/// `"103"` and never as `"v5_1_3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionVersion {
    /// A small decimal code (26, 103, 104)
    Numeric(u16),
    /// A `vN_M_P` pipeline version
    Version {
        /// Major version, 5 or 6
        n: u8,
        /// Minor version, 0..=99
        m: u8,
        /// Patch version, 0..=99
        p: u8,
    },
}

impl ReductionVersion {
    /// Parse a reduction version from its wire spelling.
    ///
    /// Accepts a decimal integer or a `vN_M_P` string.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::InvalidField("empty run2d value".into()));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            let code: u32 = s
                .parse()
                .map_err(|_| IdError::InvalidField(format!("run2d '{s}' out of range")))?;
            if code >= (1 << RUN2D_BITS) {
                return Err(IdError::InvalidField(format!(
                    "run2d {code} exceeds {RUN2D_BITS} bits"
                )));
            }
            return Ok(ReductionVersion::Numeric(code as u16));
        }

        let rest = s
            .strip_prefix('v')
            .ok_or_else(|| IdError::InvalidField(format!("malformed run2d '{s}'")))?;
        let mut parts = rest.split('_');
        let (n, m, p) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(m), Some(p), None) => (n, m, p),
            _ => return Err(IdError::InvalidField(format!("malformed run2d '{s}'"))),
        };
        let n: u8 = n
            .parse()
            .map_err(|_| IdError::InvalidField(format!("malformed run2d '{s}'")))?;
        let m: u8 = m
            .parse()
            .map_err(|_| IdError::InvalidField(format!("malformed run2d '{s}'")))?;
        let p: u8 = p
            .parse()
            .map_err(|_| IdError::InvalidField(format!("malformed run2d '{s}'")))?;
        if !(5..=6).contains(&n) || m > 99 || p > 99 {
            return Err(IdError::InvalidField(format!(
                "run2d '{s}' outside v5_0_0..v6_99_99"
            )));
        }
        Ok(ReductionVersion::Version { n, m, p })
    }

    /// The 14-bit sub-value stored in the packed identifier.
    pub fn code(&self) -> u16 {
        match *self {
            ReductionVersion::Numeric(v) => v,
            ReductionVersion::Version { n, m, p } => {
                (n as u16 - 5) * 10000 + (m as u16) * 100 + p as u16
            }
        }
    }

    /// Decode a 14-bit sub-value back into a version.
    ///
    /// Returns `None` for 0, which unpacks to the empty string.  The three
    /// legacy codes come back as `Numeric` so their decimal spelling is
    /// preserved on the wire.
    pub fn from_code(code: u16) -> Option<Self> {
        if code == 0 {
            return None;
        }
        match code {
            26 | 103 | 104 => Some(ReductionVersion::Numeric(code)),
            _ => {
                let n = (code / 10000) as u8 + 5;
                let m = ((code % 10000) / 100) as u8;
                let p = (code % 100) as u8;
                Some(ReductionVersion::Version { n, m, p })
            }
        }
    }
}

impl fmt::Display for ReductionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ReductionVersion::Numeric(v) => write!(f, "{v}"),
            ReductionVersion::Version { n, m, p } => write!(f, "v{n}_{m}_{p}"),
        }
    }
}

/// A packed 64-bit spectrum identifier (CAS-style `specobjid`).
///
/// Bit layout, most significant first:
///
/// | field | bits  | semantics                        |
/// |-------|-------|----------------------------------|
/// | plate | 63..50| survey plate number              |
/// | fiber | 49..38| fiber on the plate               |
/// | mjd   | 37..24| observation date minus 50000     |
/// | run2d | 23..10| reduction-version code           |
/// | index |  9..0 | unused, always zero              |
///
/// The layout is the wire contract between clients and the service and is
/// bit-exact with the SDSS-III/IV definition (DR8 and later).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecObjId(u64);

impl SpecObjId {
    /// Wrap a raw packed value.
    pub fn new(value: u64) -> Self {
        SpecObjId(value)
    }

    /// The raw 64-bit value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Assemble a packed identifier from survey coordinates.
    ///
    /// `mjd` must be greater than 50000 and every field must fit its
    /// bit width; otherwise `InvalidField` is returned.
    pub fn pack(
        plate: u32,
        mjd: u32,
        fiber: u32,
        run2d: &ReductionVersion,
    ) -> Result<Self, IdError> {
        if plate == 0 || plate >= (1 << PLATE_BITS) {
            return Err(IdError::InvalidField(format!(
                "plate {plate} outside 1..{}",
                (1 << PLATE_BITS) - 1
            )));
        }
        if fiber == 0 || fiber >= (1 << FIBER_BITS) {
            return Err(IdError::InvalidField(format!(
                "fiber {fiber} outside 1..{}",
                (1 << FIBER_BITS) - 1
            )));
        }
        if mjd <= MJD_BASE {
            return Err(IdError::InvalidField(format!("mjd {mjd} must exceed {MJD_BASE}")));
        }
        let mjd_off = mjd - MJD_BASE;
        if mjd_off >= (1 << MJD_BITS) {
            return Err(IdError::InvalidField(format!(
                "mjd {mjd} exceeds encodable range"
            )));
        }
        let code = run2d.code() as u64;
        if code >= (1 << RUN2D_BITS) {
            return Err(IdError::InvalidField(format!(
                "run2d code {code} exceeds {RUN2D_BITS} bits"
            )));
        }
        Ok(SpecObjId(
            ((plate as u64) << PLATE_SHIFT)
                | ((fiber as u64) << FIBER_SHIFT)
                | ((mjd_off as u64) << MJD_SHIFT)
                | (code << RUN2D_SHIFT),
        ))
    }

    /// Split the packed value back into its fields.
    pub fn unpack(&self) -> UnpackedId {
        let v = self.0;
        UnpackedId {
            plate: ((v >> PLATE_SHIFT) & ((1 << PLATE_BITS) - 1)) as u32,
            fiber: ((v >> FIBER_SHIFT) & ((1 << FIBER_BITS) - 1)) as u32,
            mjd: ((v >> MJD_SHIFT) & ((1 << MJD_BITS) - 1)) as u32 + MJD_BASE,
            run2d: ReductionVersion::from_code(
                ((v >> RUN2D_SHIFT) & ((1 << RUN2D_BITS) - 1)) as u16,
            ),
        }
    }
}

impl fmt::Display for SpecObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fields of an unpacked identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedId {
    /// Survey plate number
    pub plate: u32,
    /// Modified Julian date of observation
    pub mjd: u32,
    /// Fiber on the plate
    pub fiber: u32,
    /// Reduction version; `None` when the 14-bit sub-value is zero
    pub run2d: Option<ReductionVersion>,
}

impl UnpackedId {
    /// The reduction version spelling, empty when absent.
    pub fn run2d_str(&self) -> String {
        self.run2d.map(|r| r.to_string()).unwrap_or_default()
    }
}

/// A fully specified survey tuple `(plate, mjd, fiber, run2d, survey)`.
///
/// `run2d` may be omitted, in which case the file locator probes the
/// context's permitted reduction versions in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTuple {
    /// Survey plate number
    pub plate: u32,
    /// Modified Julian date of observation
    pub mjd: u32,
    /// Fiber on the plate
    pub fiber: u32,
    /// Reduction version, when pinned
    pub run2d: Option<ReductionVersion>,
    /// Sub-survey name (`sdss`, `eboss`, ...)
    pub survey: String,
}

impl SpecTuple {
    /// A tuple with the default survey and no pinned reduction version.
    pub fn new(plate: u32, mjd: u32, fiber: u32) -> Self {
        SpecTuple {
            plate,
            mjd,
            fiber,
            run2d: None,
            survey: "sdss".into(),
        }
    }

    /// Pack into a 64-bit identifier; requires a pinned reduction version.
    pub fn to_packed(&self) -> Result<SpecObjId, IdError> {
        let run2d = self
            .run2d
            .ok_or_else(|| IdError::InvalidField("tuple has no run2d".into()))?;
        SpecObjId::pack(self.plate, self.mjd, self.fiber, &run2d)
    }
}

impl fmt::Display for SpecTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run2d = self.run2d.map(|r| r.to_string()).unwrap_or_default();
        write!(
            f,
            "({},{},{},{},{})",
            self.plate, self.mjd, self.fiber, run2d, self.survey
        )
    }
}
