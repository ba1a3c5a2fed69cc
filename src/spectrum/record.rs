use super::{columns, FormatError};

/// Typed cell storage for one column.
///
/// The variants mirror the cell types the cached format can carry; the
/// NumPy `descr` spellings are little-endian.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// 32-bit float (`<f4`)
    F32(Vec<f32>),
    /// 64-bit float (`<f8`)
    F64(Vec<f64>),
    /// 32-bit signed integer (`<i4`)
    I32(Vec<i32>),
    /// 64-bit signed integer (`<i8`)
    I64(Vec<i64>),
    /// 64-bit unsigned integer (`<u8`)
    U64(Vec<u64>),
}

impl ColumnData {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::F32(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::U64(v) => v.len(),
        }
    }

    /// True when the column holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The NumPy dtype spelling of this column.
    pub fn descr(&self) -> &'static str {
        match self {
            ColumnData::F32(_) => "<f4",
            ColumnData::F64(_) => "<f8",
            ColumnData::I32(_) => "<i4",
            ColumnData::I64(_) => "<i8",
            ColumnData::U64(_) => "<u8",
        }
    }

    /// Bytes per cell.
    pub fn item_size(&self) -> usize {
        match self {
            ColumnData::F32(_) | ColumnData::I32(_) => 4,
            _ => 8,
        }
    }

    /// The cell at `i`, widened to f64.
    pub fn get_f64(&self, i: usize) -> f64 {
        match self {
            ColumnData::F32(v) => v[i] as f64,
            ColumnData::F64(v) => v[i],
            ColumnData::I32(v) => v[i] as f64,
            ColumnData::I64(v) => v[i] as f64,
            ColumnData::U64(v) => v[i] as f64,
        }
    }

    /// Same dtype, zero-filled, padded on both ends.
    pub fn padded(&self, lpad: usize, rpad: usize) -> ColumnData {
        fn pad<T: Copy + Default>(v: &[T], lpad: usize, rpad: usize) -> Vec<T> {
            let mut out = vec![T::default(); lpad + v.len() + rpad];
            out[lpad..lpad + v.len()].copy_from_slice(v);
            out
        }
        match self {
            ColumnData::F32(v) => ColumnData::F32(pad(v, lpad, rpad)),
            ColumnData::F64(v) => ColumnData::F64(pad(v, lpad, rpad)),
            ColumnData::I32(v) => ColumnData::I32(pad(v, lpad, rpad)),
            ColumnData::I64(v) => ColumnData::I64(pad(v, lpad, rpad)),
            ColumnData::U64(v) => ColumnData::U64(pad(v, lpad, rpad)),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Lower-case column name
    pub name: String,
    /// Cell storage
    pub data: ColumnData,
}

impl Column {
    /// Construct a column, lower-casing the name.
    pub fn new(name: &str, data: ColumnData) -> Self {
        Column {
            name: name.to_ascii_lowercase(),
            data,
        }
    }
}

/// A column-keyed contiguous row array holding one spectrum (or one row
/// of an aligned stack).
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumRecord {
    columns: Vec<Column>,
}

impl SpectrumRecord {
    /// Build a record from columns; all columns must share one length.
    pub fn new(columns: Vec<Column>) -> Result<Self, FormatError> {
        if columns.is_empty() {
            return Err(FormatError::MalformedSpectrum("record has no columns".into()));
        }
        let len = columns[0].data.len();
        if columns.iter().any(|c| c.data.len() != len) {
            return Err(FormatError::MalformedSpectrum(
                "columns have differing lengths".into(),
            ));
        }
        Ok(SpectrumRecord { columns })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// True when the record has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All columns, in storage order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by (lower-case) name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&Column, FormatError> {
        self.column(name)
            .ok_or_else(|| FormatError::MalformedSpectrum(format!("missing column '{name}'")))
    }

    /// The wavelength axis widened to f64.
    pub fn loglam(&self) -> Result<Vec<f64>, FormatError> {
        let col = self.require(columns::LOGLAM)?;
        Ok((0..col.data.len()).map(|i| col.data.get_f64(i)).collect())
    }

    /// The flux column widened to f64.
    pub fn flux(&self) -> Result<Vec<f64>, FormatError> {
        let col = self.require(columns::FLUX)?;
        Ok((0..col.data.len()).map(|i| col.data.get_f64(i)).collect())
    }

    /// Check the record carries the required columns and a strictly
    /// ascending wavelength axis.
    pub fn validate(&self) -> Result<(), FormatError> {
        for name in columns::REQUIRED {
            self.require(name)?;
        }
        let loglam = self.loglam()?;
        if loglam.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FormatError::MalformedSpectrum(
                "loglam is not monotonically ascending".into(),
            ));
        }
        Ok(())
    }

    /// Repack a sub-selection of columns into a new contiguous record.
    ///
    /// The wavelength axis is always retained so the result can still be
    /// aligned and plotted.  Unknown names fail rather than silently
    /// producing a narrower record than requested.
    pub fn select(&self, names: &[String]) -> Result<SpectrumRecord, FormatError> {
        for name in names {
            self.require(&name.to_ascii_lowercase())?;
        }
        let keep: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| {
                c.name == columns::LOGLAM
                    || names.iter().any(|n| n.eq_ignore_ascii_case(&c.name))
            })
            .cloned()
            .collect();
        SpectrumRecord::new(keep)
    }

    /// True when `other` has the same column names and dtypes.
    pub fn same_schema(&self, other: &SpectrumRecord) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.name == b.name && a.data.descr() == b.data.descr())
    }

    /// Zero-pad every column on both ends.
    pub fn padded(&self, lpad: usize, rpad: usize) -> SpectrumRecord {
        SpectrumRecord {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.padded(lpad, rpad),
                })
                .collect(),
        }
    }

    /// Replace a column's data in place.
    pub fn set_column(&mut self, name: &str, data: ColumnData) -> Result<(), FormatError> {
        if data.len() != self.len() {
            return Err(FormatError::MalformedSpectrum(format!(
                "replacement column '{name}' has length {} != {}",
                data.len(),
                self.len()
            )));
        }
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FormatError::MalformedSpectrum(format!("missing column '{name}'")))?;
        col.data = data;
        Ok(())
    }
}
