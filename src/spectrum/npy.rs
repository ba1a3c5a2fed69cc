//! NumPy structured-array codec for the cached spectrum format.
//!
//! The cached form is the NumPy `.npy` format, version 1.0, holding a
//! little-endian structured dtype: magic, a python-literal header with
//! `descr`, `fortran_order` and `shape`, then C-order records.  Single
//! spectra serialize with shape `(n,)`; aligned stacks with shape
//! `(rows, cols)` and identical per-row schema.  The byte layout is the
//! wire contract for `/getSpec` payloads.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Column, ColumnData, FormatError, SpectrumRecord};

const MAGIC: &[u8] = b"\x93NUMPY";

/// A decoded `.npy` payload: the declared shape plus the cells flattened
/// into a single record in C order.
#[derive(Debug, Clone)]
pub struct NpyPayload {
    /// Declared array shape; one or two axes
    pub shape: Vec<usize>,
    /// All cells, row-major
    pub record: SpectrumRecord,
}

impl NpyPayload {
    /// Split a 2-D payload into its per-row records.
    ///
    /// A 1-D payload comes back as a single row.
    pub fn into_rows(self) -> Result<Vec<SpectrumRecord>, FormatError> {
        match self.shape.len() {
            1 => Ok(vec![self.record]),
            2 => {
                let (rows, cols) = (self.shape[0], self.shape[1]);
                let mut out = Vec::with_capacity(rows);
                for r in 0..rows {
                    let cols_slice: Vec<Column> = self
                        .record
                        .columns()
                        .iter()
                        .map(|c| Column {
                            name: c.name.clone(),
                            data: slice_cells(&c.data, r * cols, cols),
                        })
                        .collect();
                    out.push(SpectrumRecord::new(cols_slice)?);
                }
                Ok(out)
            }
            n => Err(FormatError::Corrupt(format!("unsupported rank {n}"))),
        }
    }
}

fn slice_cells(data: &ColumnData, start: usize, len: usize) -> ColumnData {
    match data {
        ColumnData::F32(v) => ColumnData::F32(v[start..start + len].to_vec()),
        ColumnData::F64(v) => ColumnData::F64(v[start..start + len].to_vec()),
        ColumnData::I32(v) => ColumnData::I32(v[start..start + len].to_vec()),
        ColumnData::I64(v) => ColumnData::I64(v[start..start + len].to_vec()),
        ColumnData::U64(v) => ColumnData::U64(v[start..start + len].to_vec()),
    }
}

fn empty_cells(descr: &str) -> Result<ColumnData, FormatError> {
    match descr {
        "<f4" | "f4" => Ok(ColumnData::F32(Vec::new())),
        "<f8" | "f8" => Ok(ColumnData::F64(Vec::new())),
        "<i4" | "i4" => Ok(ColumnData::I32(Vec::new())),
        "<i8" | "i8" => Ok(ColumnData::I64(Vec::new())),
        "<u8" | "u8" => Ok(ColumnData::U64(Vec::new())),
        other => Err(FormatError::UnsupportedFormat(format!(
            "cell dtype '{other}'"
        ))),
    }
}

/// Decode a serialized payload.
pub fn decode(bytes: &[u8]) -> Result<NpyPayload, FormatError> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(FormatError::Corrupt("missing NUMPY magic".into()));
    }
    let (major, _minor) = (bytes[6], bytes[7]);
    let (header, data_start) = match major {
        1 => {
            let mut cur = Cursor::new(&bytes[8..10]);
            let hlen = cur.read_u16::<LittleEndian>()? as usize;
            let end = 10 + hlen;
            if bytes.len() < end {
                return Err(FormatError::Corrupt("truncated header".into()));
            }
            (&bytes[10..end], end)
        }
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(FormatError::Corrupt("truncated header".into()));
            }
            let mut cur = Cursor::new(&bytes[8..12]);
            let hlen = cur.read_u32::<LittleEndian>()? as usize;
            let end = 12 + hlen;
            if bytes.len() < end {
                return Err(FormatError::Corrupt("truncated header".into()));
            }
            (&bytes[12..end], end)
        }
        v => {
            return Err(FormatError::UnsupportedFormat(format!(
                "npy format version {v}"
            )))
        }
    };

    let header = std::str::from_utf8(header)
        .map_err(|_| FormatError::Corrupt("header is not ASCII".into()))?;
    let (descr, fortran, shape) = parse_header(header)?;
    if fortran {
        return Err(FormatError::UnsupportedFormat("fortran-order payload".into()));
    }

    let ncells: usize = shape.iter().product();
    let mut cols: Vec<Column> = descr
        .iter()
        .map(|(name, dt)| Ok(Column::new(name, empty_cells(dt)?)))
        .collect::<Result<_, FormatError>>()?;

    let mut cur = Cursor::new(&bytes[data_start..]);
    for _ in 0..ncells {
        for col in cols.iter_mut() {
            match &mut col.data {
                ColumnData::F32(v) => v.push(cur.read_f32::<LittleEndian>()?),
                ColumnData::F64(v) => v.push(cur.read_f64::<LittleEndian>()?),
                ColumnData::I32(v) => v.push(cur.read_i32::<LittleEndian>()?),
                ColumnData::I64(v) => v.push(cur.read_i64::<LittleEndian>()?),
                ColumnData::U64(v) => v.push(cur.read_u64::<LittleEndian>()?),
            }
        }
    }

    Ok(NpyPayload {
        shape,
        record: SpectrumRecord::new(cols)?,
    })
}

/// Serialize a single spectrum with shape `(n,)`.
pub fn encode_1d(rec: &SpectrumRecord) -> Vec<u8> {
    encode(rec, &[rec.len()])
}

/// Serialize an aligned stack with shape `(rows, cols)`.
///
/// Every row must share the first row's schema and length.
pub fn encode_2d(rows: &[SpectrumRecord]) -> Result<Vec<u8>, FormatError> {
    let first = rows
        .first()
        .ok_or_else(|| FormatError::Corrupt("empty stack".into()))?;
    if rows
        .iter()
        .any(|r| !r.same_schema(first) || r.len() != first.len())
    {
        return Err(FormatError::MalformedSpectrum(
            "stack rows differ in schema or length".into(),
        ));
    }

    // Concatenate the rows column-wise, then emit with a 2-D shape.
    let merged: Vec<Column> = first
        .columns()
        .iter()
        .enumerate()
        .map(|(ci, c)| {
            let mut data = c.data.clone();
            for row in &rows[1..] {
                append_cells(&mut data, &row.columns()[ci].data);
            }
            Column {
                name: c.name.clone(),
                data,
            }
        })
        .collect();
    let merged = SpectrumRecord::new(merged)?;
    Ok(encode(&merged, &[rows.len(), first.len()]))
}

fn append_cells(dst: &mut ColumnData, src: &ColumnData) {
    match (dst, src) {
        (ColumnData::F32(d), ColumnData::F32(s)) => d.extend_from_slice(s),
        (ColumnData::F64(d), ColumnData::F64(s)) => d.extend_from_slice(s),
        (ColumnData::I32(d), ColumnData::I32(s)) => d.extend_from_slice(s),
        (ColumnData::I64(d), ColumnData::I64(s)) => d.extend_from_slice(s),
        (ColumnData::U64(d), ColumnData::U64(s)) => d.extend_from_slice(s),
        _ => unreachable!("schema checked by encode_2d"),
    }
}

fn encode(rec: &SpectrumRecord, shape: &[usize]) -> Vec<u8> {
    let descr: Vec<String> = rec
        .columns()
        .iter()
        .map(|c| format!("('{}', '{}')", c.name, c.data.descr()))
        .collect();
    let shape_txt = match shape {
        [n] => format!("({n},)"),
        [r, c] => format!("({r}, {c})"),
        _ => unreachable!("encoders emit rank 1 or 2"),
    };
    let mut header = format!(
        "{{'descr': [{}], 'fortran_order': False, 'shape': {}, }}",
        descr.join(", "),
        shape_txt
    );
    // Pad with spaces so magic + length + header is 64-byte aligned.
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat(64 - unpadded % 64));
    header.push('\n');

    let ncells: usize = shape.iter().product();
    let row_bytes: usize = rec.columns().iter().map(|c| c.data.item_size()).sum();
    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + ncells * row_bytes);
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    let _ = out.write_u16::<LittleEndian>(header.len() as u16);
    out.extend_from_slice(header.as_bytes());

    for i in 0..ncells {
        for col in rec.columns() {
            match &col.data {
                ColumnData::F32(v) => { let _ = out.write_f32::<LittleEndian>(v[i]); }
                ColumnData::F64(v) => { let _ = out.write_f64::<LittleEndian>(v[i]); }
                ColumnData::I32(v) => { let _ = out.write_i32::<LittleEndian>(v[i]); }
                ColumnData::I64(v) => { let _ = out.write_i64::<LittleEndian>(v[i]); }
                ColumnData::U64(v) => { let _ = out.write_u64::<LittleEndian>(v[i]); }
            }
        }
    }
    out
}

/// Pull apart the python-literal header: dtype list, order flag, shape.
fn parse_header(header: &str) -> Result<(Vec<(String, String)>, bool, Vec<usize>), FormatError> {
    let descr_src = slice_between(header, "'descr':", ']')
        .ok_or_else(|| FormatError::Corrupt("header missing descr".into()))?;
    let mut descr = Vec::new();
    let mut rest = descr_src;
    while let Some(open) = rest.find('(') {
        let close = rest[open..]
            .find(')')
            .ok_or_else(|| FormatError::Corrupt("unterminated descr tuple".into()))?;
        let tuple = &rest[open + 1..open + close];
        let parts: Vec<&str> = tuple
            .split(',')
            .map(|p| p.trim().trim_matches(|c| c == '\'' || c == '"'))
            .collect();
        if parts.len() != 2 {
            return Err(FormatError::UnsupportedFormat(format!(
                "descr entry '({tuple})'"
            )));
        }
        descr.push((parts[0].to_string(), parts[1].to_string()));
        rest = &rest[open + close + 1..];
    }
    if descr.is_empty() {
        return Err(FormatError::Corrupt("descr holds no fields".into()));
    }

    let fortran = header
        .split("'fortran_order':")
        .nth(1)
        .map(|s| s.trim_start().starts_with("True"))
        .unwrap_or(false);

    let shape_src = slice_between(header, "'shape':", ')')
        .ok_or_else(|| FormatError::Corrupt("header missing shape".into()))?;
    let shape: Vec<usize> = shape_src
        .trim_start_matches(|c: char| c == '(' || c.is_whitespace())
        .split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            p.trim()
                .parse()
                .map_err(|_| FormatError::Corrupt(format!("bad shape element '{p}'")))
        })
        .collect::<Result<_, _>>()?;
    if shape.is_empty() || shape.len() > 2 {
        return Err(FormatError::UnsupportedFormat(format!(
            "array rank {}",
            shape.len()
        )));
    }

    Ok((descr, fortran, shape))
}

/// The text after `key` up to and including nothing past the matching
/// `close` delimiter.
fn slice_between<'a>(src: &'a str, key: &str, close: char) -> Option<&'a str> {
    let start = src.find(key)? + key.len();
    let end = src[start..].find(close)? + start;
    Some(&src[start..end])
}
