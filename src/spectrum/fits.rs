//! Minimal FITS binary-table decoding for authoritative spectrum files.
//!
//! Only what the spec files need: skip the primary HDU, decode the
//! first BINTABLE extension into a record with lower-case column names.
//! Table cells are big-endian scalars per the FITS standard.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use super::{Column, ColumnData, FormatError, SpectrumRecord};

const BLOCK: usize = 2880;
const CARD: usize = 80;

#[derive(Debug, Default)]
struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    fn value(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn int(&self, key: &str) -> Result<i64, FormatError> {
        self.value(key)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| FormatError::Corrupt(format!("missing or non-integer card {key}")))
    }

    fn int_or(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn string(&self, key: &str) -> Option<String> {
        self.value(key)
            .map(|v| v.trim_matches(|c: char| c == '\'' || c.is_whitespace()).to_string())
    }

    /// Byte length of the data unit that follows this header, before
    /// padding to the 2880-byte block size.
    fn data_len(&self) -> Result<usize, FormatError> {
        let bitpix = self.int_or("BITPIX", 8).unsigned_abs() as usize;
        let naxis = self.int_or("NAXIS", 0);
        if naxis == 0 {
            return Ok(0);
        }
        let mut cells = 1usize;
        for i in 1..=naxis {
            cells *= self.int(&format!("NAXIS{i}"))? as usize;
        }
        let heap = self.int_or("PCOUNT", 0) as usize;
        Ok(cells * (bitpix / 8) + heap)
    }
}

/// Read one header unit starting at `pos`; returns the header and the
/// offset of its data unit.
fn read_header(bytes: &[u8], mut pos: usize) -> Result<(Header, usize), FormatError> {
    let mut header = Header::default();
    loop {
        if pos + BLOCK > bytes.len() {
            return Err(FormatError::Corrupt("truncated FITS header".into()));
        }
        let block = &bytes[pos..pos + BLOCK];
        pos += BLOCK;
        for card in block.chunks(CARD) {
            let text = String::from_utf8_lossy(card);
            let key = text[..8.min(text.len())].trim().to_string();
            if key == "END" {
                return Ok((header, pos));
            }
            if key.is_empty() || key == "COMMENT" || key == "HISTORY" {
                continue;
            }
            if let Some(rest) = text.get(8..) {
                if let Some(v) = rest.strip_prefix("= ") {
                    let v = match v.find('/') {
                        // Keep slashes inside quoted values.
                        Some(i) if !v.trim_start().starts_with('\'') => &v[..i],
                        Some(i) if v[..i].matches('\'').count() % 2 == 0 => &v[..i],
                        _ => v,
                    };
                    header.cards.push((key, v.trim().to_string()));
                }
            }
        }
    }
}

fn round_block(n: usize) -> usize {
    n.div_ceil(BLOCK) * BLOCK
}

/// Decode the first binary-table extension (HDU 1) into a record,
/// re-emitting it in the cached row-array shape.
pub fn decode_table(bytes: &[u8]) -> Result<SpectrumRecord, FormatError> {
    if !bytes.starts_with(b"SIMPLE ") {
        return Err(FormatError::Corrupt("not a FITS file".into()));
    }
    let (primary, data_at) = read_header(bytes, 0)?;
    let mut pos = data_at + round_block(primary.data_len()?);

    let (table, data_at) = loop {
        let (hdr, data_at) = read_header(bytes, pos)?;
        match hdr.string("XTENSION").as_deref() {
            Some("BINTABLE") => break (hdr, data_at),
            Some(_) => pos = data_at + round_block(hdr.data_len()?),
            None => return Err(FormatError::Corrupt("no BINTABLE extension".into())),
        }
    };

    let row_bytes = table.int("NAXIS1")? as usize;
    let nrows = table.int("NAXIS2")? as usize;
    let nfields = table.int("TFIELDS")? as usize;

    #[derive(Clone, Copy)]
    enum CellType {
        F32,
        F64,
        I32,
        I64,
    }
    let mut fields = Vec::with_capacity(nfields);
    for i in 1..=nfields {
        let name = table
            .string(&format!("TTYPE{i}"))
            .ok_or_else(|| FormatError::Corrupt(format!("missing TTYPE{i}")))?;
        let form = table
            .string(&format!("TFORM{i}"))
            .ok_or_else(|| FormatError::Corrupt(format!("missing TFORM{i}")))?;
        let (repeat, code) = split_tform(&form)?;
        if repeat != 1 {
            return Err(FormatError::UnsupportedFormat(format!(
                "vector column {name} ({form})"
            )));
        }
        let ty = match code {
            'E' => CellType::F32,
            'D' => CellType::F64,
            'J' => CellType::I32,
            'K' => CellType::I64,
            c => {
                return Err(FormatError::UnsupportedFormat(format!(
                    "table cell code '{c}'"
                )))
            }
        };
        fields.push((name.to_ascii_lowercase(), ty));
    }

    let declared: usize = fields
        .iter()
        .map(|(_, t)| match t {
            CellType::F32 | CellType::I32 => 4,
            CellType::F64 | CellType::I64 => 8,
        })
        .sum();
    if declared != row_bytes {
        return Err(FormatError::Corrupt(format!(
            "row width {row_bytes} != field widths {declared}"
        )));
    }
    if data_at + row_bytes * nrows > bytes.len() {
        return Err(FormatError::Corrupt("truncated table data".into()));
    }

    let mut cols: Vec<Column> = fields
        .iter()
        .map(|(name, ty)| {
            let data = match ty {
                CellType::F32 => ColumnData::F32(Vec::with_capacity(nrows)),
                CellType::F64 => ColumnData::F64(Vec::with_capacity(nrows)),
                CellType::I32 => ColumnData::I32(Vec::with_capacity(nrows)),
                CellType::I64 => ColumnData::I64(Vec::with_capacity(nrows)),
            };
            Column::new(name, data)
        })
        .collect();

    let mut cur = Cursor::new(&bytes[data_at..data_at + row_bytes * nrows]);
    for _ in 0..nrows {
        for col in cols.iter_mut() {
            match &mut col.data {
                ColumnData::F32(v) => v.push(cur.read_f32::<BigEndian>()?),
                ColumnData::F64(v) => v.push(cur.read_f64::<BigEndian>()?),
                ColumnData::I32(v) => v.push(cur.read_i32::<BigEndian>()?),
                ColumnData::I64(v) => v.push(cur.read_i64::<BigEndian>()?),
                ColumnData::U64(_) => unreachable!("table columns are signed or float"),
            }
        }
    }

    SpectrumRecord::new(cols)
}

fn split_tform(form: &str) -> Result<(usize, char), FormatError> {
    let digits: String = form.chars().take_while(|c| c.is_ascii_digit()).collect();
    let code = form
        .chars()
        .nth(digits.len())
        .ok_or_else(|| FormatError::Corrupt(format!("empty TFORM '{form}'")))?;
    let repeat = if digits.is_empty() {
        1
    } else {
        digits
            .parse()
            .map_err(|_| FormatError::Corrupt(format!("bad TFORM '{form}'")))?
    };
    Ok((repeat, code))
}
