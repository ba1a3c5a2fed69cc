use super::{IdError, ReductionVersion, SpecObjId, SpecTuple};

/// One positional constraint inside a wildcarded tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// `*`, unconstrained
    Any,
    /// A single value (number or run2d/survey name)
    One(String),
    /// A comma-separated sub-list
    List(Vec<String>),
    /// A range `a-b` / `a:b`; only meaningful on the fiber slot
    Range(u64, u64),
}

impl FieldSpec {
    /// True when this slot does not pin a single value.
    pub fn is_wild(&self) -> bool {
        !matches!(self, FieldSpec::One(_))
    }

    fn parse(raw: &str, allow_range: bool) -> Self {
        let raw = raw.trim();
        if raw == "*" || raw.is_empty() {
            return FieldSpec::Any;
        }
        if raw.contains(',') {
            return FieldSpec::List(raw.split(',').map(|p| p.trim().to_string()).collect());
        }
        if allow_range {
            for sep in ['-', ':'] {
                if let Some((a, b)) = raw.split_once(sep) {
                    if let (Ok(a), Ok(b)) = (a.trim().parse(), b.trim().parse()) {
                        return FieldSpec::Range(a, b);
                    }
                }
            }
        }
        FieldSpec::One(raw.to_string())
    }
}

/// A tuple with at least one unconstrained or multi-valued slot.
///
/// Resolved against the catalog by the dataset adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardTuple {
    /// Plate constraint
    pub plate: FieldSpec,
    /// MJD constraint
    pub mjd: FieldSpec,
    /// Fiber constraint
    pub fiber: FieldSpec,
    /// Reduction-version constraint
    pub run2d: FieldSpec,
    /// Survey name, when the fifth slot was given
    pub survey: Option<String>,
}

/// One token of the identifier wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum IdToken {
    /// A packed 64-bit identifier
    Packed(SpecObjId),
    /// A fully specified tuple with no wildcards
    Literal(SpecTuple),
    /// A tuple carrying wildcards, lists, or ranges
    Wildcard(WildcardTuple),
}

/// A concrete identifier after expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalId {
    /// Packed 64-bit form
    Packed(SpecObjId),
    /// Fully specified 5-tuple form
    Tuple(SpecTuple),
}

impl CanonicalId {
    /// The survey coordinates of this identifier.
    ///
    /// Packed identifiers always carry a reduction version; tuple
    /// identifiers may leave it to the locator's probe order.
    pub fn coordinates(&self) -> SpecTuple {
        match self {
            CanonicalId::Packed(id) => {
                let u = id.unpack();
                SpecTuple {
                    plate: u.plate,
                    mjd: u.mjd,
                    fiber: u.fiber,
                    run2d: u.run2d,
                    survey: "sdss".into(),
                }
            }
            CanonicalId::Tuple(t) => t.clone(),
        }
    }
}

/// Split the wire form into top-level tokens.
///
/// Quotes protect commas inside a field; parentheses group tuple fields.
/// Both commas and whitespace separate tokens at depth zero, matching the
/// two wire spellings (`id,id,...` and `(..) (..) ...`).
pub(crate) fn split_tokens(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match c {
            '\'' | '"' => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
                cur.push(c);
            }
            '(' if quote.is_none() => {
                depth += 1;
                cur.push(c);
            }
            ')' if quote.is_none() => {
                depth = depth.saturating_sub(1);
                cur.push(c);
            }
            ',' | ' ' | '\t' | '\n' if quote.is_none() && depth == 0 => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            _ => cur.push(c),
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

/// Split the inside of a tuple on commas, honoring quotes.
fn split_fields(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match c {
            '\'' | '"' => match quote {
                None => quote = Some(c),
                Some(q) if q == c => quote = None,
                Some(_) => cur.push(c),
            },
            ',' if quote.is_none() => fields.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    fields.push(cur);
    fields
}

fn parse_number(s: &str) -> Result<u32, IdError> {
    s.trim()
        .parse()
        .map_err(|_| IdError::Unparseable(format!("expected a number, got '{s}'")))
}

fn parse_tuple(token: &str) -> Result<IdToken, IdError> {
    let inner = token
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| IdError::Unparseable(format!("unbalanced tuple '{token}'")))?;

    let mut fields = split_fields(inner);
    if fields.len() > 5 {
        return Err(IdError::Unparseable(format!(
            "tuple '{token}' has more than 5 fields"
        )));
    }
    // Positional slots below arity 4 default to "any"; the survey slot
    // defaults later, at path resolution or catalog expansion.
    while fields.len() < 4 {
        fields.push("*".into());
    }

    let plate = FieldSpec::parse(&fields[0], false);
    let mjd = FieldSpec::parse(&fields[1], false);
    let fiber = FieldSpec::parse(&fields[2], true);
    let run2d = FieldSpec::parse(&fields[3], false);
    let survey = fields
        .get(4)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "*");

    let wild = plate.is_wild() || mjd.is_wild() || fiber.is_wild() || run2d.is_wild();
    if wild {
        return Ok(IdToken::Wildcard(WildcardTuple {
            plate,
            mjd,
            fiber,
            run2d,
            survey,
        }));
    }

    let (FieldSpec::One(p), FieldSpec::One(m), FieldSpec::One(f), FieldSpec::One(r)) =
        (&plate, &mjd, &fiber, &run2d)
    else {
        unreachable!("non-wild tuple has only One fields");
    };
    Ok(IdToken::Literal(SpecTuple {
        plate: parse_number(p)?,
        mjd: parse_number(m)?,
        fiber: parse_number(f)?,
        run2d: Some(ReductionVersion::parse(r)?),
        survey: survey.unwrap_or_else(|| "sdss".into()),
    }))
}

/// Parse the wire form of an identifier list into ordered tokens.
///
/// The input is a decimal integer, a parenthesized tuple, or a comma or
/// whitespace separated list of either, optionally wrapped in `[...]`.
pub fn parse_id_list(wire: &str) -> Result<Vec<IdToken>, IdError> {
    let s = wire.trim();
    let s = if s.starts_with('[') && s.ends_with(']') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    let raw_tokens = split_tokens(s);
    if raw_tokens.is_empty() {
        return Err(IdError::Unparseable("empty identifier list".into()));
    }

    // Fast path: a bare list of packed identifiers.
    if raw_tokens
        .iter()
        .all(|t| t.chars().all(|c| c.is_ascii_digit()) && !t.is_empty())
    {
        return raw_tokens
            .iter()
            .map(|t| {
                t.parse::<u64>()
                    .map(|v| IdToken::Packed(SpecObjId::new(v)))
                    .map_err(|_| IdError::Unparseable(format!("bad identifier '{t}'")))
            })
            .collect();
    }

    raw_tokens
        .iter()
        .map(|t| {
            let t = t.trim().trim_matches(|c| c == '\'' || c == '"');
            if t.starts_with('(') {
                parse_tuple(t)
            } else if t.chars().all(|c| c.is_ascii_digit()) && !t.is_empty() {
                t.parse::<u64>()
                    .map(|v| IdToken::Packed(SpecObjId::new(v)))
                    .map_err(|_| IdError::Unparseable(format!("bad identifier '{t}'")))
            } else {
                Err(IdError::Unparseable(format!("unknown identifier '{t}'")))
            }
        })
        .collect()
}
