use std::collections::HashMap;

use super::SvcError;

/// Decoded request parameters with wire-protocol typing rules.
///
/// Booleans travel as `"true"`/`"false"` (any case), numerics as
/// decimal strings; anything else in those slots is a parameter error,
/// never a panic or a 400.
#[derive(Debug, Clone, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Wrap a decoded query or form map.
    pub fn new(map: HashMap<String, String>) -> Self {
        Params(map)
    }

    /// String value, empty when absent.
    pub fn str(&self, key: &str) -> &str {
        self.0.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    /// String value, failing when absent or empty.
    pub fn required(&self, key: &str) -> Result<&str, SvcError> {
        let v = self.str(key);
        if v.trim().is_empty() {
            return Err(SvcError::Param(format!("missing parameter '{key}'")));
        }
        Ok(v)
    }

    /// Boolean slot with a default.
    pub fn bool(&self, key: &str, default: bool) -> Result<bool, SvcError> {
        let v = self.str(key).trim();
        if v.is_empty() {
            return Ok(default);
        }
        match v.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(SvcError::Param(format!(
                "parameter '{key}' must be true/false, got '{other}'"
            ))),
        }
    }

    /// Float slot with a default.
    pub fn f64(&self, key: &str, default: f64) -> Result<f64, SvcError> {
        let v = self.str(key).trim();
        if v.is_empty() {
            return Ok(default);
        }
        v.parse()
            .map_err(|_| SvcError::Param(format!("parameter '{key}' is not a number: '{v}'")))
    }

    /// Unsigned integer slot with a default.
    pub fn u32(&self, key: &str, default: u32) -> Result<u32, SvcError> {
        let v = self.str(key).trim();
        if v.is_empty() {
            return Ok(default);
        }
        v.parse()
            .map_err(|_| SvcError::Param(format!("parameter '{key}' is not an integer: '{v}'")))
    }

    /// Optional 64-bit identifier slot.
    pub fn u64_opt(&self, key: &str) -> Result<Option<u64>, SvcError> {
        let v = self.str(key).trim();
        if v.is_empty() {
            return Ok(None);
        }
        v.parse()
            .map(Some)
            .map_err(|_| SvcError::Param(format!("parameter '{key}' is not an identifier: '{v}'")))
    }

    /// The requested column subset: `None` means all columns.
    pub fn values(&self, key: &str) -> Option<Vec<String>> {
        let v = self.str(key).trim();
        if v.is_empty() || v.eq_ignore_ascii_case("all") {
            return None;
        }
        Some(
            v.split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        Params::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_bool_parsing() {
        let p = params(&[("align", "True"), ("debug", "false"), ("bad", "yes")]);
        assert!(p.bool("align", false).unwrap());
        assert!(!p.bool("debug", true).unwrap());
        assert!(p.bool("missing", true).unwrap());
        assert!(p.bool("bad", false).is_err());
    }

    #[test]
    fn test_numeric_defaults() {
        let p = params(&[("w0", "3.55"), ("ncols", "5")]);
        assert_eq!(p.f64("w0", 0.0).unwrap(), 3.55);
        assert_eq!(p.f64("w1", 0.0).unwrap(), 0.0);
        assert_eq!(p.u32("ncols", 1).unwrap(), 5);
        assert!(p.f64("ncols", 0.0).is_ok());
        assert!(p.u32("w0", 0).is_err());
    }

    #[test]
    fn test_values_subset() {
        let p = params(&[("values", "FLUX, ivar"), ("all", "all")]);
        assert_eq!(
            p.values("values"),
            Some(vec!["flux".to_string(), "ivar".to_string()])
        );
        assert_eq!(p.values("all"), None);
        assert_eq!(p.values("missing"), None);
    }
}
