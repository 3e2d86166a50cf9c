use crate::error::KernelConfigError;

/// Split a `key,value` config token on its first comma.
///
/// Mirrors the original parser's `getline(ss, pre, ',')` /
/// `getline(ss, post)` pair: a token with no comma is rejected outright.
pub fn split_kv(token: &str) -> Result<(&str, &str), KernelConfigError> {
    match token.split_once(',') {
        Some((key, value)) if !value.is_empty() => Ok((key, value)),
        _ => Err(KernelConfigError::MissingValue {
            token: token.to_string(),
        }),
    }
}

/// Parse a token's value half as `f64`, tagging parse failures with the key.
pub fn parse_f64(key: &str, value: &str) -> Result<f64, KernelConfigError> {
    value.parse::<f64>().map_err(|_| KernelConfigError::BadNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a token's value half as `usize`, tagging parse failures with the key.
pub fn parse_usize(key: &str, value: &str) -> Result<usize, KernelConfigError> {
    value.parse::<usize>().map_err(|_| KernelConfigError::BadNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Require that a distribution-shape parameter (variance, scale) is
/// strictly positive, as the original parser does for `lognorm`/`norm`/
/// `gamma`/`doubleexp`.
pub fn require_positive(key: &str, value: f64) -> Result<(), KernelConfigError> {
    if value <= 0.0 {
        Err(KernelConfigError::NonPositiveParameter {
            key: key.to_string(),
            value,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_kv_rejects_missing_comma() {
        assert!(split_kv("mu2_only").is_err());
    }

    #[test]
    fn split_kv_splits_on_first_comma() {
        let (k, v) = split_kv("fit1,0.5,extra").unwrap();
        assert_eq!(k, "fit1");
        assert_eq!(v, "0.5,extra");
    }

    #[test]
    fn parse_f64_reports_bad_key() {
        let err = parse_f64("fit1", "not-a-number").unwrap_err();
        assert!(matches!(err, KernelConfigError::BadNumber { .. }));
    }
}
