use crate::error::{ConfigError, ConfigErrorKind};

/// One parsed `writer` line: a kind name and its raw parameter tokens.
/// Left unresolved here deliberately — building the concrete observer
/// lives in the `observer` crate, which this crate does not depend on,
/// so the two families of output format and config grammar can evolve
/// independently.
#[derive(Debug, Clone)]
pub struct WriterSpec {
    pub line: usize,
    pub kind: String,
    pub tokens: Vec<String>,
}

impl WriterSpec {
    /// Parse `writer <kind> <params...>` (the `writer` keyword already
    /// stripped from `fields`).
    pub fn parse(line: usize, fields: &[&str]) -> Result<Self, ConfigError> {
        let [kind, tokens @ ..] = fields else {
            return Err(ConfigError::new(line, ConfigErrorKind::TooFewFields { expected: 1, found: fields.len() }));
        };
        Ok(Self {
            line,
            kind: kind.to_string(),
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_and_tokens() {
        let spec = WriterSpec::parse(1, &["CellCount", "0", "2"]).unwrap();
        assert_eq!(spec.kind, "CellCount");
        assert_eq!(spec.tokens, vec!["0", "2"]);
    }
}
