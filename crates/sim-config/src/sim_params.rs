use genetics::{FathersCurseKernel, MutationKernel};

use crate::error::{ConfigError, ConfigErrorKind};

/// Resolved `sim_params` block: run-wide settings shared by every
/// replica, plus the mutation kernel every clone on the population will
/// share. Mirrors `main.cpp`'s `SimParams` object.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub num_simulations: u32,
    pub max_time: f64,
    pub max_cells: u64,
    pub sim_id: String,
    pub max_types: usize,
    kernel_kind: Option<String>,
    kernel_tokens: Vec<String>,
    fathers_curse_tokens: Option<Vec<String>>,
}

impl SimConfig {
    /// Apply one `sim_params` line's key/value tab fields.
    pub fn apply(&mut self, line_no: usize, fields: &[&str]) -> Result<(), ConfigError> {
        let [key, rest @ ..] = fields else {
            return Err(ConfigError::new(line_no, ConfigErrorKind::TooFewFields { expected: 2, found: fields.len() }));
        };
        match *key {
            "num_simulations" => self.num_simulations = parse_field(line_no, "num_simulations", rest.first())?,
            "max_time" => self.max_time = parse_field(line_no, "max_time", rest.first())?,
            "max_cells" => self.max_cells = parse_field(line_no, "max_cells", rest.first())?,
            "max_types" => self.max_types = parse_field(line_no, "max_types", rest.first())?,
            "sim_id" => {
                self.sim_id = rest
                    .first()
                    .ok_or_else(|| ConfigError::new(line_no, ConfigErrorKind::MissingRequired("sim_id".into())))?
                    .to_string();
            }
            "mut_handler_type" => {
                self.kernel_kind = Some(
                    rest.first()
                        .ok_or_else(|| ConfigError::new(line_no, ConfigErrorKind::MissingRequired("mut_handler_type".into())))?
                        .to_string(),
                );
            }
            "mut_handler_params" => {
                self.kernel_tokens = rest.iter().map(|s| s.to_string()).collect();
            }
            "fathers_curse_params" => {
                self.fathers_curse_tokens = Some(rest.iter().map(|s| s.to_string()).collect());
            }
            other => return Err(ConfigError::new(line_no, ConfigErrorKind::UnknownKey(other.to_string()))),
        }
        Ok(())
    }

    /// Build the mutation kernel named by `mut_handler_type`, or
    /// [`MutationKernel::None`] if the config never named one.
    pub fn build_kernel(&self) -> Result<MutationKernel, ConfigErrorKind> {
        match &self.kernel_kind {
            Some(kind) => Ok(MutationKernel::from_config(kind, &self.kernel_tokens)?),
            None => Ok(MutationKernel::None),
        }
    }

    /// Build the sexual-reproduction kernel, if `fathers_curse_params`
    /// was ever supplied.
    pub fn build_fathers_curse(&self) -> Result<Option<FathersCurseKernel>, ConfigErrorKind> {
        match &self.fathers_curse_tokens {
            Some(tokens) => Ok(Some(FathersCurseKernel::from_config(tokens)?)),
            None => Ok(None),
        }
    }
}

fn parse_field<T: std::str::FromStr>(line_no: usize, field: &str, value: Option<&&str>) -> Result<T, ConfigError> {
    let raw = value.ok_or_else(|| ConfigError::new(line_no, ConfigErrorKind::MissingRequired(field.to_string())))?;
    raw.parse().map_err(|_| {
        ConfigError::new(
            line_no,
            ConfigErrorKind::BadNumber { field: field.to_string(), value: raw.to_string() },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sim_params_key_is_rejected() {
        let mut cfg = SimConfig::default();
        let err = cfg.apply(3, &["bogus", "1"]).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ConfigErrorKind::UnknownKey(_)));
    }

    #[test]
    fn numeric_fields_parse() {
        let mut cfg = SimConfig::default();
        cfg.apply(1, &["num_simulations", "10"]).unwrap();
        cfg.apply(2, &["max_time", "100.5"]).unwrap();
        assert_eq!(cfg.num_simulations, 10);
        assert_eq!(cfg.max_time, 100.5);
    }

    #[test]
    fn absent_kernel_defaults_to_none() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.build_kernel().unwrap(), MutationKernel::None);
    }
}
