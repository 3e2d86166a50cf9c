use genetics::config::{parse_f64, parse_usize, split_kv};
use population::{CloneKind, Population, ReproductionDistribution};

use crate::error::{ConfigError, ConfigErrorKind};

/// One parsed `clone` line, resolved into everything needed to add its
/// cells to a [`Population`].
#[derive(Debug, Clone)]
pub struct CloneDecl {
    line: usize,
    type_index: usize,
    num_cells: u64,
    mut_prob: f64,
    birth_rate: f64,
    kind_template: CloneKind,
}

impl CloneDecl {
    /// Parse `clone <kind> <type_index> <num_cells> <comma-tokens...>`
    /// (the `clone` keyword already stripped from `fields`).
    pub fn parse(line: usize, fields: &[&str]) -> Result<Self, ConfigError> {
        let [kind, type_index, num_cells, tokens @ ..] = fields else {
            return Err(ConfigError::new(line, ConfigErrorKind::TooFewFields { expected: 3, found: fields.len() }));
        };
        let type_index = parse_usize("type_index", type_index).map_err(|e| to_config_error(line, e))?;
        let num_cells: u64 = num_cells.parse().map_err(|_| {
            ConfigError::new(line, ConfigErrorKind::BadNumber { field: "num_cells".into(), value: (*num_cells).to_string() })
        })?;

        let params = TokenParams::new(line, tokens)?;
        let birth_rate = params.f64_or(line, "birth_rate", 0.0)?;
        let mut_prob = params.f64_or(line, "mut_prob", 0.0)?;

        let kind_template = match *kind {
            "Simple" => CloneKind::Simple,
            "TypeSpecific" => CloneKind::TypeSpecific {
                mean: params.f64_required(line, "mean")?,
                var: params.f64_required(line, "var")?,
                dist: params.dist_required(line, "dist")?,
            },
            "Heritable" => CloneKind::Heritable {
                var: params.f64_required(line, "var")?,
                dist: params.dist_required(line, "dist")?,
            },
            "HerReset" => CloneKind::her_reset(
                params.f64_required(line, "var")?,
                params.dist_required(line, "dist")?,
                params.usize_required(line, "num_gen_persist")?,
                params.f64_or(line, "baseline_mean", birth_rate)?,
            ),
            "TypeEmpiric" => CloneKind::TypeEmpiric { table: params.table_required(line, "table_file")? },
            "HerEmpiric" => CloneKind::HerEmpiric { table: params.table_required(line, "table_file")? },
            "HerResetEmpiric" => CloneKind::her_reset_empiric(
                params.table_required(line, "table_file")?,
                params.usize_required(line, "num_gen_persist")?,
                params.f64_or(line, "baseline_mean", birth_rate)?,
            ),
            other => return Err(ConfigError::new(line, ConfigErrorKind::UnknownKind(other.to_string()))),
        };

        Ok(Self { line, type_index, num_cells, mut_prob, birth_rate, kind_template })
    }

    /// Add this declaration's cells to `population`: one cohort of
    /// `num_cells` for [`CloneKind::Simple`], or `num_cells` independent
    /// singleton clones for every other kind.
    pub fn add_to(&self, population: &mut Population) {
        if self.kind_template.is_singleton() {
            for _ in 0..self.num_cells {
                population.add_root_clone(self.type_index, self.birth_rate, self.mut_prob, 1, self.kind_template.clone());
            }
        } else {
            population.add_root_clone(self.type_index, self.birth_rate, self.mut_prob, self.num_cells, self.kind_template.clone());
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

fn to_config_error(line: usize, err: genetics::KernelConfigError) -> ConfigError {
    ConfigError::new(line, ConfigErrorKind::Kernel(err))
}

/// Comma-token `key,value` pairs shared by a single `clone` line,
/// parsed once up front so each kind arm just looks its keys up.
struct TokenParams<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> TokenParams<'a> {
    fn new(line: usize, tokens: &'a [&'a str]) -> Result<Self, ConfigError> {
        let pairs = tokens
            .iter()
            .map(|tok| split_kv(tok).map_err(|e| to_config_error(line, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn f64_required(&self, line: usize, key: &str) -> Result<f64, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::new(line, ConfigErrorKind::MissingRequired(key.to_string())))?;
        parse_f64(key, value).map_err(|e| to_config_error(line, e))
    }

    fn f64_or(&self, line: usize, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.get(key) {
            Some(value) => parse_f64(key, value).map_err(|e| to_config_error(line, e)),
            None => Ok(default),
        }
    }

    fn usize_required(&self, line: usize, key: &str) -> Result<usize, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::new(line, ConfigErrorKind::MissingRequired(key.to_string())))?;
        parse_usize(key, value).map_err(|e| to_config_error(line, e))
    }

    fn dist_required(&self, line: usize, key: &str) -> Result<ReproductionDistribution, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::new(line, ConfigErrorKind::MissingRequired(key.to_string())))?;
        match value {
            "lognorm" => Ok(ReproductionDistribution::LogNormal),
            "gamma" => Ok(ReproductionDistribution::Gamma),
            "doubleexp" => Ok(ReproductionDistribution::DoubleExponential),
            other => Err(ConfigError::new(line, ConfigErrorKind::UnknownKind(other.to_string()))),
        }
    }

    fn table_required(&self, line: usize, key: &str) -> Result<Vec<(f64, f64)>, ConfigError> {
        let path = self.get(key).ok_or_else(|| ConfigError::new(line, ConfigErrorKind::MissingRequired(key.to_string())))?;
        load_empirical_table(line, path)
    }
}

fn load_empirical_table(line: usize, path: &str) -> Result<Vec<(f64, f64)>, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::new(line, ConfigErrorKind::EmpiricalTableIo { path: path.to_string(), source }))?;
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let (value, prob) = l
                .split_once(',')
                .ok_or_else(|| ConfigError::new(line, ConfigErrorKind::MalformedEmpiricalLine(l.to_string())))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::new(line, ConfigErrorKind::MalformedEmpiricalLine(l.to_string())))?;
            let prob: f64 = prob
                .trim()
                .parse()
                .map_err(|_| ConfigError::new(line, ConfigErrorKind::MalformedEmpiricalLine(l.to_string())))?;
            Ok((value, prob))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use population::SchedulingPolicy;

    #[test]
    fn simple_clone_adds_one_cohort() {
        let decl = CloneDecl::parse(1, &["Simple", "0", "5", "birth_rate,1.0", "mut_prob,0.0"]).unwrap();
        let mut pop = Population::new(4, 0.1, SchedulingPolicy::Branching, genetics::MutationKernel::None, None);
        decl.add_to(&mut pop);
        assert_eq!(pop.total_cells(), 5);
        assert_eq!(pop.clones().len(), 1);
    }

    #[test]
    fn heritable_clone_splits_into_singletons() {
        let decl = CloneDecl::parse(1, &["Heritable", "0", "3", "birth_rate,1.0", "var,0.1", "dist,gamma"]).unwrap();
        let mut pop = Population::new(4, 0.1, SchedulingPolicy::Branching, genetics::MutationKernel::None, None);
        decl.add_to(&mut pop);
        assert_eq!(pop.total_cells(), 3);
        assert_eq!(pop.clones().len(), 3);
    }

    #[test]
    fn unknown_clone_kind_is_rejected() {
        let err = CloneDecl::parse(1, &["Bogus", "0", "1"]).unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::UnknownKind(_)));
    }
}
