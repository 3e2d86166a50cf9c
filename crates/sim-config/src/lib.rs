//! Parses the tab-separated simulation config grammar into a runnable
//! [`population::Population`] and a list of [`WriterSpec`]s the `observer`
//! crate resolves into concrete writers.
//!
//! Every line is independent: a malformed line becomes a [`ConfigError`]
//! tagged with its 1-based source line number, and parsing continues so
//! one pass collects every error in the file rather than stopping at the
//! first.

/// Parsed `clone` line, resolved into a [`population::CloneKind`] template.
pub mod clone_decl;
/// Line-numbered, categorized parse failures.
pub mod error;
/// Parsed `pop_params` block: death rate and scheduling policy.
pub mod pop_params;
/// Parsed `sim_params` block: run-wide settings and the mutation kernel.
pub mod sim_params;
/// Parsed `writer` line, left unresolved for the `observer` crate.
pub mod writer_spec;

pub use clone_decl::CloneDecl;
pub use error::{ConfigError, ConfigErrorKind};
pub use pop_params::PopConfig;
pub use sim_params::SimConfig;
pub use writer_spec::WriterSpec;

use genetics::MutationKernel;
use population::Population;

/// Everything a config file resolved to: run settings, population
/// settings, every clone to seed, and every writer to build.
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    pub sim: SimConfig,
    pub pop: PopConfig,
    pub clones: Vec<CloneDecl>,
    pub writers: Vec<WriterSpec>,
}

impl ParsedConfig {
    /// Build a fresh [`Population`] from this config, seeding every
    /// declared clone. Returns [`ConfigErrorKind::EmptyPopulation`] if no
    /// clone line ever contributed a live cell.
    pub fn build_population(&self) -> Result<Population, ConfigError> {
        let kernel = self.sim.build_kernel().map_err(|kind| ConfigError::new(0, kind))?;
        let fathers_curse = self.sim.build_fathers_curse().map_err(|kind| ConfigError::new(0, kind))?;
        let max_types = self.sim.max_types.max(self.pop.max_types);

        let mut population = Population::new(max_types, self.pop.death_rate, self.pop.build_scheduling(), kernel, fathers_curse);
        for decl in &self.clones {
            decl.add_to(&mut population);
        }

        if population.total_cells() == 0 {
            return Err(ConfigError::new(0, ConfigErrorKind::EmptyPopulation));
        }

        population
            .check_init()
            .map_err(|source| ConfigError::new(0, ConfigErrorKind::NotRunnable(source)))?;

        Ok(population)
    }
}

/// Parse a whole config file's text. Returns every error found rather
/// than stopping at the first, mirroring `input_err.eevo`'s intent to
/// record every line's failure.
pub fn parse(text: &str) -> Result<ParsedConfig, Vec<ConfigError>> {
    let mut config = ParsedConfig::default();
    let mut errors = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let Some((keyword, rest)) = fields.split_first() else {
            continue;
        };

        let result = match *keyword {
            "sim_params" => config.sim.apply(line_no, rest).map_err(|e| vec![e]),
            "pop_params" => config.pop.apply(line_no, rest).map_err(|e| vec![e]),
            "clone" => match CloneDecl::parse(line_no, rest) {
                Ok(decl) => {
                    config.clones.push(decl);
                    Ok(())
                }
                Err(e) => Err(vec![e]),
            },
            "writer" => match WriterSpec::parse(line_no, rest) {
                Ok(spec) => {
                    config.writers.push(spec);
                    Ok(())
                }
                Err(e) => Err(vec![e]),
            },
            other => Err(vec![ConfigError::new(line_no, ConfigErrorKind::UnknownKeyword(other.to_string()))]),
        };

        if let Err(line_errors) = result {
            errors.extend(line_errors);
        }
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(errors)
    }
}

/// Render a set of parse errors in the `input_err.eevo` line format:
/// one `<line>: <message>` per error, already including the category
/// inside the message via [`ConfigError`]'s `Display`.
pub fn render_errors(errors: &[ConfigError]) -> String {
    let mut out = String::new();
    for err in errors {
        out.push_str(&err.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_builds_a_population() {
        let text = "sim_params\tnum_simulations\t1\nsim_params\tmax_time\t10\nsim_params\tmax_cells\t1000\npop_params\tdeath_rate\t0.1\nclone\tSimple\t0\t5\tbirth_rate,1.0\tmut_prob,0.0\n";
        let config = parse(text).unwrap();
        assert_eq!(config.sim.num_simulations, 1);
        let pop = config.build_population().unwrap();
        assert_eq!(pop.total_cells(), 5);
    }

    #[test]
    fn unknown_keyword_is_collected_not_fatal_to_parsing() {
        let text = "bogus\tfoo\nsim_params\tnum_simulations\t1\n";
        let errors = parse(text).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ConfigErrorKind::UnknownKeyword(_)));
    }

    #[test]
    fn multiple_bad_lines_are_all_collected() {
        let text = "bogus\tfoo\nsim_params\tbogus_key\t1\nclone\tNotAKind\t0\t1\n";
        let errors = parse(text).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn empty_population_is_rejected() {
        let text = "sim_params\tnum_simulations\t1\n";
        let config = parse(text).unwrap();
        let err = config.build_population().unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::EmptyPopulation));
    }
}
