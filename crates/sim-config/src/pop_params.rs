use std::collections::VecDeque;

use population::{PassageEvent, SchedulingPolicy};

use crate::error::{ConfigError, ConfigErrorKind};

/// Which scheduling policy a `pop_params scheduling` line selected, kept
/// separate from [`PopConfig`]'s accumulated passage/sex fields until
/// [`PopConfig::build_scheduling`] assembles the final
/// [`SchedulingPolicy`].
#[derive(Debug, Clone, PartialEq)]
enum SchedulingChoice {
    Branching,
    Moran,
    UpdateAll { timestep: f64 },
    Passage,
    SexRepr,
}

/// Resolved `pop_params` block: the death rate and scheduling variant a
/// [`population::engine::Population`] is built with.
#[derive(Debug, Clone)]
pub struct PopConfig {
    pub death_rate: f64,
    pub max_types: usize,
    choice: Option<SchedulingChoice>,
    passage_schedule: VecDeque<PassageEvent>,
    female_types: Vec<usize>,
    male_types: Vec<usize>,
}

impl Default for PopConfig {
    fn default() -> Self {
        Self {
            death_rate: 0.0,
            max_types: 1,
            choice: None,
            passage_schedule: VecDeque::new(),
            female_types: Vec::new(),
            male_types: Vec::new(),
        }
    }
}

impl PopConfig {
    /// Apply one `pop_params` line's key/value tab fields.
    pub fn apply(&mut self, line_no: usize, fields: &[&str]) -> Result<(), ConfigError> {
        let [key, rest @ ..] = fields else {
            return Err(ConfigError::new(line_no, ConfigErrorKind::TooFewFields { expected: 2, found: fields.len() }));
        };
        match *key {
            "death_rate" => {
                self.death_rate = parse_f64(line_no, "death_rate", rest.first())?;
            }
            "scheduling" => {
                self.choice = Some(parse_scheduling(line_no, rest)?);
            }
            "passage_event" => {
                let [time_str, target_str] = rest else {
                    return Err(ConfigError::new(line_no, ConfigErrorKind::TooFewFields { expected: 2, found: rest.len() }));
                };
                let time = parse_f64(line_no, "passage_event.time", Some(time_str))?;
                let target_cells = parse_u64(line_no, "passage_event.target_cells", Some(target_str))?;
                self.passage_schedule.push_back(PassageEvent { time, target_cells });
            }
            "female_types" => {
                self.female_types = parse_index_list(line_no, "female_types", rest)?;
            }
            "male_types" => {
                self.male_types = parse_index_list(line_no, "male_types", rest)?;
            }
            other => return Err(ConfigError::new(line_no, ConfigErrorKind::UnknownKey(other.to_string()))),
        }
        Ok(())
    }

    /// Build the final [`SchedulingPolicy`], defaulting to
    /// [`SchedulingPolicy::Branching`] if no `scheduling` line appeared.
    pub fn build_scheduling(&self) -> SchedulingPolicy {
        match self.choice.clone().unwrap_or(SchedulingChoice::Branching) {
            SchedulingChoice::Branching => SchedulingPolicy::Branching,
            SchedulingChoice::Moran => SchedulingPolicy::Moran,
            SchedulingChoice::UpdateAll { timestep } => SchedulingPolicy::UpdateAll { timestep },
            SchedulingChoice::Passage => SchedulingPolicy::Passage { schedule: self.passage_schedule.clone() },
            SchedulingChoice::SexRepr => SchedulingPolicy::SexRepr {
                female_types: self.female_types.clone(),
                male_types: self.male_types.clone(),
            },
        }
    }
}

fn parse_scheduling(line_no: usize, rest: &[&str]) -> Result<SchedulingChoice, ConfigError> {
    match rest.first().copied() {
        Some("branching") => Ok(SchedulingChoice::Branching),
        Some("moran") => Ok(SchedulingChoice::Moran),
        Some("update_all") => {
            let timestep = parse_f64(line_no, "scheduling.timestep", rest.get(1))?;
            Ok(SchedulingChoice::UpdateAll { timestep })
        }
        Some("passage") => Ok(SchedulingChoice::Passage),
        Some("sex_repr") => Ok(SchedulingChoice::SexRepr),
        Some(other) => Err(ConfigError::new(line_no, ConfigErrorKind::UnknownKind(other.to_string()))),
        None => Err(ConfigError::new(line_no, ConfigErrorKind::MissingRequired("scheduling".into()))),
    }
}

fn parse_index_list(line_no: usize, field: &str, rest: &[&str]) -> Result<Vec<usize>, ConfigError> {
    rest.iter()
        .map(|tok| {
            tok.parse::<usize>().map_err(|_| {
                ConfigError::new(line_no, ConfigErrorKind::BadNumber { field: field.to_string(), value: tok.to_string() })
            })
        })
        .collect()
}

fn parse_f64(line_no: usize, field: &str, value: Option<&&str>) -> Result<f64, ConfigError> {
    let raw = value.ok_or_else(|| ConfigError::new(line_no, ConfigErrorKind::MissingRequired(field.to_string())))?;
    raw.parse().map_err(|_| {
        ConfigError::new(line_no, ConfigErrorKind::BadNumber { field: field.to_string(), value: raw.to_string() })
    })
}

fn parse_u64(line_no: usize, field: &str, value: Option<&&str>) -> Result<u64, ConfigError> {
    let raw = value.ok_or_else(|| ConfigError::new(line_no, ConfigErrorKind::MissingRequired(field.to_string())))?;
    raw.parse().map_err(|_| {
        ConfigError::new(line_no, ConfigErrorKind::BadNumber { field: field.to_string(), value: raw.to_string() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheduling_is_branching() {
        let cfg = PopConfig::default();
        assert!(matches!(cfg.build_scheduling(), SchedulingPolicy::Branching));
    }

    #[test]
    fn passage_events_accumulate_in_order() {
        let mut cfg = PopConfig::default();
        cfg.apply(1, &["scheduling", "passage"]).unwrap();
        cfg.apply(2, &["passage_event", "5", "100"]).unwrap();
        cfg.apply(3, &["passage_event", "10", "50"]).unwrap();
        match cfg.build_scheduling() {
            SchedulingPolicy::Passage { schedule } => {
                assert_eq!(schedule.len(), 2);
                assert_eq!(schedule[0].target_cells, 100);
                assert_eq!(schedule[1].time, 10.0);
            }
            other => panic!("expected Passage, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scheduling_kind_is_rejected() {
        let mut cfg = PopConfig::default();
        let err = cfg.apply(1, &["scheduling", "bogus"]).unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::UnknownKind(_)));
    }
}
