use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use rng::{RandomSource, RngSubsystem};

/// Which analytical distribution a stochastic clone's birth-rate draw
/// comes from. Mirrors the three draw functions `StochClone` exposed in
/// the original model (`drawLogNorm`, `drawTruncGamma`,
/// `drawTruncDoubleExp`); all three are truncated at zero, since a
/// negative birth rate has no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReproductionDistribution {
    /// Log-normal, parameterized by linear-space mean/variance.
    LogNormal,
    /// Gamma, parameterized by mean/variance.
    Gamma,
    /// Truncated double-exponential (Laplace) centered on the mean.
    DoubleExponential,
}

fn draw_truncated<R: RandomSource>(
    dist: ReproductionDistribution,
    random: &mut R,
    mean: f64,
    var: f64,
    callsite: &str,
) -> f64 {
    let drawn = match dist {
        ReproductionDistribution::LogNormal => {
            random.log_normal(RngSubsystem::Reproduction, 0, mean, var, callsite)
        }
        ReproductionDistribution::Gamma => random.gamma(RngSubsystem::Reproduction, 0, mean, var, callsite),
        ReproductionDistribution::DoubleExponential => {
            mean + random.truncated_double_exponential(
                RngSubsystem::Reproduction,
                0,
                (var / 2.0).sqrt(),
                callsite,
            )
        }
    };
    if drawn < 0.0 {
        tracing::warn!(dist = ?dist, drawn, callsite, "floored a negative birth-rate draw to 0.0");
    }
    drawn.max(0.0)
}

/// How a clone's daughter is produced on a birth event that is not a
/// type-changing mutation.
///
/// [`CloneKind::Simple`] is the only variant whose clones can hold more
/// than one cell: a simple clone's reproduction just grows its own
/// count. Every other variant always represents exactly one cell — "each
/// cell is its own singleton clone" — and reproduction spins off a brand
/// new singleton clone for the daughter while the parent clone is left
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CloneKind {
    /// Fixed birth rate shared by every cell in the clone.
    Simple,
    /// Daughter's birth rate is drawn fresh from the type-wide
    /// `(mean, var)` distribution, independent of the parent's own rate.
    TypeSpecific {
        /// Type-wide mean birth rate.
        mean: f64,
        /// Type-wide birth-rate variance.
        var: f64,
        /// Distribution family to draw from.
        dist: ReproductionDistribution,
    },
    /// Daughter's birth rate is drawn centered on the parent's *current*
    /// birth rate, so drift compounds generation over generation.
    Heritable {
        /// Variance of the per-generation draw.
        var: f64,
        /// Distribution family to draw from.
        dist: ReproductionDistribution,
    },
    /// Heritable drift, but only the most recent `num_gen_persist`
    /// generations' offsets contribute; older ones age out of the FIFO.
    HerReset {
        /// Variance of each generation's offset draw.
        var: f64,
        /// Distribution family offsets are drawn from, centered at zero.
        dist: ReproductionDistribution,
        /// Window length; `active_diff.len()` is always exactly this.
        num_gen_persist: usize,
        /// Birth rate new lineages reset toward once their offsets age out.
        baseline_mean: f64,
        /// FIFO of the last `num_gen_persist` per-generation offsets.
        active_diff: VecDeque<f64>,
    },
    /// Like [`CloneKind::TypeSpecific`] but drawing from an empirical CDF
    /// table instead of an analytical distribution.
    TypeEmpiric {
        /// Sorted `(value, cumulative_probability)` pairs.
        table: Vec<(f64, f64)>,
    },
    /// Like [`CloneKind::Heritable`] but drawing offsets from an
    /// empirical CDF table.
    HerEmpiric {
        /// Sorted `(value, cumulative_probability)` pairs.
        table: Vec<(f64, f64)>,
    },
    /// Like [`CloneKind::HerReset`] but drawing offsets from an
    /// empirical CDF table.
    HerResetEmpiric {
        /// Sorted `(value, cumulative_probability)` pairs.
        table: Vec<(f64, f64)>,
        /// Window length; `active_diff.len()` is always exactly this.
        num_gen_persist: usize,
        /// Birth rate new lineages reset toward once their offsets age out.
        baseline_mean: f64,
        /// FIFO of the last `num_gen_persist` per-generation offsets.
        active_diff: VecDeque<f64>,
    },
}

impl CloneKind {
    /// Build a [`CloneKind::HerReset`] or [`CloneKind::HerResetEmpiric`]
    /// with its FIFO pre-filled with `num_gen_persist` zero offsets, so
    /// the length invariant holds from construction.
    pub fn her_reset(var: f64, dist: ReproductionDistribution, num_gen_persist: usize, baseline_mean: f64) -> Self {
        CloneKind::HerReset {
            var,
            dist,
            num_gen_persist,
            baseline_mean,
            active_diff: std::iter::repeat(0.0).take(num_gen_persist).collect(),
        }
    }

    /// Build a [`CloneKind::HerResetEmpiric`] with its FIFO pre-filled.
    pub fn her_reset_empiric(table: Vec<(f64, f64)>, num_gen_persist: usize, baseline_mean: f64) -> Self {
        CloneKind::HerResetEmpiric {
            table,
            num_gen_persist,
            baseline_mean,
            active_diff: std::iter::repeat(0.0).take(num_gen_persist).collect(),
        }
    }

    /// Produce the daughter's birth rate (and, for this clone's own
    /// record, nothing — the parent clone is never mutated by
    /// reproduction). Returns `None` for [`CloneKind::Simple`], whose
    /// "daughter" is just another cell in the same clone.
    pub fn reproduce<R: RandomSource>(&self, random: &mut R, parent_birth_rate: f64) -> Option<(f64, CloneKind)> {
        match self {
            CloneKind::Simple => None,

            CloneKind::TypeSpecific { mean, var, dist } => {
                let birth = draw_truncated(*dist, random, *mean, *var, "clone.rs:type_specific");
                Some((birth, self.clone()))
            }

            CloneKind::Heritable { var, dist } => {
                let birth = draw_truncated(*dist, random, parent_birth_rate, *var, "clone.rs:heritable");
                Some((birth, self.clone()))
            }

            CloneKind::HerReset {
                var,
                dist,
                num_gen_persist,
                baseline_mean,
                active_diff,
            } => {
                let offset = draw_truncated(*dist, random, 0.0, *var, "clone.rs:her_reset") - 0.0;
                let mut diffs = active_diff.clone();
                diffs.push_back(offset);
                while diffs.len() > *num_gen_persist {
                    diffs.pop_front();
                }
                let birth = (baseline_mean + diffs.iter().sum::<f64>()).max(0.0);
                let kind = CloneKind::HerReset {
                    var: *var,
                    dist: *dist,
                    num_gen_persist: *num_gen_persist,
                    baseline_mean: *baseline_mean,
                    active_diff: diffs,
                };
                Some((birth, kind))
            }

            CloneKind::TypeEmpiric { table } => {
                let birth = random
                    .empirical(RngSubsystem::Reproduction, 0, table, "clone.rs:type_empiric")
                    .max(0.0);
                Some((birth, self.clone()))
            }

            CloneKind::HerEmpiric { table } => {
                let offset = random.empirical(RngSubsystem::Reproduction, 0, table, "clone.rs:her_empiric");
                let birth = (parent_birth_rate + offset).max(0.0);
                Some((birth, self.clone()))
            }

            CloneKind::HerResetEmpiric {
                table,
                num_gen_persist,
                baseline_mean,
                active_diff,
            } => {
                let offset = random.empirical(RngSubsystem::Reproduction, 0, table, "clone.rs:her_reset_empiric");
                let mut diffs = active_diff.clone();
                diffs.push_back(offset);
                while diffs.len() > *num_gen_persist {
                    diffs.pop_front();
                }
                let birth = (baseline_mean + diffs.iter().sum::<f64>()).max(0.0);
                let kind = CloneKind::HerResetEmpiric {
                    table: table.clone(),
                    num_gen_persist: *num_gen_persist,
                    baseline_mean: *baseline_mean,
                    active_diff: diffs,
                };
                Some((birth, kind))
            }
        }
    }

    /// Whether this clone's cells are each necessarily their own
    /// singleton clone (every variant but [`CloneKind::Simple`]).
    pub fn is_singleton(&self) -> bool {
        !matches!(self, CloneKind::Simple)
    }
}

/// A group of cells sharing a type, birth rate, and mutation probability.
///
/// Simple clones can hold many cells; every other [`CloneKind`] holds
/// exactly one. Named `CellClone` rather than `Clone` to avoid colliding
/// with `std::clone::Clone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellClone {
    id: u64,
    type_index: usize,
    cell_count: u64,
    birth_rate: f64,
    mut_prob: f64,
    kind: CloneKind,
}

impl CellClone {
    /// Construct a new clone. `cell_count` must be `1` for any
    /// non-[`CloneKind::Simple`] kind; callers (population setup, and
    /// this module's own reproduction logic) are expected to uphold that.
    pub fn new(id: u64, type_index: usize, birth_rate: f64, mut_prob: f64, cell_count: u64, kind: CloneKind) -> Self {
        Self {
            id,
            type_index,
            cell_count,
            birth_rate,
            mut_prob,
            kind,
        }
    }

    /// Unique id among all clones ever created in this run.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Genotype type this clone belongs to.
    pub fn type_index(&self) -> usize {
        self.type_index
    }

    /// Live cell count.
    pub fn cell_count(&self) -> u64 {
        self.cell_count
    }

    /// Per-cell birth rate.
    pub fn birth_rate(&self) -> f64 {
        self.birth_rate
    }

    /// Per-division mutation probability.
    pub fn mut_prob(&self) -> f64 {
        self.mut_prob
    }

    /// `birth_rate * cell_count`: this clone's contribution to the
    /// population's total birth rate.
    pub fn total_birth(&self) -> f64 {
        self.birth_rate * self.cell_count as f64
    }

    /// The clone's reproduction policy.
    pub fn kind(&self) -> &CloneKind {
        &self.kind
    }

    pub(crate) fn add_cell(&mut self) {
        self.cell_count += 1;
    }

    pub(crate) fn remove_cell(&mut self) {
        self.cell_count = self.cell_count.saturating_sub(1);
    }

    pub(crate) fn set_kind(&mut self, kind: CloneKind) {
        self.kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rng::StubRandomSource;

    #[test]
    fn simple_clone_reproduction_is_none() {
        let kind = CloneKind::Simple;
        let mut stub = StubRandomSource::new([]);
        assert!(kind.reproduce(&mut stub, 1.0).is_none());
    }

    #[test]
    fn her_reset_invariant_holds_after_many_generations() {
        let mut kind = CloneKind::her_reset(1.0, ReproductionDistribution::Gamma, 3, 2.0);
        let mut stub = StubRandomSource::new(std::iter::repeat(0.3).take(100));

        for _ in 0..10 {
            let (_, next_kind) = kind.reproduce(&mut stub, 2.0).unwrap();
            kind = next_kind;
            if let CloneKind::HerReset { active_diff, num_gen_persist, .. } = &kind {
                assert_eq!(active_diff.len(), *num_gen_persist);
            } else {
                panic!("expected HerReset kind to persist its shape");
            }
        }
    }

    #[test]
    fn heritable_draws_are_never_negative() {
        let kind = CloneKind::Heritable {
            var: 0.5,
            dist: ReproductionDistribution::DoubleExponential,
        };
        let mut stub = StubRandomSource::new([0.99, 0.99]);
        let (birth, _) = kind.reproduce(&mut stub, 0.01).unwrap();
        assert!(birth >= 0.0);
    }
}
