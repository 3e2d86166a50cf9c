use std::fs;

use rng::{RandomSource, RngSubsystem};
use serde::{Deserialize, Serialize};

use crate::config::{parse_f64, parse_usize, require_positive, split_kv};
use crate::error::{KernelConfigError, MutationError};
use crate::type_directory::TypeDirectory;

/// The resolved outcome of a mutation event: the daughter's destination
/// type, its birth rate, and the mutation probability it inherits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutantDescriptor {
    /// Type index the mutant cell belongs to after this event.
    pub new_type: usize,
    /// Birth rate assigned to the mutant's clone.
    pub birth_rate: f64,
    /// Mutation probability the mutant's clone will use going forward.
    pub mut_prob: f64,
}

/// A polymorphic mutation kernel, chosen per simulation by configuration.
///
/// Each variant mirrors one of the original simulator's `MutationHandler`
/// subclasses. The kernel is modeled as a tagged enum rather than a
/// trait-object hierarchy: the set of operations any kernel performs
/// (parse its parameters, resolve one mutant) is small and closed, so
/// matching on a variant is simpler than dynamic dispatch through a
/// shared base type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MutationKernel {
    /// No mutation is configured; mutating is a configuration error.
    None,
    /// Fresh, unconstrained type space; daughter inherits the mother's
    /// birth rate and mutation probability unchanged.
    Neutral,
    /// Three-type forward-only model (0 -> 1 -> 2, absorbing at 2) with
    /// additive fitness offsets.
    ThreeTypes {
        /// Mutation rate out of type 1 into type 2.
        mu2: f64,
        /// Additive fitness term applied at the 0 -> 1 transition.
        fit1: f64,
        /// Additive fitness term applied at the 1 -> 2 transition.
        fit2: f64,
    },
    /// Same transition structure as [`MutationKernel::ThreeTypes`] but
    /// with multiplicative fitness scaling.
    ThreeTypesMult {
        /// Mutation rate out of type 1 into type 2.
        mu2: f64,
        /// Multiplicative fitness factor at the 0 -> 1 transition.
        fit1: f64,
        /// Multiplicative fitness factor at the 1 -> 2 transition.
        fit2: f64,
    },
    /// Three-type model where type 0 can jump directly to type 2 with
    /// probability `p1`, otherwise following the usual 0 -> 1 path.
    ThreeTypesFlex {
        /// Mutation rate out of type 1 into type 2.
        mu2: f64,
        /// Probability of a direct 0 -> 2 jump.
        p1: f64,
        /// Birth rate assigned on entering type 1.
        fit1: f64,
        /// Birth rate assigned on entering type 2.
        fit2: f64,
    },
    /// Generalization of [`MutationKernel::ThreeTypesFlex`] to repeating
    /// blocks of `num_types` indices, so the same three-stage kernel can
    /// be instantiated independently across many lineages.
    ManyTypesFlex {
        /// Mutation rate out of the "type 1" stage into "type 2".
        mu2: f64,
        /// Probability of a direct jump to the "type 2" stage.
        p1: f64,
        /// Birth rate assigned on entering the "type 1" stage.
        fit1: f64,
        /// Birth rate assigned on entering the "type 2" stage.
        fit2: f64,
        /// Block size; stage `k` of lineage block `n` lives at index
        /// `n * num_types + k` (with block 0's "type 1"/"type 2" stages
        /// routed to `num_types + index` / `2 * num_types + index`).
        num_types: usize,
    },
    /// Benefit shrinks geometrically with mutation depth:
    /// `offset = U(0, max_gain) * dim_rate^depth`.
    DimReturnsUnif {
        /// Per-depth-level decay factor, typically in `(0, 1)`.
        dim_rate: f64,
        /// Upper bound of the uniform benefit draw at depth zero.
        max_gain: f64,
    },
    /// A fixed adjacency graph over a closed type space: each type may
    /// mutate only into types its adjacency row names, chosen uniformly
    /// among the available destinations.
    FixedSites {
        /// Size of the closed type space.
        max_types: usize,
        /// Whether fitness combination is multiplicative (`true`) or
        /// additive (`false`).
        is_mult: bool,
        /// Per-type fitness values, indexed by type.
        fitnesses: Vec<f64>,
        /// Row-major `max_types x max_types` adjacency matrix; a
        /// negative entry marks "no edge", non-negative entries name
        /// the destination type index.
        adjacency: Vec<i64>,
    },
    /// Draws a birth-rate offset (or absolute value, if `is_fixed`) from
    /// a named distribution, with a configurable floor-to-zero probability.
    ParamDist {
        /// First distribution parameter (mean, or `low` for `unif`).
        param1: f64,
        /// Second distribution parameter (variance, or `high` for `unif`).
        param2: f64,
        /// Probability of flooring the result to zero regardless of sign.
        zero_prob: f64,
        /// Whether the draw replaces the birth rate outright (`true`) or
        /// offsets it (`false`).
        is_fixed: bool,
        /// Which named distribution to draw from: `lognorm`, `norm`,
        /// `gamma`, `doubleexp`, or `unif`.
        dist_type: String,
    },
}

impl MutationKernel {
    /// Resolve a mutant's destination type, birth rate, and mutation
    /// probability for a cell of `parent_index` currently at birth rate
    /// `b` and mutation probability `mut_prob`.
    pub fn generate_mutant<T: TypeDirectory, R: RandomSource>(
        &self,
        types: &mut T,
        random: &mut R,
        parent_index: usize,
        b: f64,
        mut_prob: f64,
    ) -> Result<MutantDescriptor, MutationError> {
        match self {
            MutationKernel::None => Err(MutationError::NoMutationConfigured),

            MutationKernel::Neutral => {
                if types.no_types_left() {
                    return Err(MutationError::NoTypesLeft);
                }
                let next = types
                    .next_free_index()
                    .ok_or(MutationError::NoTypesLeft)?;
                let new_type = types.get_or_create_by_index(next, parent_index);
                Ok(MutantDescriptor {
                    new_type,
                    birth_rate: b,
                    mut_prob,
                })
            }

            MutationKernel::ThreeTypes { mu2, fit1, fit2 } => {
                three_types_additive(types, parent_index, b, *mu2, *fit1, *fit2)
            }

            MutationKernel::ThreeTypesMult { mu2, fit1, fit2 } => {
                three_types_mult(types, parent_index, b, *mu2, *fit1, *fit2)
            }

            MutationKernel::ThreeTypesFlex { mu2, p1, fit1, fit2 } => three_types_flex(
                types,
                random,
                parent_index,
                *mu2,
                *p1,
                *fit1,
                *fit2,
            ),

            MutationKernel::ManyTypesFlex {
                mu2,
                p1,
                fit1,
                fit2,
                num_types,
            } => many_types_flex(
                types,
                random,
                parent_index,
                *mu2,
                *p1,
                *fit1,
                *fit2,
                *num_types,
            ),

            MutationKernel::DimReturnsUnif { dim_rate, max_gain } => {
                dim_returns_unif(types, random, parent_index, b, mut_prob, *dim_rate, *max_gain)
            }

            MutationKernel::FixedSites {
                max_types,
                is_mult,
                fitnesses,
                adjacency,
            } => fixed_sites(
                types,
                random,
                parent_index,
                b,
                mut_prob,
                *max_types,
                *is_mult,
                fitnesses,
                adjacency,
            ),

            MutationKernel::ParamDist {
                param1,
                param2,
                zero_prob,
                is_fixed,
                dist_type,
            } => param_dist(
                types,
                random,
                parent_index,
                b,
                mut_prob,
                *param1,
                *param2,
                *zero_prob,
                *is_fixed,
                dist_type,
            ),
        }
    }

    /// Parse a kernel from its config-file keyword and comma-token
    /// parameter list (see `sim-config`'s line grammar).
    pub fn from_config(kind: &str, tokens: &[String]) -> Result<Self, KernelConfigError> {
        match kind {
            "none" => Ok(MutationKernel::None),
            "neutral" => Ok(MutationKernel::Neutral),
            "three_types" => parse_three_types(tokens).map(|(mu2, fit1, fit2)| MutationKernel::ThreeTypes {
                mu2,
                fit1,
                fit2,
            }),
            "three_types_mult" => {
                parse_three_types(tokens).map(|(mu2, fit1, fit2)| MutationKernel::ThreeTypesMult {
                    mu2,
                    fit1,
                    fit2,
                })
            }
            "three_types_flex" => parse_three_types_flex(tokens),
            "many_types_flex" => parse_many_types_flex(tokens),
            "dim_returns_unif" => parse_dim_returns_unif(tokens),
            "fixed_sites" => parse_fixed_sites(tokens),
            "param_dist" => parse_param_dist(tokens),
            other => Err(KernelConfigError::UnknownDistribution(other.to_string())),
        }
    }
}

fn three_types_additive<T: TypeDirectory>(
    types: &mut T,
    parent_index: usize,
    b: f64,
    mu2: f64,
    fit1: f64,
    fit2: f64,
) -> Result<MutantDescriptor, MutationError> {
    match parent_index {
        1 => {
            let new_type = types.get_or_create_by_index(2, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: b + fit2 - fit1 - 1.0,
                mut_prob: 0.0,
            })
        }
        0 => {
            let new_type = types.get_or_create_by_index(1, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: b + fit1 - 1.0,
                mut_prob: mu2,
            })
        }
        other => Err(MutationError::InvalidParentType(other)),
    }
}

fn three_types_mult<T: TypeDirectory>(
    types: &mut T,
    parent_index: usize,
    b: f64,
    mu2: f64,
    fit1: f64,
    fit2: f64,
) -> Result<MutantDescriptor, MutationError> {
    match parent_index {
        1 => {
            let new_type = types.get_or_create_by_index(2, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: b * fit2 / fit1,
                mut_prob: 0.0,
            })
        }
        0 => {
            let new_type = types.get_or_create_by_index(1, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: b * fit1,
                mut_prob: mu2,
            })
        }
        other => Err(MutationError::InvalidParentType(other)),
    }
}

fn three_types_flex<T: TypeDirectory, R: RandomSource>(
    types: &mut T,
    random: &mut R,
    parent_index: usize,
    mu2: f64,
    p1: f64,
    fit1: f64,
    fit2: f64,
) -> Result<MutantDescriptor, MutationError> {
    match parent_index {
        1 => {
            let new_type = types.get_or_create_by_index(2, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: fit2,
                mut_prob: 0.0,
            })
        }
        0 => {
            let which = random.uniform01(RngSubsystem::Mutation, 0, "kernel.rs:three_types_flex");
            if which < p1 {
                let new_type = types.get_or_create_by_index(2, parent_index);
                Ok(MutantDescriptor {
                    new_type,
                    birth_rate: fit2,
                    mut_prob: 0.0,
                })
            } else {
                let new_type = types.get_or_create_by_index(1, parent_index);
                Ok(MutantDescriptor {
                    new_type,
                    birth_rate: fit1,
                    mut_prob: mu2,
                })
            }
        }
        other => Err(MutationError::InvalidParentType(other)),
    }
}

#[allow(clippy::too_many_arguments)]
fn many_types_flex<T: TypeDirectory, R: RandomSource>(
    types: &mut T,
    random: &mut R,
    parent_index: usize,
    mu2: f64,
    p1: f64,
    fit1: f64,
    fit2: f64,
    num_types: usize,
) -> Result<MutantDescriptor, MutationError> {
    if num_types == 0 {
        return Err(MutationError::InvalidParentType(parent_index));
    }
    let block = parent_index / num_types;
    match block {
        1 => {
            let new_type = types.get_or_create_by_index(2, parent_index);
            Ok(MutantDescriptor {
                new_type,
                birth_rate: fit2,
                mut_prob: 0.0,
            })
        }
        0 => {
            let which = random.uniform01(RngSubsystem::Mutation, 0, "kernel.rs:many_types_flex");
            if which < p1 {
                let dest = 2 * num_types + parent_index;
                let new_type = types.get_or_create_by_index(dest, parent_index);
                Ok(MutantDescriptor {
                    new_type,
                    birth_rate: fit2,
                    mut_prob: 0.0,
                })
            } else {
                let dest = num_types + parent_index;
                let new_type = types.get_or_create_by_index(dest, parent_index);
                Ok(MutantDescriptor {
                    new_type,
                    birth_rate: fit1,
                    mut_prob: mu2,
                })
            }
        }
        _ => Err(MutationError::InvalidParentType(parent_index)),
    }
}

fn dim_returns_unif<T: TypeDirectory, R: RandomSource>(
    types: &mut T,
    random: &mut R,
    parent_index: usize,
    b: f64,
    mut_prob: f64,
    dim_rate: f64,
    max_gain: f64,
) -> Result<MutantDescriptor, MutationError> {
    if types.no_types_left() {
        return Err(MutationError::NoTypesLeft);
    }
    let next = types.next_free_index().ok_or(MutationError::NoTypesLeft)?;
    let new_type = types.get_or_create_by_index(next, parent_index);
    let depth = types.depth(parent_index);
    let offset = random.uniform01(RngSubsystem::Mutation, 0, "kernel.rs:dim_returns_unif")
        * max_gain
        * dim_rate.powi(depth as i32);
    types.set_mut_effect(new_type, offset);
    Ok(MutantDescriptor {
        new_type,
        birth_rate: b + offset,
        mut_prob,
    })
}

#[allow(clippy::too_many_arguments)]
fn fixed_sites<T: TypeDirectory, R: RandomSource>(
    types: &mut T,
    random: &mut R,
    parent_index: usize,
    b: f64,
    mut_prob: f64,
    max_types: usize,
    is_mult: bool,
    fitnesses: &[f64],
    adjacency: &[i64],
) -> Result<MutantDescriptor, MutationError> {
    let row = &adjacency[parent_index * max_types..(parent_index + 1) * max_types];
    // The original counts only strictly-positive adjacency slots as
    // outgoing edges (`adj_mat[...] > 0`), which structurally makes
    // destination type index 0 unreachable. Filtering on `> 0` here
    // rather than `>= 0` preserves that quirk instead of silently
    // making type 0 reachable where the original never could.
    let destinations: Vec<i64> = row.iter().copied().filter(|&dest| dest > 0).collect();

    if destinations.is_empty() {
        return Ok(MutantDescriptor {
            new_type: parent_index,
            birth_rate: b,
            mut_prob: 0.0,
        });
    }

    let which = random.uniform01(RngSubsystem::Mutation, 0, "kernel.rs:fixed_sites");
    let chosen = ((which * destinations.len() as f64).floor() as usize).min(destinations.len() - 1);
    let dest_index = destinations[chosen] as usize;

    let new_type = types.get_or_create_by_index(dest_index, parent_index);
    let birth_rate = if is_mult {
        b * fitnesses[dest_index] / fitnesses[parent_index]
    } else {
        b + fitnesses[dest_index] - fitnesses[parent_index]
    };

    Ok(MutantDescriptor {
        new_type,
        birth_rate,
        mut_prob,
    })
}

#[allow(clippy::too_many_arguments)]
fn param_dist<T: TypeDirectory, R: RandomSource>(
    types: &mut T,
    random: &mut R,
    parent_index: usize,
    b: f64,
    mut_prob: f64,
    param1: f64,
    param2: f64,
    zero_prob: f64,
    is_fixed: bool,
    dist_type: &str,
) -> Result<MutantDescriptor, MutationError> {
    if types.no_types_left() {
        return Err(MutationError::NoTypesLeft);
    }
    let next = types.next_free_index().ok_or(MutationError::NoTypesLeft)?;
    let new_type = types.get_or_create_by_index(next, parent_index);

    let drawn = match dist_type {
        "lognorm" => random.log_normal(RngSubsystem::Mutation, 0, param1, param2, "kernel.rs:param_dist:lognorm"),
        // The original implementation's "norm" draw exponentiates a normal
        // sample rather than returning it directly; preserved here rather
        // than treated as a bug since changing it would silently alter the
        // effective scale of every `param_dist(type=norm, ...)` config.
        "norm" => random
            .normal(RngSubsystem::Mutation, 0, param1, param2.sqrt(), "kernel.rs:param_dist:norm")
            .exp(),
        "gamma" => random.gamma(RngSubsystem::Mutation, 0, param1, param2, "kernel.rs:param_dist:gamma"),
        "doubleexp" => {
            let scale = (param2 / 2.0).sqrt();
            param1
                + random.truncated_double_exponential(
                    RngSubsystem::Mutation,
                    0,
                    scale,
                    "kernel.rs:param_dist:doubleexp",
                )
        }
        "unif" => random.uniform_range(RngSubsystem::Mutation, 0, param1, param2, "kernel.rs:param_dist:unif"),
        other => return Err(MutationError::UnknownDistribution(other.to_string())),
    };

    let mut birth_rate = if is_fixed { drawn } else { b + drawn };

    let floor_roll = random.uniform01(RngSubsystem::Mutation, 0, "kernel.rs:param_dist:floor");
    if birth_rate < 0.0 {
        tracing::warn!(birth_rate, new_type, "floored a negative birth-rate draw to 0.0");
        birth_rate = 0.0;
    } else if floor_roll < zero_prob {
        birth_rate = 0.0;
    }

    types.set_mut_effect(new_type, birth_rate - b);

    Ok(MutantDescriptor {
        new_type,
        birth_rate,
        mut_prob,
    })
}

fn parse_three_types(tokens: &[String]) -> Result<(f64, f64, f64), KernelConfigError> {
    let mut mu2 = None;
    let mut fit1 = None;
    let mut fit2 = None;

    for tok in tokens {
        let (key, value) = split_kv(tok)?;
        match key {
            "mu2" => mu2 = Some(parse_f64(key, value)?),
            "fit1" => fit1 = Some(parse_f64(key, value)?),
            "fit2" => fit2 = Some(parse_f64(key, value)?),
            other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
        }
    }

    Ok((
        mu2.ok_or_else(|| KernelConfigError::MissingRequired { key: "mu2".into() })?,
        fit1.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit1".into() })?,
        fit2.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit2".into() })?,
    ))
}

fn parse_three_types_flex(tokens: &[String]) -> Result<MutationKernel, KernelConfigError> {
    let mut mu2 = None;
    let mut fit1 = None;
    let mut fit2 = None;
    let mut p1 = None;

    for tok in tokens {
        let (key, value) = split_kv(tok)?;
        match key {
            "mu2" => mu2 = Some(parse_f64(key, value)?),
            "fit1" => fit1 = Some(parse_f64(key, value)?),
            "fit2" => fit2 = Some(parse_f64(key, value)?),
            "p1" => p1 = Some(parse_f64(key, value)?),
            other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
        }
    }

    Ok(MutationKernel::ThreeTypesFlex {
        mu2: mu2.ok_or_else(|| KernelConfigError::MissingRequired { key: "mu2".into() })?,
        p1: p1.ok_or_else(|| KernelConfigError::MissingRequired { key: "p1".into() })?,
        fit1: fit1.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit1".into() })?,
        fit2: fit2.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit2".into() })?,
    })
}

fn parse_many_types_flex(tokens: &[String]) -> Result<MutationKernel, KernelConfigError> {
    let mut mu2 = None;
    let mut fit1 = None;
    let mut fit2 = None;
    let mut p1 = None;
    let mut num_types = None;

    for tok in tokens {
        let (key, value) = split_kv(tok)?;
        match key {
            "mu2" => mu2 = Some(parse_f64(key, value)?),
            "fit1" => fit1 = Some(parse_f64(key, value)?),
            "fit2" => fit2 = Some(parse_f64(key, value)?),
            "p1" => p1 = Some(parse_f64(key, value)?),
            "num" => num_types = Some(parse_usize(key, value)?),
            other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
        }
    }

    Ok(MutationKernel::ManyTypesFlex {
        mu2: mu2.ok_or_else(|| KernelConfigError::MissingRequired { key: "mu2".into() })?,
        p1: p1.ok_or_else(|| KernelConfigError::MissingRequired { key: "p1".into() })?,
        fit1: fit1.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit1".into() })?,
        fit2: fit2.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit2".into() })?,
        num_types: num_types.ok_or_else(|| KernelConfigError::MissingRequired { key: "num".into() })?,
    })
}

fn parse_dim_returns_unif(tokens: &[String]) -> Result<MutationKernel, KernelConfigError> {
    let mut dim_rate = None;
    let mut max_gain = None;

    for tok in tokens {
        let (key, value) = split_kv(tok)?;
        match key {
            "dim" => dim_rate = Some(parse_f64(key, value)?),
            "fit" => max_gain = Some(parse_f64(key, value)?),
            other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
        }
    }

    Ok(MutationKernel::DimReturnsUnif {
        dim_rate: dim_rate.ok_or_else(|| KernelConfigError::MissingRequired { key: "dim".into() })?,
        max_gain: max_gain.ok_or_else(|| KernelConfigError::MissingRequired { key: "fit".into() })?,
    })
}

fn parse_fixed_sites(tokens: &[String]) -> Result<MutationKernel, KernelConfigError> {
    if tokens.len() != 4 {
        return Err(KernelConfigError::FixedSitesArity(tokens.len()));
    }

    let max_types = parse_usize("max_types", &tokens[0])?;
    let is_mult = tokens[1] != "0";
    let fitness_path = &tokens[2];
    let adjacency_path = &tokens[3];

    let fitness_text = fs::read_to_string(fitness_path).map_err(|source| KernelConfigError::Io {
        path: fitness_path.clone(),
        source,
    })?;
    let fitnesses: Vec<f64> = fitness_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_f64("fitness", line.trim()))
        .collect::<Result<_, _>>()?;

    if fitnesses.len() != max_types {
        return Err(KernelConfigError::FitnessFileShape {
            found: fitnesses.len(),
            expected: max_types,
        });
    }

    let adjacency_text = fs::read_to_string(adjacency_path).map_err(|source| KernelConfigError::Io {
        path: adjacency_path.clone(),
        source,
    })?;

    let mut adjacency = vec![-1i64; max_types * max_types];
    for (row, line) in adjacency_text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        if row >= max_types {
            break;
        }
        for (col, tok) in line.split(',').enumerate() {
            if col >= max_types {
                break;
            }
            let value: i64 = tok
                .trim()
                .parse()
                .map_err(|_| KernelConfigError::BadNumber {
                    key: "adjacency".to_string(),
                    value: tok.to_string(),
                })?;
            if value as usize > max_types {
                return Err(KernelConfigError::AdjacencyOutOfRange {
                    value,
                    row,
                    max_types,
                });
            }
            adjacency[row * max_types + col] = value;
        }
    }

    Ok(MutationKernel::FixedSites {
        max_types,
        is_mult,
        fitnesses,
        adjacency,
    })
}

fn parse_param_dist(tokens: &[String]) -> Result<MutationKernel, KernelConfigError> {
    let mut param1 = None;
    let mut param2 = None;
    let mut dist_type = None;
    let mut is_fixed = None;
    let mut zero_prob = 0.0;

    for tok in tokens {
        let (key, value) = split_kv(tok)?;
        match key {
            "mean" | "low" => param1 = Some(parse_f64(key, value)?),
            "var" | "high" => param2 = Some(parse_f64(key, value)?),
            "type" => dist_type = Some(value.to_string()),
            "fixed" => is_fixed = Some(value == "true"),
            "zero" => zero_prob = parse_f64(key, value)?,
            other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
        }
    }

    let param1 = param1.ok_or_else(|| KernelConfigError::MissingRequired { key: "mean/low".into() })?;
    let param2 = param2.ok_or_else(|| KernelConfigError::MissingRequired { key: "var/high".into() })?;
    let dist_type = dist_type.ok_or_else(|| KernelConfigError::MissingRequired { key: "type".into() })?;
    let is_fixed = is_fixed.ok_or_else(|| KernelConfigError::MissingRequired { key: "fixed".into() })?;

    if matches!(dist_type.as_str(), "lognorm" | "norm" | "gamma" | "doubleexp") {
        require_positive("var", param2)?;
    }

    if !matches!(dist_type.as_str(), "lognorm" | "norm" | "gamma" | "doubleexp" | "unif") {
        return Err(KernelConfigError::UnknownDistribution(dist_type));
    }

    Ok(MutationKernel::ParamDist {
        param1,
        param2,
        zero_prob,
        is_fixed,
        dist_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_directory::test_support::FakeTypeDirectory;
    use crate::type_directory::TypeDirectory;
    use rng::StubRandomSource;

    #[test]
    fn three_types_additive_applies_minus_one_offset() {
        let kernel = MutationKernel::ThreeTypes {
            mu2: 0.1,
            fit1: 1.2,
            fit2: 1.5,
        };
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 0, 1.0, 0.0).unwrap();
        assert_eq!(result.new_type, 1);
        assert!((result.birth_rate - (1.0 + 1.2 - 1.0)).abs() < 1e-9);
        assert_eq!(result.mut_prob, 0.1);

        let result2 = kernel.generate_mutant(&mut types, &mut stub, 1, 1.2, 0.1).unwrap();
        assert_eq!(result2.new_type, 2);
        assert!((result2.birth_rate - (1.2 + 1.5 - 1.2 - 1.0)).abs() < 1e-9);
        assert_eq!(result2.mut_prob, 0.0);
    }

    #[test]
    fn three_types_rejects_invalid_parent() {
        let kernel = MutationKernel::ThreeTypes {
            mu2: 0.1,
            fit1: 1.0,
            fit2: 1.0,
        };
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);
        let err = kernel.generate_mutant(&mut types, &mut stub, 2, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, MutationError::InvalidParentType(2)));
    }

    #[test]
    fn many_types_flex_routes_block_zero_by_probability() {
        let kernel = MutationKernel::ManyTypesFlex {
            mu2: 0.2,
            p1: 0.5,
            fit1: 1.0,
            fit2: 2.0,
            num_types: 3,
        };
        let mut types = FakeTypeDirectory::default();

        let mut low = StubRandomSource::new([0.1]);
        let jump = kernel.generate_mutant(&mut types, &mut low, 0, 1.0, 0.0).unwrap();
        assert_eq!(jump.new_type, 6); // 2*num_types + index

        let mut high = StubRandomSource::new([0.9]);
        let step = kernel.generate_mutant(&mut types, &mut high, 0, 1.0, 0.0).unwrap();
        assert_eq!(step.new_type, 3); // num_types + index
    }

    #[test]
    fn dim_returns_unif_scales_with_depth() {
        let kernel = MutationKernel::DimReturnsUnif {
            dim_rate: 0.5,
            max_gain: 2.0,
        };
        let mut types = FakeTypeDirectory::with_free_indices(vec![5]);
        types.get_or_create_by_index(1, 0); // give index 1 depth 1
        let mut stub = StubRandomSource::new([0.5]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 1, 1.0, 0.1).unwrap();
        let expected_offset = 0.5 * 2.0 * 0.5f64.powi(1);
        assert!((result.birth_rate - (1.0 + expected_offset)).abs() < 1e-9);
        assert_eq!(types.mut_effect(5), Some(expected_offset));
    }

    #[test]
    fn fixed_sites_falls_back_to_self_when_no_edges() {
        let kernel = MutationKernel::FixedSites {
            max_types: 2,
            is_mult: false,
            fitnesses: vec![1.0, 2.0],
            adjacency: vec![-1, -1, -1, -1],
        };
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 0, 1.0, 0.0).unwrap();
        assert_eq!(result.new_type, 0);
        assert_eq!(result.birth_rate, 1.0);
    }

    #[test]
    fn fixed_sites_follows_additive_edge() {
        let kernel = MutationKernel::FixedSites {
            max_types: 2,
            is_mult: false,
            fitnesses: vec![1.0, 2.0],
            adjacency: vec![-1, 1, -1, -1],
        };
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([0.0]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 0, 1.0, 0.05).unwrap();
        assert_eq!(result.new_type, 1);
        assert!((result.birth_rate - (1.0 + 2.0 - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn fixed_sites_treats_destination_zero_as_unreachable() {
        // Row for parent type 1: column 0 (destination type 0) holds the
        // edge value 0, column 1 has no edge. `> 0` filtering means this
        // row has no usable outgoing edge at all, matching the original's
        // structural quirk rather than treating a `0` slot as a real edge
        // to type 0.
        let kernel = MutationKernel::FixedSites {
            max_types: 2,
            is_mult: false,
            fitnesses: vec![1.0, 2.0],
            adjacency: vec![-1, -1, 0, -1],
        };
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 1, 1.0, 0.0).unwrap();
        assert_eq!(result.new_type, 1);
        assert_eq!(result.birth_rate, 1.0);
    }

    #[test]
    fn param_dist_floors_negative_draws_to_zero() {
        let kernel = MutationKernel::ParamDist {
            param1: -100.0,
            param2: 1.0,
            zero_prob: 0.0,
            is_fixed: true,
            dist_type: "unif".to_string(),
        };
        let mut types = FakeTypeDirectory::with_free_indices(vec![9]);
        let mut stub = StubRandomSource::new([0.0, 0.9]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 0, 3.0, 0.0).unwrap();
        assert_eq!(result.birth_rate, 0.0);
    }

    #[test]
    fn none_kernel_refuses_to_mutate() {
        let kernel = MutationKernel::None;
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);
        let err = kernel.generate_mutant(&mut types, &mut stub, 0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, MutationError::NoMutationConfigured));
    }

    #[test]
    fn from_config_parses_three_types() {
        let tokens = vec!["mu2,0.1".to_string(), "fit1,1.2".to_string(), "fit2,1.5".to_string()];
        let kernel = MutationKernel::from_config("three_types", &tokens).unwrap();
        assert_eq!(
            kernel,
            MutationKernel::ThreeTypes {
                mu2: 0.1,
                fit1: 1.2,
                fit2: 1.5
            }
        );
    }

    #[test]
    fn from_config_rejects_unknown_key() {
        let tokens = vec!["bogus,1.0".to_string()];
        let err = MutationKernel::from_config("three_types", &tokens).unwrap_err();
        assert!(matches!(err, KernelConfigError::UnknownKey { .. }));
    }
}
