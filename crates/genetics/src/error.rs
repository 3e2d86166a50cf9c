use thiserror::Error;

/// Failures raised while configuring a mutation kernel from config tokens.
#[derive(Debug, Error)]
pub enum KernelConfigError {
    /// A `key,value` token was missing its comma-separated value half.
    #[error("token {token:?} is missing a comma-separated value")]
    MissingValue {
        /// The offending raw token.
        token: String,
    },
    /// A token's key did not match any parameter this kernel accepts.
    #[error("unrecognized parameter key {key:?}")]
    UnknownKey {
        /// The unrecognized key.
        key: String,
    },
    /// A required parameter was never supplied.
    #[error("missing required parameter {key:?}")]
    MissingRequired {
        /// The key that was never set.
        key: String,
    },
    /// A value failed to parse as the expected numeric type.
    #[error("value {value:?} for key {key:?} is not a valid number")]
    BadNumber {
        /// The key whose value failed to parse.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// A distribution-shape parameter (variance, scale) requires a strictly
    /// positive value but a non-positive one was supplied.
    #[error("parameter {key:?} must be strictly positive, got {value}")]
    NonPositiveParameter {
        /// The parameter name.
        key: String,
        /// The offending value.
        value: f64,
    },
    /// The named distribution type is not one this kernel implements.
    #[error("unknown distribution type {0:?}")]
    UnknownDistribution(String),
    /// `fixed_sites` parameters did not supply exactly the expected token count.
    #[error("fixed_sites expects 4 tokens (max_types, is_mult, fitness file, adjacency file), got {0}")]
    FixedSitesArity(usize),
    /// The fitness file did not contain exactly `max_types` numeric lines.
    #[error("fitness file has {found} entries, expected {expected}")]
    FitnessFileShape {
        /// Number of lines actually read.
        found: usize,
        /// Number of lines required (`max_types`).
        expected: usize,
    },
    /// An adjacency-matrix entry referenced a type index outside `[0, max_types)`.
    #[error("adjacency matrix entry {value} at row {row} exceeds max_types {max_types}")]
    AdjacencyOutOfRange {
        /// The out-of-range value.
        value: i64,
        /// The row (source type) it was found on.
        row: usize,
        /// The configured type-space bound.
        max_types: usize,
    },
    /// Reading a fitness or adjacency file from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Failures raised while actually generating a mutant during a run.
#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    /// The population's type space is exhausted; no new type index is available.
    #[error("no type indices remain in the population's type space")]
    NoTypesLeft,
    /// A kernel that only operates on a fixed typespace (e.g. the three-type
    /// kernels) was asked to mutate a cell outside the types it handles.
    #[error("type index {0} is not a valid parent for this mutation kernel")]
    InvalidParentType(usize),
    /// [`crate::kernel::MutationKernel::None`] was asked to generate a
    /// mutant; the simulation configuration declared no mutation should occur.
    #[error("mutation was requested but this simulation has no mutation kernel configured")]
    NoMutationConfigured,
    /// A [`crate::kernel::MutationKernel::ParamDist`] was built (outside
    /// [`crate::kernel::MutationKernel::from_config`]'s validation) with a
    /// distribution name none of the five known distributions match.
    #[error("unknown param_dist distribution type {0:?}")]
    UnknownDistribution(String),
}
