use thiserror::Error;

/// A category of configuration failure, independent of which line it was
/// found on. Mirrors the parser errors `input_err.eevo` is documented to
/// record "by line number and category".
#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    /// The line's first tab field did not match any recognized keyword.
    #[error("unrecognized keyword {0:?}")]
    UnknownKeyword(String),
    /// A `sim_params`/`pop_params`/`clone`/`writer` line's sub-key did
    /// not match any parameter that section accepts.
    #[error("unrecognized key {0:?}")]
    UnknownKey(String),
    /// A required field for this line kind was never supplied anywhere
    /// in the file.
    #[error("missing required field {0:?}")]
    MissingRequired(String),
    /// A numeric field failed to parse.
    #[error("value {value:?} for field {field:?} is not a valid number")]
    BadNumber { field: String, value: String },
    /// A line did not supply the minimum number of tab-separated fields
    /// its kind requires.
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    /// A `clone` line declared a type index already claimed by a clone
    /// of an incompatible kind.
    #[error("type index {0} already has a clone of a different kind")]
    ConflictingTypeIndex(usize),
    /// A clone or writer kind name did not match any this parser builds.
    #[error("unknown kind {0:?}")]
    UnknownKind(String),
    /// Building the declared mutation kernel failed.
    #[error("mutation kernel configuration error: {0}")]
    Kernel(#[from] genetics::KernelConfigError),
    /// An empirical-CDF table file referenced by a clone line could not
    /// be read or parsed.
    #[error("failed to read empirical table {path}: {source}")]
    EmpiricalTableIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// An empirical-CDF table file's line did not parse as `value,prob`.
    #[error("malformed empirical table line {0:?}")]
    MalformedEmpiricalLine(String),
    /// The config declared no clones at all, or every declared clone had
    /// zero cells, leaving nothing to simulate.
    #[error("population is empty after loading every clone line")]
    EmptyPopulation,
    /// [`population::Population::check_init`] rejected the assembled
    /// population as unrunnable (e.g. a `sex_repr` config missing one
    /// sex, or a `passage` config with no scheduled events).
    #[error("population failed its init check: {0}")]
    NotRunnable(population::EngineError),
}

/// One parse failure, tagged with the 1-based source line it came from.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ConfigError {
    pub line: usize,
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    pub fn new(line: usize, kind: ConfigErrorKind) -> Self {
        Self { line, kind }
    }
}
