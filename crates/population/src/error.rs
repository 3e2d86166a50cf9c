use thiserror::Error;

/// Failures that can occur while driving a population forward in time.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// `advance()` was called with no live cells and nothing left to mutate.
    #[error("population is extinct: no cells remain")]
    Extinct,
    /// Total event rate was zero or negative; there is nothing left that
    /// could possibly happen (e.g. every clone's birth rate is zero and
    /// the death rate is zero).
    #[error("total event rate is non-positive: {rate}")]
    NoPossibleEvent { rate: f64 },
    /// A sexual-reproduction scheduling policy ran out of one sex.
    #[error("sex-structured population lost all {sex} cells")]
    SexExhausted { sex: &'static str },
    /// A mutation kernel failed while resolving a birth event.
    #[error(transparent)]
    Mutation(#[from] genetics::MutationError),
    /// [`crate::Population::check_init`] found the population was never
    /// runnable in the first place (no types, no possible event, a
    /// `SexRepr` population missing one sex, or a `Passage` population
    /// with nothing scheduled).
    #[error("population is not runnable: {reason}")]
    NotRunnable { reason: &'static str },
}
