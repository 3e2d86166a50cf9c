use thiserror::Error;

/// Failure modes an [`crate::Observer`] can hit while writing output.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Opening or writing an output file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A `writer` line named a kind [`crate::factory::build_writer`] does
    /// not know how to construct.
    #[error("unknown writer kind {0:?}")]
    UnknownKind(String),
    /// A writer that needs a tracked type index (`CellCount`, `FitnessDist`,
    /// `NewMutant`, `Tunnel`, ...) was not given one.
    #[error("writer kind {kind:?} requires a type index parameter")]
    MissingTypeIndex { kind: String },
    /// `on_event` or `finish` ran before `begin` opened this writer's file.
    #[error("{0} writer used before begin() was called")]
    NotStarted(&'static str),
}
