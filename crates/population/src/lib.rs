//! The evolving cell population itself: the genotype phylogeny
//! ([`cell_type::TypeArena`]), the clones living on it
//! ([`clone::CellClone`]), and the scheduler that advances them one
//! Gillespie event (or synchronous timestep) at a time
//! ([`engine::Population`]).

/// The genotype phylogeny: [`cell_type::CellType`] nodes keyed by the
/// same index space mutation kernels compute arithmetically.
pub mod cell_type;
/// Clones and their reproduction policies.
pub mod clone;
/// The [`engine::Population`] scheduler and its five scheduling policies.
pub mod engine;
/// Engine-level failure modes.
pub mod error;

pub use cell_type::{CellType, TypeArena};
pub use clone::{CellClone, CloneKind, ReproductionDistribution};
pub use engine::{EventKind, EventRecord, PassageEvent, Population, SchedulingPolicy};
pub use error::EngineError;
