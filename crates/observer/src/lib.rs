//! Simulation output writers.
//!
//! Each [`Observer`] is driven by the CLI driver around a single
//! simulation replica's lifetime: [`Observer::begin`] once before the
//! first event, [`Observer::on_event`] after every accepted
//! [`population::Population::advance`] call, and [`Observer::finish`]
//! once the replica stops. Writers that only care about the end state
//! (`EndTimeWriter`, `IsExtinctWriter`, ...) simply no-op the other two
//! hooks; writers that sample throughout the run gate themselves with
//! [`throttle::Throttle`] so a `writing_period` config value controls
//! how often they actually touch disk.
//!
//! [`factory::build_writer`] turns a [`sim_config::WriterSpec`] — parsed
//! from a `writer` config line without knowing anything about output
//! formats — into a concrete writer here.

/// Per-event failure modes.
pub mod error;
/// Builds concrete writers from parsed `writer` config lines.
pub mod factory;
/// Writers that only emit at the end of a replica.
pub mod final_writers;
/// Writers that sample throughout a replica, gated by a [`throttle::Throttle`].
pub mod during_writers;
/// The `writing_period` sampling gate shared by every during-phase writer.
pub mod throttle;

pub use error::ObserverError;
pub use factory::build_writer;
pub use throttle::Throttle;

use population::{EventRecord, Population};

/// A sink for one simulation replica's output.
///
/// Implementors own whatever file handles they need and open them
/// lazily in [`Observer::begin`], since the output path usually embeds
/// the replica's simulation number.
pub trait Observer: std::fmt::Debug {
    /// Called once, before the replica's first [`Population::advance`].
    fn begin(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let _ = (sim_number, population);
        Ok(())
    }

    /// Called after every event the engine accepted (not every attempted
    /// `advance` call — a call that returns `Err` never reaches here).
    fn on_event(&mut self, sim_number: u32, population: &Population, event: EventRecord) -> Result<(), ObserverError> {
        let _ = (sim_number, population, event);
        Ok(())
    }

    /// Called once the replica stops, whatever the stopping reason
    /// (extinction, time limit, cell-count cap, type-space exhaustion).
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let _ = (sim_number, population);
        Ok(())
    }
}
