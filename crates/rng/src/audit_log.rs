use serde::{Deserialize, Serialize};

use super::rng_stream::RngSubsystem;

/// One logged draw: which event it happened during, which stream served
/// it, where in the code it was drawn, and what came out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RngDrawRecord {
    /// Index of the Gillespie event during which this draw occurred.
    pub event_index: u64,
    /// Subsystem that owns the stream this draw came from.
    pub subsystem: RngSubsystem,
    /// Stream id within the subsystem.
    pub stream_id: u64,
    /// Callsite as `file:line`, for tracing a run back to source.
    pub callsite: String,
    /// Raw drawn value (floats are logged by their bit pattern).
    pub value: u64,
}

/// Append-only record of every draw made through a [`super::deterministic::DeterministicRng`].
///
/// Kept in memory for the life of a single simulation run; nothing here
/// is written to disk unless a caller asks for it explicitly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RngAuditLog {
    records: Vec<RngDrawRecord>,
}

impl RngAuditLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one draw record.
    pub fn record_draw(
        &mut self,
        event_index: u64,
        subsystem: RngSubsystem,
        stream_id: u64,
        callsite: &str,
        value: u64,
    ) {
        self.records.push(RngDrawRecord {
            event_index,
            subsystem,
            stream_id,
            callsite: callsite.to_string(),
            value,
        });
    }

    /// Every record, in draw order.
    pub fn records(&self) -> &[RngDrawRecord] {
        &self.records
    }

    /// Records made during a specific event.
    pub fn records_by_event(&self, event_index: u64) -> Vec<&RngDrawRecord> {
        self.records
            .iter()
            .filter(|r| r.event_index == event_index)
            .collect()
    }

    /// Records attributable to one subsystem.
    pub fn records_by_subsystem(&self, subsystem: RngSubsystem) -> Vec<&RngDrawRecord> {
        self.records
            .iter()
            .filter(|r| r.subsystem == subsystem)
            .collect()
    }

    /// Records from one particular stream.
    pub fn records_by_stream(&self, subsystem: RngSubsystem, stream_id: u64) -> Vec<&RngDrawRecord> {
        self.records
            .iter()
            .filter(|r| r.subsystem == subsystem && r.stream_id == stream_id)
            .collect()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Total number of recorded draws.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no draws have been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_and_filter() {
        let mut log = RngAuditLog::new();
        log.record_draw(1, RngSubsystem::Scheduling, 0, "engine.rs:10", 100);
        log.record_draw(1, RngSubsystem::Scheduling, 1, "engine.rs:20", 200);
        log.record_draw(2, RngSubsystem::Scheduling, 0, "engine.rs:30", 300);
        log.record_draw(1, RngSubsystem::Mutation, 0, "mutation.rs:10", 400);

        assert_eq!(log.len(), 4);

        let stream0 = log.records_by_stream(RngSubsystem::Scheduling, 0);
        assert_eq!(stream0.len(), 2);
        assert_eq!(stream0[0].value, 100);
        assert_eq!(stream0[1].value, 300);

        assert_eq!(log.records_by_event(1).len(), 3);
        assert_eq!(log.records_by_subsystem(RngSubsystem::Mutation).len(), 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = RngAuditLog::new();
        log.record_draw(0, RngSubsystem::Scheduling, 0, "x:1", 1);
        log.clear();
        assert!(log.is_empty());
    }
}
