//! A trait boundary between callers (the engine, mutation kernels,
//! scheduling policies) and the concrete RNG, so tests can inject a
//! scripted source instead of driving the real ChaCha20 stream.

use std::collections::VecDeque;

use super::deterministic::DeterministicRng;
use super::rng_stream::RngSubsystem;

/// Everything a caller needs to draw randomness, independent of whether
/// it is backed by the audited ChaCha20 stream or a test stub.
pub trait RandomSource {
    /// Uniform draw on `[0, 1)`.
    fn uniform01(&mut self, subsystem: RngSubsystem, stream_id: u64, callsite: &str) -> f64;

    /// Uniform draw on `[low, high)`.
    fn uniform_range(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        low: f64,
        high: f64,
        callsite: &str,
    ) -> f64;

    /// `Exponential(rate)` waiting-time draw.
    fn exponential(&mut self, subsystem: RngSubsystem, stream_id: u64, rate: f64, callsite: &str) -> f64;

    /// `Normal(mean, std_dev)` draw.
    fn normal(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        std_dev: f64,
        callsite: &str,
    ) -> f64;

    /// `LogNormal` draw from linear-space mean/variance.
    fn log_normal(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        variance: f64,
        callsite: &str,
    ) -> f64;

    /// `Gamma` draw from mean/variance.
    fn gamma(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        variance: f64,
        callsite: &str,
    ) -> f64;

    /// Truncated double-exponential draw around zero.
    fn truncated_double_exponential(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        scale: f64,
        callsite: &str,
    ) -> f64;

    /// Index drawn from a cumulative-weight categorical distribution.
    fn categorical(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        cumulative: &[f64],
        callsite: &str,
    ) -> usize;

    /// Value drawn from an empirical CDF table.
    fn empirical(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        table: &[(f64, f64)],
        callsite: &str,
    ) -> f64;
}

impl RandomSource for DeterministicRng {
    fn uniform01(&mut self, subsystem: RngSubsystem, stream_id: u64, callsite: &str) -> f64 {
        self.stream(subsystem, stream_id).uniform01(callsite)
    }

    fn uniform_range(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        low: f64,
        high: f64,
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id).uniform_range(low, high, callsite)
    }

    fn exponential(&mut self, subsystem: RngSubsystem, stream_id: u64, rate: f64, callsite: &str) -> f64 {
        self.stream(subsystem, stream_id).exponential(rate, callsite)
    }

    fn normal(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        std_dev: f64,
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id).normal(mean, std_dev, callsite)
    }

    fn log_normal(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        variance: f64,
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id).log_normal(mean, variance, callsite)
    }

    fn gamma(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        mean: f64,
        variance: f64,
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id).gamma(mean, variance, callsite)
    }

    fn truncated_double_exponential(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        scale: f64,
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id)
            .truncated_double_exponential(scale, callsite)
    }

    fn categorical(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        cumulative: &[f64],
        callsite: &str,
    ) -> usize {
        self.stream(subsystem, stream_id).categorical(cumulative, callsite)
    }

    fn empirical(
        &mut self,
        subsystem: RngSubsystem,
        stream_id: u64,
        table: &[(f64, f64)],
        callsite: &str,
    ) -> f64 {
        self.stream(subsystem, stream_id).empirical(table, callsite)
    }
}

/// A scripted [`RandomSource`] for tests: every method pops the next
/// value off a per-purpose queue rather than deriving it from a stream,
/// so callers can assert on exactly the draws they expect to consume.
#[derive(Debug, Default)]
pub struct StubRandomSource {
    uniforms: VecDeque<f64>,
}

impl StubRandomSource {
    /// Build a stub that replays `uniforms` in order for every uniform
    /// draw (and every composite distribution, which is built on top of
    /// uniform draws).
    pub fn new(uniforms: impl IntoIterator<Item = f64>) -> Self {
        Self {
            uniforms: uniforms.into_iter().collect(),
        }
    }

    fn next_uniform(&mut self) -> f64 {
        self.uniforms.pop_front().unwrap_or(0.5)
    }
}

impl RandomSource for StubRandomSource {
    fn uniform01(&mut self, _subsystem: RngSubsystem, _stream_id: u64, _callsite: &str) -> f64 {
        self.next_uniform()
    }

    fn uniform_range(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        low: f64,
        high: f64,
        _callsite: &str,
    ) -> f64 {
        super::distributions::uniform_range(self.next_uniform(), low, high)
    }

    fn exponential(&mut self, _subsystem: RngSubsystem, _stream_id: u64, rate: f64, _callsite: &str) -> f64 {
        super::distributions::exponential(self.next_uniform(), rate)
    }

    fn normal(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        mean: f64,
        std_dev: f64,
        _callsite: &str,
    ) -> f64 {
        let (u1, u2) = (self.next_uniform(), self.next_uniform());
        super::distributions::normal(u1, u2, mean, std_dev)
    }

    fn log_normal(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        mean: f64,
        variance: f64,
        _callsite: &str,
    ) -> f64 {
        let (u1, u2) = (self.next_uniform(), self.next_uniform());
        super::distributions::log_normal_from_moments(u1, u2, mean, variance)
    }

    fn gamma(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        mean: f64,
        variance: f64,
        _callsite: &str,
    ) -> f64 {
        super::distributions::gamma_from_moments(|| self.next_uniform(), mean, variance)
    }

    fn truncated_double_exponential(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        scale: f64,
        _callsite: &str,
    ) -> f64 {
        let (magnitude_u, sign_u) = (self.next_uniform(), self.next_uniform());
        super::distributions::truncated_double_exponential(magnitude_u, sign_u, scale)
    }

    fn categorical(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        cumulative: &[f64],
        _callsite: &str,
    ) -> usize {
        super::distributions::categorical(self.next_uniform(), cumulative)
    }

    fn empirical(
        &mut self,
        _subsystem: RngSubsystem,
        _stream_id: u64,
        table: &[(f64, f64)],
        _callsite: &str,
    ) -> f64 {
        super::distributions::empirical(self.next_uniform(), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_replays_scripted_uniforms() {
        let mut stub = StubRandomSource::new([0.25, 0.75]);
        let a = stub.uniform01(RngSubsystem::Mutation, 0, "test:1");
        let b = stub.uniform01(RngSubsystem::Mutation, 0, "test:1");
        assert_eq!(a, 0.25);
        assert_eq!(b, 0.75);
    }

    #[test]
    fn stub_falls_back_to_midpoint_when_exhausted() {
        let mut stub = StubRandomSource::new([]);
        assert_eq!(stub.uniform01(RngSubsystem::Mutation, 0, "test:1"), 0.5);
    }

    #[test]
    fn real_rng_implements_the_trait() {
        let mut rng = DeterministicRng::new(1);
        let value: f64 = RandomSource::uniform01(&mut rng, RngSubsystem::Scheduling, 0, "test:1");
        assert!((0.0..1.0).contains(&value));
    }
}
