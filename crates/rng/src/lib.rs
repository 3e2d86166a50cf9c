//! Deterministic, audit-logged randomness for a simulation run.
//!
//! Every subsystem that needs randomness — event scheduling, mutation
//! kernels, clone reproduction, passage thinning, sexual selection —
//! draws from its own [`RngSubsystem`] stream, derived from one run seed
//! via blake3. Replaying a run with the same seed reproduces the same
//! sequence of draws regardless of which subsystems end up being
//! exercised, because streams are created lazily and keyed by subsystem
//! and stream id rather than by draw order.
//!
//! # Usage
//!
//! ```rust
//! use rng::{DeterministicRng, RngSubsystem};
//!
//! let mut rng = DeterministicRng::new(1337);
//! let waiting_time = rng
//!     .stream(RngSubsystem::Scheduling, 0)
//!     .exponential(2.5, "engine.rs:1");
//! assert!(waiting_time >= 0.0);
//! ```

/// RFC 7539 ChaCha20 stream cipher.
pub mod chacha20;

/// Subsystem-isolated stream derivation.
pub mod rng_stream;

/// Lazy per-subsystem stream ownership and audit log aggregation.
pub mod global_seed;

/// Append-only record of every draw made in a run.
pub mod audit_log;

/// Pure uniform-to-distribution transforms.
pub mod distributions;

/// The audited, ChaCha20-backed [`DeterministicRng`] and its stream handle.
pub mod deterministic;

/// The [`RandomSource`] trait boundary and its test stub.
pub mod random_source;

pub use audit_log::{RngAuditLog, RngDrawRecord};
pub use chacha20::ChaCha20Rng;
pub use deterministic::{DeterministicRng, RngStreamHandle};
pub use global_seed::GlobalSeed;
pub use random_source::{RandomSource, StubRandomSource};
pub use rng_stream::{RngStream, RngSubsystem};
