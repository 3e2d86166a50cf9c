//! Mutation kernels: given a reproducing cell's type, birth rate, and
//! mutation probability, resolve what its mutant daughter looks like.
//!
//! [`kernel::MutationKernel`] covers the asexual kernels; sexual
//! reproduction's nine-genotype Mendelian cross lives in
//! [`fathers_curse::FathersCurseKernel`] since it operates on a
//! mother/father pair rather than a single parent and so does not fit
//! [`kernel::MutationKernel`]'s single-parent interface.
//!
//! Callers supply the population's type bookkeeping through the
//! [`type_directory::TypeDirectory`] trait and randomness through
//! [`rng::RandomSource`], so this crate never touches clone or
//! scheduling state directly.

/// Config-token parsing helpers shared by every kernel's `from_config`.
pub mod config;
/// Error types for both kernel configuration and runtime mutation failures.
pub mod error;
/// Sexual reproduction's Mendelian autosome/Y-linked cross.
pub mod fathers_curse;
/// The asexual [`kernel::MutationKernel`] enum and its variants.
pub mod kernel;
/// The [`type_directory::TypeDirectory`] trait bridging kernels to population state.
pub mod type_directory;

pub use error::{KernelConfigError, MutationError};
pub use fathers_curse::FathersCurseKernel;
pub use kernel::{MutantDescriptor, MutationKernel};
pub use type_directory::TypeDirectory;
