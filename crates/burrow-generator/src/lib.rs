//! Short code generation strategies.
//!
//! Two interchangeable [`Generator`]s are provided:
//!
//! - [`RandomGenerator`] draws fixed-length codes uniformly from the base62
//!   alphabet. Codes carry no uniqueness guarantee; the store's unique index
//!   is the source of truth and collisions are retried by the caller.
//! - [`SequentialGenerator`] encodes values from a [`SequenceCounter`] as
//!   base62. Codes are collision-free as long as the counter never repeats.
//!
//! [`SequenceCounter`]: burrow_core::SequenceCounter

pub mod error;
pub mod random;
pub mod seq;

use async_trait::async_trait;
use burrow_core::ShortCode;

pub use error::{GeneratorError, Result};
pub use random::RandomGenerator;
pub use seq::SequentialGenerator;

/// How the caller should treat an insert conflict on a generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Collisions are statistically expected; retry quietly.
    Retry,
    /// Collisions indicate corrupted state; retry with a fresh value but raise
    /// an alert.
    Alert,
}

/// Trait for generating short codes.
///
/// Implementations can vary from simple random generators to counter-backed
/// encoders. None of them checks the store.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate short code.
    ///
    /// Every call must draw fresh state: calling again after a conflict never
    /// replays the previous candidate on purpose.
    async fn generate(&self) -> Result<ShortCode>;

    /// How conflicts on this generator's output should be handled.
    fn collision_policy(&self) -> CollisionPolicy;
}

#[async_trait]
impl<T: Generator + ?Sized> Generator for std::sync::Arc<T> {
    async fn generate(&self) -> Result<ShortCode> {
        (**self).generate().await
    }

    fn collision_policy(&self) -> CollisionPolicy {
        (**self).collision_policy()
    }
}
