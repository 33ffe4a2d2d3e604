use crate::{CollisionPolicy, Generator, Result};
use async_trait::async_trait;
use burrow_core::{SequenceCounter, ShortCode};
use tracing::trace;

/// Counter-backed generator: `code = base62(counter.next_value())`.
///
/// Uniqueness follows from the counter never handing out a value twice, so
/// the only coordination point is the counter's atomic increment.
#[derive(Debug, Clone)]
pub struct SequentialGenerator<C> {
    counter: C,
}

impl<C: SequenceCounter> SequentialGenerator<C> {
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Returns a reference to the underlying counter.
    pub fn counter(&self) -> &C {
        &self.counter
    }
}

#[async_trait]
impl<C: SequenceCounter> Generator for SequentialGenerator<C> {
    async fn generate(&self) -> Result<ShortCode> {
        let value = self.counter.next_value().await?;
        let code = ShortCode::from_sequence(value);
        trace!(value, code = %code, "allocated sequential short code");
        Ok(code)
    }

    fn collision_policy(&self) -> CollisionPolicy {
        CollisionPolicy::Alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorError;
    use burrow_core::base62;
    use burrow_core::StorageError;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct TestCounter {
        value: AtomicU64,
    }

    #[async_trait]
    impl SequenceCounter for TestCounter {
        async fn next_value(&self) -> burrow_core::repository::Result<u64> {
            Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    struct BrokenCounter;

    #[async_trait]
    impl SequenceCounter for BrokenCounter {
        async fn next_value(&self) -> burrow_core::repository::Result<u64> {
            Err(StorageError::Unavailable("counter offline".to_string()))
        }
    }

    #[tokio::test]
    async fn produces_base62_of_successive_counter_values() {
        let generator = SequentialGenerator::new(TestCounter::default());

        for expected in 1..=200u64 {
            let code = generator.generate().await.unwrap();
            assert_eq!(code.as_str(), base62::encode(expected));
        }
    }

    #[tokio::test]
    async fn first_codes_match_alphabet_order() {
        let generator = SequentialGenerator::new(TestCounter::default());

        assert_eq!(generator.generate().await.unwrap().as_str(), "1");
        assert_eq!(generator.generate().await.unwrap().as_str(), "2");
        for _ in 3..=61 {
            generator.generate().await.unwrap();
        }
        assert_eq!(generator.generate().await.unwrap().as_str(), "10");
    }

    #[tokio::test]
    async fn counter_failure_is_propagated() {
        let generator = SequentialGenerator::new(BrokenCounter);
        let err = generator.generate().await.unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Counter(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn collisions_raise_alerts() {
        let generator = SequentialGenerator::new(TestCounter::default());
        assert_eq!(generator.collision_policy(), CollisionPolicy::Alert);
    }
}
