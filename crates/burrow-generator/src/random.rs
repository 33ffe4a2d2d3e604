use crate::{CollisionPolicy, Generator, GeneratorError, Result};
use async_trait::async_trait;
use burrow_core::base62::ALPHABET;
use burrow_core::ShortCode;
use rand::Rng;

pub const DEFAULT_LENGTH: usize = 7;
const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 32;

/// Fixed-length random codes over the 62-symbol alphabet.
///
/// Draws from the thread-local CSPRNG. With the default length of 7 there are
/// 62^7 (about 3.5 * 10^12) codes, so collisions are rare but possible.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }

    pub fn with_length(length: usize) -> Result<Self> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(GeneratorError::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn draw(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for RandomGenerator {
    async fn generate(&self) -> Result<ShortCode> {
        Ok(ShortCode::new_unchecked(self.draw()))
    }

    fn collision_policy(&self) -> CollisionPolicy {
        CollisionPolicy::Retry
    }
}
