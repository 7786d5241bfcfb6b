use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sampling duration must be greater than zero")]
    ZeroDuration,
    #[error("chunk size {0} is not a non-zero power of two")]
    ChunkNotPowerOfTwo(usize),
    #[error("minimum chunk {min} exceeds maximum chunk {max}")]
    ChunkRange { min: usize, max: usize },
    #[error("key length must be greater than zero bits")]
    ZeroKeyBits,
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    // How long each chunk size is sampled
    pub duration: Duration,

    // Chunk bounds in bytes, both inclusive
    pub min_chunk: usize,
    pub max_chunk: usize,

    // Requested key length, independent of the cipher under test
    pub key_bits: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            min_chunk: 256,
            max_chunk: 64 * 1024,
            key_bits: 128,
        }
    }
}

impl BenchConfig {
    /// Defaults overlaid with `NCR_SPEED_*` environment variables.
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NCR_SPEED_SECS") {
            let secs = val.trim().parse::<f64>().ok();
            if let Some(d) = secs.and_then(|n| Duration::try_from_secs_f64(n).ok()) {
                config.duration = d;
            }
        }

        if let Ok(val) = std::env::var("NCR_SPEED_MIN_CHUNK") {
            if let Ok(n) = val.trim().parse() {
                config.min_chunk = n;
            }
        }

        if let Ok(val) = std::env::var("NCR_SPEED_MAX_CHUNK") {
            if let Ok(n) = val.trim().parse() {
                config.max_chunk = n;
            }
        }

        if let Ok(val) = std::env::var("NCR_SPEED_KEY_BITS") {
            if let Ok(n) = val.trim().parse() {
                config.key_bits = n;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        for size in [self.min_chunk, self.max_chunk] {
            if !size.is_power_of_two() {
                return Err(ConfigError::ChunkNotPowerOfTwo(size));
            }
        }
        if self.min_chunk > self.max_chunk {
            return Err(ConfigError::ChunkRange { min: self.min_chunk, max: self.max_chunk });
        }
        if self.key_bits == 0 {
            return Err(ConfigError::ZeroKeyBits);
        }
        Ok(())
    }

    /// Doubling sequence from `min_chunk` up to and including `max_chunk`.
    pub fn chunk_sizes(&self) -> impl Iterator<Item = usize> {
        let max = self.max_chunk;
        std::iter::successors(Some(self.min_chunk).filter(|&s| s > 0), |&s| s.checked_mul(2))
            .take_while(move |&s| s <= max)
    }
}
