//! Walks the chunk-size sequence for one cipher.

use std::io::{self, Write};

use tracing::{error, warn};

use crate::config::BenchConfig;
use crate::device::{Cipher, DeviceError, DeviceSession, CBC_IV};
use crate::report::{self, OutputFormat, SizeResult};
use crate::sampler::{Sample, Sampler};

/// First fill byte; every size iteration uses the next one.
const FILL_SEED: u8 = 23;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("key generation ({bits} bits) failed at chunk size {chunk_size}: {source}")]
    KeyGeneration {
        chunk_size: usize,
        bits: u32,
        #[source]
        source: DeviceError,
    },

    #[error("encrypt failed at chunk size {chunk_size} after {processed_bytes} bytes: {source}")]
    Operation {
        chunk_size: usize,
        processed_bytes: u64,
        #[source]
        source: DeviceError,
    },

    #[error("no measurable time elapsed at chunk size {chunk_size}")]
    InsufficientSample { chunk_size: usize },

    #[error("writing report: {0}")]
    Output(#[from] io::Error),
}

impl BenchError {
    pub fn chunk_size(&self) -> Option<usize> {
        match self {
            BenchError::KeyGeneration { chunk_size, .. }
            | BenchError::Operation { chunk_size, .. }
            | BenchError::InsufficientSample { chunk_size } => Some(*chunk_size),
            BenchError::Output(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running(usize),
    Aborted(usize),
    Completed,
}

pub struct Driver<D: DeviceSession> {
    device: D,
    config: BenchConfig,
    sampler: Sampler,
    format: OutputFormat,
    state: DriverState,
    fill: u8,
}

impl<D: DeviceSession> Driver<D> {
    pub fn new(device: D, config: BenchConfig) -> Self {
        let sampler = Sampler::new(config.duration);
        Self {
            device,
            config,
            sampler,
            format: OutputFormat::Text,
            state: DriverState::Idle,
            fill: FILL_SEED,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Benchmarks `cipher` at every configured chunk size, writing one line per
    /// size to `out`. The first failure aborts the remaining sizes.
    pub fn run<W: Write>(
        &mut self,
        cipher: Cipher,
        out: &mut W,
    ) -> Result<Vec<SizeResult>, BenchError> {
        let sizes: Vec<usize> = self.config.chunk_sizes().collect();
        let mut results = Vec::with_capacity(sizes.len());
        for chunk_size in sizes {
            self.state = DriverState::Running(chunk_size);
            match self.run_size(cipher, chunk_size, out) {
                Ok(r) => results.push(r),
                Err(e) => {
                    self.state = DriverState::Aborted(chunk_size);
                    error!(%cipher, chunk_size, error = %e, "benchmark aborted");
                    return Err(e);
                }
            }
        }
        self.state = DriverState::Completed;
        Ok(results)
    }

    fn run_size<W: Write>(
        &mut self,
        cipher: Cipher,
        chunk_size: usize,
        out: &mut W,
    ) -> Result<SizeResult, BenchError> {
        let bits = self.config.key_bits;
        let key = self
            .device
            .generate_key(bits)
            .map_err(|source| BenchError::KeyGeneration { chunk_size, bits, source })?;

        let outcome = self.measure(cipher, chunk_size, &key, out);

        if let Err(e) = self.device.release_key(key) {
            warn!(%cipher, chunk_size, error = %e, "releasing key failed");
        }

        if outcome.is_err() {
            // a broken report stream leaves nothing to terminate
            if let Err(e) = report::abort(out, self.format) {
                warn!(error = %e, "terminating report line failed");
            }
        }
        outcome
    }

    fn measure<W: Write>(
        &mut self,
        cipher: Cipher,
        chunk_size: usize,
        key: &D::Key,
        out: &mut W,
    ) -> Result<SizeResult, BenchError> {
        let mut buffer = vec![self.fill; chunk_size];
        self.fill = self.fill.wrapping_add(1);

        report::begin(out, self.format, chunk_size)?;

        let device = &mut self.device;
        let sample = self
            .sampler
            .sample(&mut buffer, |buf| device.encrypt(cipher, key, &CBC_IV, buf))
            .map_err(|e| BenchError::Operation {
                chunk_size,
                processed_bytes: e.partial.total_bytes,
                source: e.source,
            })?;

        let result = size_result(cipher, chunk_size, sample)?;
        report::finish(out, self.format, &result)?;
        Ok(result)
    }
}

/// Rates a finished sample. A sample with no measurable elapsed time has no
/// rate and is refused.
fn size_result(
    cipher: Cipher,
    chunk_size: usize,
    sample: Sample,
) -> Result<SizeResult, BenchError> {
    let scaled = sample.scaled().ok_or(BenchError::InsufficientSample { chunk_size })?;
    Ok(SizeResult { cipher, chunk_size, sample, scaled })
}
