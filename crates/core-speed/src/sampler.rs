//! Fixed-duration sampling of a repeated device operation.
//!
//! A device call cannot be preempted, so throughput is measured over as many
//! calls as fit into the sampling window. The window is closed cooperatively:
//! a [`DeadlineTimer`] trips a [`StopToken`] and the loop notices it between
//! operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::device::DeviceError;
use crate::units::{scale, ScaledResult};

/// Cooperative stop flag shared between a sampling loop and whoever ends it.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One-shot timer that stops a token once `after` has elapsed.
///
/// Dropping the timer disarms it and joins its thread, so a timer can never
/// outlive the run it was armed for.
pub struct DeadlineTimer {
    disarm: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    pub fn arm(after: Duration, token: StopToken) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(after) {
                token.stop();
            }
        });
        Self { disarm: Some(tx), handle: Some(handle) }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        // closing the channel wakes the timer thread
        self.disarm.take();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Sample {
    pub total_bytes: u64,
    pub operations: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "secs_f64")]
    pub elapsed: Duration,
}

impl Sample {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Scaled throughput, or `None` if no measurable time passed.
    pub fn scaled(&self) -> Option<ScaledResult> {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            Some(scale(self.total_bytes as f64, secs))
        } else {
            None
        }
    }
}

fn secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// A device failure during sampling, with whatever was measured before it.
#[derive(Debug, thiserror::Error)]
#[error("{source} after {} operations", .partial.operations)]
pub struct SampleError {
    pub partial: Sample,
    #[source]
    pub source: DeviceError,
}

impl SampleError {
    /// True when the very first operation failed and nothing was processed.
    pub fn failed_immediately(&self) -> bool {
        self.partial.operations == 0
    }
}

pub struct Sampler {
    duration: Duration,
    token: StopToken,
    /// Reports every run as taking no time at all.
    #[cfg(test)]
    pub(crate) frozen_clock: bool,
}

impl Sampler {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            token: StopToken::new(),
            #[cfg(test)]
            frozen_clock: false,
        }
    }

    /// Handle to the token this sampler polls. Stopping it ends the current
    /// run after the in-flight operation.
    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    /// Runs `op` over `buffer` until the deadline fires or `op` fails.
    ///
    /// `op` is always invoked at least once.
    pub fn sample<F>(&self, buffer: &mut [u8], mut op: F) -> Result<Sample, SampleError>
    where
        F: FnMut(&mut [u8]) -> Result<(), DeviceError>,
    {
        self.token.reset();
        let timer = DeadlineTimer::arm(self.duration, self.token.clone());
        let chunk = buffer.len() as u64;
        let mut total_bytes: u64 = 0;
        let mut operations: u64 = 0;
        let mut failure = None;

        let start = Instant::now();
        loop {
            if let Err(e) = op(&mut *buffer) {
                failure = Some(e);
                break;
            }
            total_bytes += chunk;
            operations += 1;
            if self.token.is_stopped() {
                break;
            }
        }
        let elapsed = start.elapsed();
        drop(timer);
        #[cfg(test)]
        let elapsed = if self.frozen_clock { Duration::ZERO } else { elapsed };

        let sample = Sample { total_bytes, operations, elapsed };
        debug!(
            chunk,
            total_bytes,
            operations,
            elapsed_secs = sample.elapsed_secs(),
            "sample finished"
        );
        match failure {
            Some(source) => Err(SampleError { partial: sample, source }),
            None => Ok(sample),
        }
    }
}
