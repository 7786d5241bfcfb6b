//! Throughput harness for session-based cipher devices.
//!
//! The harness drives a [`DeviceSession`] through a doubling sequence of chunk
//! sizes, samples each size for a fixed wall-clock duration and reports the
//! result in human-scaled units.

pub mod config;
pub mod device;
pub mod driver;
pub mod report;
pub mod sampler;
pub mod units;

pub use config::{BenchConfig, ConfigError};
pub use device::{Cipher, DeviceError, DeviceSession, CBC_IV, IV_LEN};
pub use driver::{BenchError, Driver, DriverState};
pub use report::{OutputFormat, SizeResult};
pub use sampler::{DeadlineTimer, Sample, SampleError, Sampler, StopToken};
pub use units::{scale, ScaledResult, Unit};
