//! Scripted stand-in for a cipher device, shared by the compliance profiles.

use std::io;
use std::time::{Duration, Instant};

use core_speed::{Cipher, DeviceError, DeviceSession, StopToken, IV_LEN};

#[derive(Debug, Default, Clone)]
pub struct CallLog {
    pub keys_generated: u32,
    pub keys_released: u32,
    pub key_bits: Vec<u32>,
    /// Buffer length of every successful encrypt, in call order.
    pub encrypts: Vec<(Cipher, usize)>,
}

impl CallLog {
    /// Distinct chunk sizes in the order they were first encrypted.
    pub fn sizes(&self, cipher: Cipher) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for &(c, size) in &self.encrypts {
            if c == cipher && out.last() != Some(&size) {
                out.push(size);
            }
        }
        out
    }
}

#[derive(Default)]
pub struct StubDevice {
    latency: Duration,
    fail_keygen: bool,
    fail_at: Option<(Cipher, usize)>,
    stop_after: Option<(u64, StopToken)>,
    calls_this_key: u64,
    next_key: u64,
    pub log: CallLog,
}

impl StubDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every encrypt spins for `latency` before returning.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_keygen(mut self) -> Self {
        self.fail_keygen = true;
        self
    }

    /// Encrypts of `size` bytes under `cipher` fail.
    pub fn failing_at(mut self, cipher: Cipher, size: usize) -> Self {
        self.fail_at = Some((cipher, size));
        self
    }

    /// Trips `token` after the `k`-th encrypt under each key, standing in for
    /// the deadline.
    pub fn stop_after(&mut self, k: u64, token: StopToken) {
        self.stop_after = Some((k, token));
    }

    fn spin(&self) {
        if self.latency.is_zero() {
            return;
        }
        let until = Instant::now() + self.latency;
        while Instant::now() < until {
            std::hint::spin_loop();
        }
    }
}

fn stub_error(op: &'static str, msg: &str) -> DeviceError {
    DeviceError::new(op, io::Error::new(io::ErrorKind::Other, msg.to_string()))
}

impl DeviceSession for StubDevice {
    type Key = u64;

    fn generate_key(&mut self, bits: u32) -> Result<u64, DeviceError> {
        self.log.key_bits.push(bits);
        if self.fail_keygen {
            return Err(stub_error("generate_key", "key table full"));
        }
        self.next_key += 1;
        self.calls_this_key = 0;
        self.log.keys_generated += 1;
        Ok(self.next_key)
    }

    fn encrypt(
        &mut self,
        cipher: Cipher,
        _key: &u64,
        _iv: &[u8; IV_LEN],
        buffer: &mut [u8],
    ) -> Result<(), DeviceError> {
        if self.fail_at == Some((cipher, buffer.len())) {
            return Err(stub_error("encrypt", "device fault"));
        }
        self.spin();
        for b in buffer.iter_mut() {
            *b = b.wrapping_add(1);
        }
        self.log.encrypts.push((cipher, buffer.len()));
        self.calls_this_key += 1;
        if let Some((k, token)) = &self.stop_after {
            if self.calls_this_key == *k {
                token.stop();
            }
        }
        Ok(())
    }

    fn release_key(&mut self, _key: u64) -> Result<(), DeviceError> {
        self.log.keys_released += 1;
        Ok(())
    }
}
