//! The contract the harness needs from a cipher device.

use serde::Serialize;

pub const IV_LEN: usize = 32;

/// IV handed to every CBC operation. Benchmark filler, not a secret.
pub const CBC_IV: [u8; IV_LEN] = [0x23; IV_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cipher {
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "AES-128-CBC")]
    Aes128Cbc,
}

impl Cipher {
    pub const ALL: [Cipher; 2] = [Cipher::Null, Cipher::Aes128Cbc];

    pub fn name(self) -> &'static str {
        match self {
            Cipher::Null => "NULL",
            Cipher::Aes128Cbc => "AES-128-CBC",
        }
    }
}

impl std::fmt::Display for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A device call that did not complete.
#[derive(Debug, thiserror::Error)]
#[error("{op} failed: {source}")]
pub struct DeviceError {
    pub op: &'static str,
    #[source]
    pub source: std::io::Error,
}

impl DeviceError {
    pub fn new(op: &'static str, source: std::io::Error) -> Self {
        Self { op, source }
    }
}

/// A session-capable cipher device. Every call blocks until the device
/// answers.
pub trait DeviceSession {
    type Key;

    fn generate_key(&mut self, bits: u32) -> Result<Self::Key, DeviceError>;

    /// Encrypts `buffer` in place with a single-shot session. Devices whose
    /// requests carry no cipher parameters may ignore `iv`.
    fn encrypt(
        &mut self,
        cipher: Cipher,
        key: &Self::Key,
        iv: &[u8; IV_LEN],
        buffer: &mut [u8],
    ) -> Result<(), DeviceError>;

    fn release_key(&mut self, key: Self::Key) -> Result<(), DeviceError>;
}
