//! `DeviceSession` backed by the NCR interface of `/dev/crypto`.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use core_speed::{Cipher, DeviceError, DeviceSession, IV_LEN};
use nix::errno::Errno;
use tracing::{debug, warn};

mod ioctl;
mod request;

pub use ioctl::KeyId;
pub use request::{Algorithm, EncryptOnce, KeyGenerateRequest};

pub const DEFAULT_DEVICE: &str = "/dev/crypto";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to a key object living in the kernel.
#[derive(Debug, PartialEq, Eq)]
pub struct NcrKey(KeyId);

fn ioctl_error(op: &'static str, errno: Errno) -> DeviceError {
    DeviceError::new(op, io::Error::from(errno))
}

pub struct NcrDevice {
    file: File,
    path: PathBuf,
}

impl NcrDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::Open { path: path.clone(), source })?;
        debug!(path = %path.display(), "device opened");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn deinit(&self, key: KeyId) -> Result<(), DeviceError> {
        let mut id = key;
        // SAFETY: the argument is a live `ncr_key_t` for the duration of the call.
        unsafe { ioctl::key_deinit(self.file.as_raw_fd(), &mut id) }
            .map_err(|e| ioctl_error("NCRIO_KEY_DEINIT", e))?;
        Ok(())
    }
}

impl DeviceSession for NcrDevice {
    type Key = NcrKey;

    fn generate_key(&mut self, bits: u32) -> Result<NcrKey, DeviceError> {
        let fd = self.file.as_raw_fd();
        // SAFETY: KEY_INIT takes no argument.
        let id = unsafe { ioctl::key_init(fd) }.map_err(|e| ioctl_error("NCRIO_KEY_INIT", e))?;

        // The generated key is always AES-CBC, whatever cipher later uses it.
        let mut raw = KeyGenerateRequest::new(id)
            .algorithm(Algorithm::AesCbc)
            .bits(bits)
            .to_raw();
        // SAFETY: `raw` is a properly laid out request that outlives the call.
        if let Err(errno) = unsafe { ioctl::key_generate(fd, &mut raw) } {
            if let Err(e) = self.deinit(id) {
                warn!(key = id, error = %e, "dropping half-initialized key failed");
            }
            return Err(ioctl_error("NCRIO_KEY_GENERATE", errno));
        }
        Ok(NcrKey(id))
    }

    /// The NCR once-op carries no cipher parameters, so `_iv` is not sent.
    fn encrypt(
        &mut self,
        cipher: Cipher,
        key: &NcrKey,
        _iv: &[u8; IV_LEN],
        buffer: &mut [u8],
    ) -> Result<(), DeviceError> {
        let mut bound = EncryptOnce::new(cipher, key.0, buffer).bind();
        // SAFETY: the request's data pointers borrow `buffer`, which stays
        // alive and exclusively ours until `bound` is dropped.
        unsafe { ioctl::session_once(self.file.as_raw_fd(), &mut bound.raw) }
            .map_err(|e| ioctl_error("NCRIO_SESSION_ONCE", e))?;
        Ok(())
    }

    fn release_key(&mut self, key: NcrKey) -> Result<(), DeviceError> {
        self.deinit(key.0)
    }
}
