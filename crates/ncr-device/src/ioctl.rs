//! NCR ioctls on `/dev/crypto`.
//!
//! Request codes are built by `nix`, which knows the direction and size
//! layout of each architecture.

use nix::{ioctl_none, ioctl_read, ioctl_readwrite};

use crate::request::{RawKeyGenerate, RawSessionOnce};

pub type KeyId = i32;

const NCR_MAGIC: u8 = b'c';

const KEY_INIT_NR: u8 = 204;
const KEY_GENERATE_NR: u8 = 205;
const KEY_DEINIT_NR: u8 = 215;
const SESSION_ONCE_NR: u8 = 226;

ioctl_none!(key_init, NCR_MAGIC, KEY_INIT_NR);
ioctl_readwrite!(key_generate, NCR_MAGIC, KEY_GENERATE_NR, RawKeyGenerate);
ioctl_read!(key_deinit, NCR_MAGIC, KEY_DEINIT_NR, KeyId);
ioctl_readwrite!(session_once, NCR_MAGIC, SESSION_ONCE_NR, RawSessionOnce);
