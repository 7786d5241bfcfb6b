//! Argument blocks for the NCR ioctls.
//!
//! The `Raw*` structs carry exactly the fields the NCR benchmark fills in,
//! in `ncr.h` member order; the once-op sends no cipher parameters. They are
//! not re-exported: callers describe requests with the builders instead.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::size_of;

use core_speed::Cipher;

use crate::ioctl::KeyId;

/// Netlink attribute header: `struct nlattr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NlAttr {
    pub nla_len: u16,
    pub nla_type: u16,
}

const NLA_HDRLEN: u16 = size_of::<NlAttr>() as u16;

const NCR_ATTR_ALGORITHM: u16 = 1;
const NCR_ATTR_SECRET_KEY_BITS: u16 = 15;

const NCR_OP_ENCRYPT: u32 = 1;
const NCR_DIRECT_DATA: u32 = 1;

/// `ncr_algorithm_t` values the tool uses, by position in the enum
/// (`NCR_ALG_NONE`, `NCR_ALG_NULL`, `NCR_ALG_3DES_CBC`, `NCR_ALG_AES_CBC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Algorithm {
    Null = 1,
    AesCbc = 3,
}

impl From<Cipher> for Algorithm {
    fn from(c: Cipher) -> Self {
        match c {
            Cipher::Null => Algorithm::Null,
            Cipher::Aes128Cbc => Algorithm::AesCbc,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct U32Attr {
    pub head: NlAttr,
    pub value: u32,
}

impl U32Attr {
    fn new(ty: u16, value: u32) -> Self {
        Self { head: NlAttr { nla_len: NLA_HDRLEN + size_of::<u32>() as u16, nla_type: ty }, value }
    }
}

/// `struct ncr_key_generate` followed by its ALGORITHM and SECRET_KEY_BITS
/// attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawKeyGenerate {
    pub input_size: u32,
    pub output_size: u32,
    pub key: KeyId,
    pub algorithm: U32Attr,
    pub bits: U32Attr,
}

/// Key generation for a handle obtained from `NCRIO_KEY_INIT`.
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerateRequest {
    key: KeyId,
    algorithm: Algorithm,
    bits: u32,
}

impl KeyGenerateRequest {
    pub fn new(key: KeyId) -> Self {
        Self { key, algorithm: Algorithm::AesCbc, bits: 128 }
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub(crate) fn to_raw(self) -> RawKeyGenerate {
        RawKeyGenerate {
            input_size: size_of::<RawKeyGenerate>() as u32,
            output_size: 0,
            key: self.key,
            algorithm: U32Attr::new(NCR_ATTR_ALGORITHM, self.algorithm as u32),
            bits: U32Attr::new(NCR_ATTR_SECRET_KEY_BITS, self.bits),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSessionInit {
    pub ses: u32,
    pub algorithm: u32,
    pub key: KeyId,
    pub op: u32,
    pub err: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawUserData {
    pub input: *const c_void,
    pub input_size: usize,
    pub output: *mut c_void,
    pub output_size: usize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSessionOp {
    pub ses: u32,
    pub udata: RawUserData,
    pub data_type: u32,
    pub err: u32,
}

/// `struct ncr_session_once_op_st`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSessionOnce {
    pub init: RawSessionInit,
    pub op: RawSessionOp,
}

/// Raw once-op that borrows the buffer its pointers refer to.
pub(crate) struct BoundSessionOnce<'a> {
    pub raw: RawSessionOnce,
    _buffer: PhantomData<&'a mut [u8]>,
}

/// Single-shot in-place encryption of a user buffer.
pub struct EncryptOnce<'a> {
    algorithm: Algorithm,
    key: KeyId,
    buffer: &'a mut [u8],
}

impl<'a> EncryptOnce<'a> {
    pub fn new(cipher: Cipher, key: KeyId, buffer: &'a mut [u8]) -> Self {
        Self { algorithm: cipher.into(), key, buffer }
    }

    pub(crate) fn bind(self) -> BoundSessionOnce<'a> {
        let len = self.buffer.len();
        let ptr = self.buffer.as_mut_ptr().cast::<c_void>();
        let raw = RawSessionOnce {
            init: RawSessionInit {
                ses: 0,
                algorithm: self.algorithm as u32,
                key: self.key,
                op: NCR_OP_ENCRYPT,
                err: 0,
            },
            op: RawSessionOp {
                ses: 0,
                udata: RawUserData {
                    input: ptr.cast_const(),
                    input_size: len,
                    output: ptr,
                    output_size: len,
                },
                data_type: NCR_DIRECT_DATA,
                err: 0,
            },
        };
        BoundSessionOnce { raw, _buffer: PhantomData }
    }
}
