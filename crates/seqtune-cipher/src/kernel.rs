//! The reference transform kernels.
//!
//! Every kernel is a bijection on byte blocks of any length. Keyed kernels
//! draw their material from a keystream derived from `(session key, pair id,
//! global round, transform round)`; both halves of an inverse pair derive
//! from the *lower* id of the pair so the inverse can regenerate the exact
//! same material.

use seqtune_error::{Result, TuneError};

use crate::registry::ids;

/// Resolved kernel for one transform id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kernel {
    MaskAdd,
    MaskSub,
    NibbleSwap,
    XorMask,
    BitFlip,
    RotateLeft,
    RotateRight,
    ByteReverse,
    Riffle,
    Unriffle,
    ChainForward,
    ChainReverse,
    SubBytes,
    InvSubBytes,
    BlockRotateLeft,
    BlockRotateRight,
}

impl Kernel {
    pub(crate) fn for_id(id: u8) -> Result<Self> {
        Ok(match id {
            ids::MASK_ADD => Self::MaskAdd,
            ids::MASK_SUB => Self::MaskSub,
            ids::NIBBLE_SWAP => Self::NibbleSwap,
            ids::XOR_MASK => Self::XorMask,
            ids::BIT_FLIP => Self::BitFlip,
            ids::ROTATE_LEFT => Self::RotateLeft,
            ids::ROTATE_RIGHT => Self::RotateRight,
            ids::BYTE_REVERSE => Self::ByteReverse,
            ids::RIFFLE => Self::Riffle,
            ids::UNRIFFLE => Self::Unriffle,
            ids::CHAIN_FORWARD => Self::ChainForward,
            ids::CHAIN_REVERSE => Self::ChainReverse,
            ids::SUB_BYTES => Self::SubBytes,
            ids::INV_SUB_BYTES => Self::InvSubBytes,
            ids::BLOCK_ROTATE_LEFT => Self::BlockRotateLeft,
            ids::BLOCK_ROTATE_RIGHT => Self::BlockRotateRight,
            other => return Err(TuneError::UnknownTransform(other.to_string())),
        })
    }

    /// The lower id of the kernel's inverse pair; keystream derivation key.
    pub(crate) fn pair_floor(id: u8) -> u8 {
        match id {
            ids::MASK_SUB => ids::MASK_ADD,
            ids::ROTATE_RIGHT => ids::ROTATE_LEFT,
            ids::UNRIFFLE => ids::RIFFLE,
            ids::CHAIN_REVERSE => ids::CHAIN_FORWARD,
            ids::INV_SUB_BYTES => ids::SUB_BYTES,
            ids::BLOCK_ROTATE_RIGHT => ids::BLOCK_ROTATE_LEFT,
            other => other,
        }
    }
}

/// Keystream material handed to a kernel application.
pub(crate) struct KernelMaterial<'a> {
    /// Mask bytes, same length as the block.
    pub stream: &'a [u8],
    /// Substitution table and its inverse, derived once per cipher.
    pub sbox: &'a [u8; 256],
    pub sbox_inv: &'a [u8; 256],
}

pub(crate) fn apply(kernel: Kernel, block: &mut Vec<u8>, material: &KernelMaterial<'_>) {
    if block.is_empty() {
        return;
    }
    match kernel {
        Kernel::MaskAdd => {
            for (b, s) in block.iter_mut().zip(material.stream) {
                *b = b.wrapping_add(*s);
            }
        }
        Kernel::MaskSub => {
            for (b, s) in block.iter_mut().zip(material.stream) {
                *b = b.wrapping_sub(*s);
            }
        }
        Kernel::NibbleSwap => {
            for b in block.iter_mut() {
                *b = b.rotate_left(4);
            }
        }
        Kernel::XorMask => {
            for (b, s) in block.iter_mut().zip(material.stream) {
                *b ^= *s;
            }
        }
        Kernel::BitFlip => {
            for b in block.iter_mut() {
                *b = !*b;
            }
        }
        Kernel::RotateLeft => {
            let k = rot_amount(material);
            for b in block.iter_mut() {
                *b = b.rotate_left(k);
            }
        }
        Kernel::RotateRight => {
            let k = rot_amount(material);
            for b in block.iter_mut() {
                *b = b.rotate_right(k);
            }
        }
        Kernel::ByteReverse => block.reverse(),
        Kernel::Riffle => riffle(block),
        Kernel::Unriffle => unriffle(block),
        Kernel::ChainForward => {
            for i in 1..block.len() {
                block[i] ^= block[i - 1];
            }
        }
        Kernel::ChainReverse => {
            for i in (1..block.len()).rev() {
                block[i] ^= block[i - 1];
            }
        }
        Kernel::SubBytes => {
            for b in block.iter_mut() {
                *b = material.sbox[*b as usize];
            }
        }
        Kernel::InvSubBytes => {
            for b in block.iter_mut() {
                *b = material.sbox_inv[*b as usize];
            }
        }
        Kernel::BlockRotateLeft => {
            let k = block_rot_amount(material, block.len());
            block.rotate_left(k);
        }
        Kernel::BlockRotateRight => {
            let k = block_rot_amount(material, block.len());
            block.rotate_right(k);
        }
    }
}

/// Per-byte bit rotation amount, 1..=7, from the keystream head.
fn rot_amount(material: &KernelMaterial<'_>) -> u32 {
    u32::from(material.stream.first().copied().unwrap_or(0) % 7) + 1
}

/// Whole-block rotation amount in `0..len` from the keystream head.
fn block_rot_amount(material: &KernelMaterial<'_>, len: usize) -> usize {
    let head = material
        .stream
        .get(..8)
        .map_or(0u64, |s| u64::from_le_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]]));
    (head % len as u64) as usize
}

/// Perfect out-shuffle: front half to even positions, back half to odd.
/// Odd lengths give the front half the extra element.
fn riffle(block: &mut Vec<u8>) {
    let n = block.len();
    let front = n.div_ceil(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..front {
        out.push(block[i]);
        if front + i < n {
            out.push(block[front + i]);
        }
    }
    *block = out;
}

fn unriffle(block: &mut Vec<u8>) {
    let n = block.len();
    let front = n.div_ceil(2);
    let mut out = vec![0u8; n];
    let mut idx = 0;
    for i in 0..front {
        out[i] = block[idx];
        idx += 1;
        if front + i < n {
            out[front + i] = block[idx];
            idx += 1;
        }
    }
    *block = out;
}
