//! Profile execution: apply a sequence forward or run its inverse backward.

use seqtune_error::Result;
use seqtune_types::InputProfile;
use tracing::trace;

use crate::kernel::{self, Kernel, KernelMaterial};

/// A keyed cipher instance executing [`InputProfile`]s.
///
/// Encryption applies the sequence `gr` times; each step repeats its kernel
/// `tr` times. Decryption walks global rounds, steps, and transform rounds
/// in reverse, applying inverse kernels. Keystream material depends only on
/// `(key, pair id, global round, transform round)`, so both directions see
/// identical masks.
#[derive(Debug, Clone)]
pub struct Cipher {
    key: [u8; 32],
    sbox: [u8; 256],
    sbox_inv: [u8; 256],
}

impl Cipher {
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        let sbox = derive_sbox(&key);
        let mut sbox_inv = [0u8; 256];
        for (i, &mapped) in sbox.iter().enumerate() {
            sbox_inv[mapped as usize] = i as u8;
        }
        Self {
            key,
            sbox,
            sbox_inv,
        }
    }

    /// A cipher whose key differs from this one in exactly one bit; used by
    /// the key-dependency evaluation pass.
    #[must_use]
    pub fn with_flipped_key_bit(&self, bit: usize) -> Self {
        let mut key = self.key;
        key[(bit / 8) % key.len()] ^= 1 << (bit % 8);
        Self::new(key)
    }

    pub fn encrypt(&self, profile: &InputProfile, input: &[u8]) -> Result<Vec<u8>> {
        let mut block = input.to_vec();
        let mut stream = Vec::new();
        for g in 0..profile.global_rounds {
            for step in profile.sequence.steps() {
                let kernel = Kernel::for_id(step.id)?;
                for r in 0..step.tr {
                    self.fill_stream(step.id, g, r, block.len(), &mut stream);
                    let material = KernelMaterial {
                        stream: &stream,
                        sbox: &self.sbox,
                        sbox_inv: &self.sbox_inv,
                    };
                    kernel::apply(kernel, &mut block, &material);
                }
            }
        }
        trace!(
            target: "seqtune.cipher",
            rounds = profile.global_rounds,
            steps = profile.sequence.len(),
            "encrypted block"
        );
        Ok(block)
    }

    pub fn decrypt(&self, profile: &InputProfile, input: &[u8]) -> Result<Vec<u8>> {
        let mut block = input.to_vec();
        let mut stream = Vec::new();
        for g in (0..profile.global_rounds).rev() {
            for step in profile.sequence.steps().iter().rev() {
                let inverse_id = inverse_kernel_id(step.id)?;
                let kernel = Kernel::for_id(inverse_id)?;
                for r in (0..step.tr).rev() {
                    // Derivation uses the forward step's pair, same (g, r).
                    self.fill_stream(step.id, g, r, block.len(), &mut stream);
                    let material = KernelMaterial {
                        stream: &stream,
                        sbox: &self.sbox,
                        sbox_inv: &self.sbox_inv,
                    };
                    kernel::apply(kernel, &mut block, &material);
                }
            }
        }
        Ok(block)
    }

    fn fill_stream(&self, id: u8, g: u32, r: u8, len: usize, out: &mut Vec<u8>) {
        out.clear();
        out.resize(len.max(8), 0);
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(&[Kernel::pair_floor(id)]);
        hasher.update(&g.to_le_bytes());
        hasher.update(&[r]);
        hasher.finalize_xof().fill(out);
    }
}

/// Id of the kernel that undoes `id`. Mirrors the reference registry's
/// inverse pairings; self-inverses map to themselves.
fn inverse_kernel_id(id: u8) -> Result<u8> {
    use crate::registry::ids::*;
    Ok(match id {
        MASK_ADD => MASK_SUB,
        MASK_SUB => MASK_ADD,
        ROTATE_LEFT => ROTATE_RIGHT,
        ROTATE_RIGHT => ROTATE_LEFT,
        RIFFLE => UNRIFFLE,
        UNRIFFLE => RIFFLE,
        CHAIN_FORWARD => CHAIN_REVERSE,
        CHAIN_REVERSE => CHAIN_FORWARD,
        SUB_BYTES => INV_SUB_BYTES,
        INV_SUB_BYTES => SUB_BYTES,
        BLOCK_ROTATE_LEFT => BLOCK_ROTATE_RIGHT,
        BLOCK_ROTATE_RIGHT => BLOCK_ROTATE_LEFT,
        other => {
            // Validates the id while mapping self-inverses through.
            Kernel::for_id(other)?;
            other
        }
    })
}

/// Key-derived substitution table via Fisher-Yates over a blake3 stream.
fn derive_sbox(key: &[u8; 32]) -> [u8; 256] {
    let mut sbox = [0u8; 256];
    for (i, b) in sbox.iter_mut().enumerate() {
        *b = i as u8;
    }
    let mut material = [0u8; 256 * 8];
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(b"seqtune.sbox");
    hasher.finalize_xof().fill(&mut material);
    for i in (1..256usize).rev() {
        let chunk = &material[i * 8..i * 8 + 8];
        let sample = u64::from_le_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]);
        let j = (sample % (i as u64 + 1)) as usize;
        sbox.swap(i, j);
    }
    sbox
}

#[cfg(test)]
mod tests {
    use seqtune_types::{InputProfile, Sequence};

    use super::*;
    use crate::registry::{ids, TransformRegistry};

    fn cipher() -> Cipher {
        Cipher::new([7u8; 32])
    }

    #[test]
    fn every_registered_transform_round_trips() {
        let reg = TransformRegistry::reference();
        let input: Vec<u8> = (0..253u8).cycle().take(777).collect();
        let c = cipher();
        let mut all_ids = reg.iter_permutable();
        all_ids.push(ids::BIT_FLIP);
        for id in all_ids {
            for tr in [1u8, 2, 3] {
                let profile = InputProfile::new(
                    "t",
                    Sequence::from_ids_and_rounds(&[id], &[tr]),
                    2,
                );
                let enc = c.encrypt(&profile, &input).unwrap();
                let dec = c.decrypt(&profile, &enc).unwrap();
                assert_eq!(dec, input, "transform {id} tr {tr}");
            }
        }
    }

    #[test]
    fn multi_step_profiles_round_trip() {
        let input: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let c = cipher();
        let profile = InputProfile::new(
            "t",
            Sequence::from_ids_and_rounds(
                &[ids::MASK_ADD, ids::RIFFLE, ids::CHAIN_FORWARD, ids::SUB_BYTES],
                &[3, 1, 2, 1],
            ),
            5,
        );
        let enc = c.encrypt(&profile, &input).unwrap();
        assert_ne!(enc, input);
        assert_eq!(c.decrypt(&profile, &enc).unwrap(), input);
    }

    #[test]
    fn different_keys_give_different_ciphertext() {
        let input = vec![0u8; 512];
        let profile = InputProfile::probe(&[ids::XOR_MASK, ids::SUB_BYTES], 3);
        let a = cipher().encrypt(&profile, &input).unwrap();
        let b = Cipher::new([8u8; 32]).encrypt(&profile, &input).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn flipped_key_bit_changes_output() {
        let input = vec![0u8; 512];
        let profile = InputProfile::probe(&[ids::MASK_ADD, ids::CHAIN_FORWARD], 3);
        let base = cipher();
        let flipped = base.with_flipped_key_bit(0);
        let a = base.encrypt(&profile, &input).unwrap();
        let b = flipped.encrypt(&profile, &input).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_transform_id_is_rejected() {
        let profile = InputProfile::probe(&[99], 1);
        assert!(cipher().encrypt(&profile, &[1, 2, 3]).is_err());
    }
}
