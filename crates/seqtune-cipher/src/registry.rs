//! The transform registry: id → metadata, inverse pairing, permutable pool.

use std::collections::BTreeMap;

use seqtune_error::{Result, TuneError};
use seqtune_types::Transform;

/// Immutable table of registered transforms.
///
/// The search cores only ever read from the registry; per-transform rounds
/// travel inside each profile, never here.
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    transforms: BTreeMap<u8, Transform>,
}

/// Reference transform ids. Inverse pairs are adjacent; the rest are
/// self-inverse.
pub mod ids {
    pub const MASK_ADD: u8 = 10;
    pub const MASK_SUB: u8 = 11;
    pub const NIBBLE_SWAP: u8 = 12;
    pub const XOR_MASK: u8 = 13;
    pub const BIT_FLIP: u8 = 14;
    pub const ROTATE_LEFT: u8 = 15;
    pub const ROTATE_RIGHT: u8 = 16;
    pub const BYTE_REVERSE: u8 = 17;
    pub const RIFFLE: u8 = 18;
    pub const UNRIFFLE: u8 = 19;
    pub const CHAIN_FORWARD: u8 = 20;
    pub const CHAIN_REVERSE: u8 = 21;
    pub const SUB_BYTES: u8 = 22;
    pub const INV_SUB_BYTES: u8 = 23;
    pub const BLOCK_ROTATE_LEFT: u8 = 24;
    pub const BLOCK_ROTATE_RIGHT: u8 = 25;
}

impl TransformRegistry {
    /// Build a registry from explicit metadata, validating the inverse
    /// involution: `registry[registry[id].inverse_id].inverse_id == id`.
    pub fn new(transforms: Vec<Transform>) -> Result<Self> {
        let reg = Self {
            transforms: transforms.into_iter().map(|t| (t.id, t)).collect(),
        };
        reg.validate()?;
        Ok(reg)
    }

    fn validate(&self) -> Result<()> {
        for t in self.transforms.values() {
            let Some(inv) = self.transforms.get(&t.inverse_id) else {
                return Err(TuneError::internal(format!(
                    "transform {} names missing inverse {}",
                    t.id, t.inverse_id
                )));
            };
            if inv.inverse_id != t.id {
                return Err(TuneError::internal(format!(
                    "inverse pairing broken: {} -> {} -> {}",
                    t.id, t.inverse_id, inv.inverse_id
                )));
            }
        }
        Ok(())
    }

    /// The reference set shipped with the workspace.
    #[must_use]
    pub fn reference() -> Self {
        use ids::*;
        let entry = |id: u8, name: &str, inverse_id: u8, excluded: bool, benchmark_ms: f64| {
            Transform {
                id,
                name: name.to_owned(),
                inverse_id,
                excluded,
                benchmark_ms,
            }
        };
        let transforms = vec![
            entry(MASK_ADD, "MaskAdd", MASK_SUB, false, 0.021),
            entry(MASK_SUB, "MaskSub", MASK_ADD, false, 0.021),
            entry(NIBBLE_SWAP, "NibbleSwap", NIBBLE_SWAP, false, 0.012),
            entry(XOR_MASK, "XorMask", XOR_MASK, false, 0.019),
            // Trivial involution; registered for profile replay only.
            entry(BIT_FLIP, "BitFlip", BIT_FLIP, true, 0.008),
            entry(ROTATE_LEFT, "RotateLeft", ROTATE_RIGHT, false, 0.014),
            entry(ROTATE_RIGHT, "RotateRight", ROTATE_LEFT, false, 0.014),
            entry(BYTE_REVERSE, "ByteReverse", BYTE_REVERSE, false, 0.006),
            entry(RIFFLE, "Riffle", UNRIFFLE, false, 0.027),
            entry(UNRIFFLE, "Unriffle", RIFFLE, false, 0.027),
            entry(CHAIN_FORWARD, "ChainForward", CHAIN_REVERSE, false, 0.016),
            entry(CHAIN_REVERSE, "ChainReverse", CHAIN_FORWARD, false, 0.016),
            entry(SUB_BYTES, "SubBytes", INV_SUB_BYTES, false, 0.018),
            entry(INV_SUB_BYTES, "InvSubBytes", SUB_BYTES, false, 0.018),
            entry(BLOCK_ROTATE_LEFT, "BlockRotateLeft", BLOCK_ROTATE_RIGHT, false, 0.009),
            entry(BLOCK_ROTATE_RIGHT, "BlockRotateRight", BLOCK_ROTATE_LEFT, false, 0.009),
        ];
        // The reference table is statically well-formed; skip revalidation.
        let reg = Self {
            transforms: transforms.into_iter().map(|t| (t.id, t)).collect(),
        };
        debug_assert!(reg.validate().is_ok());
        reg
    }

    pub fn get(&self, id: u8) -> Result<&Transform> {
        self.transforms
            .get(&id)
            .ok_or_else(|| TuneError::UnknownTransform(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: u8) -> bool {
        self.transforms.contains_key(&id)
    }

    pub fn inverse_of(&self, id: u8) -> Result<u8> {
        Ok(self.get(id)?.inverse_id)
    }

    /// Ids eligible for enumeration, ascending.
    #[must_use]
    pub fn iter_permutable(&self) -> Vec<u8> {
        self.transforms
            .values()
            .filter(|t| !t.excluded)
            .map(|t| t.id)
            .collect()
    }

    /// Benchmark timings for the given pool, registry order.
    #[must_use]
    pub fn benchmarks_for(&self, pool: &[u8]) -> Vec<f64> {
        pool.iter()
            .filter_map(|id| self.transforms.get(id).map(|t| t.benchmark_ms))
            .collect()
    }

    /// Resolve a transform by name, case-insensitively.
    ///
    /// Errors with `AmbiguousTransformName` when more than one entry
    /// matches, `UnknownTransform` when none does.
    pub fn resolve_name(&self, name: &str) -> Result<&Transform> {
        let mut hit = None;
        for t in self.transforms.values() {
            if t.name.eq_ignore_ascii_case(name) {
                if hit.is_some() {
                    return Err(TuneError::AmbiguousTransformName(name.to_owned()));
                }
                hit = Some(t);
            }
        }
        hit.ok_or_else(|| TuneError::UnknownTransform(name.to_owned()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}
