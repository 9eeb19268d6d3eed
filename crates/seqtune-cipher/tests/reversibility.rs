//! Property test: every profile over the reference transforms round-trips
//! on arbitrary blocks, keys, and round annotations.

use proptest::collection::vec;
use proptest::prelude::*;

use seqtune_cipher::{Cipher, TransformRegistry};
use seqtune_types::{InputProfile, Sequence};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encrypt_then_decrypt_is_identity(
        picks in vec(0usize..15, 1..5),
        rounds in vec(1u8..4, 5),
        gr in 1u32..4,
        key_byte in 0u8..255,
        input in vec(any::<u8>(), 0..600),
    ) {
        let registry = TransformRegistry::reference();
        let pool = registry.iter_permutable();
        let ids: Vec<u8> = picks.iter().map(|&i| pool[i % pool.len()]).collect();
        let profile = InputProfile::new(
            "prop",
            Sequence::from_ids_and_rounds(&ids, &rounds[..ids.len()]),
            gr,
        );
        let cipher = Cipher::new([key_byte; 32]);
        let encrypted = cipher.encrypt(&profile, &input).unwrap();
        let decrypted = cipher.decrypt(&profile, &encrypted).unwrap();
        prop_assert_eq!(decrypted, input);
    }
}
