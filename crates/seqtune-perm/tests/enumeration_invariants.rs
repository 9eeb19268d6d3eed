//! Property tests: the counting DP and the lazy generator must agree on
//! every plan, and every emission must satisfy the plan's filters.

use proptest::collection::vec;
use proptest::prelude::*;

use seqtune_perm::PermutationPlan;

fn occurrences(seq: &[u8], id: u8) -> usize {
    seq.iter().filter(|&&x| x == id).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn count_matches_enumeration(
        pool in vec(0u8..12, 0..6),
        length in 0usize..5,
        required in vec(0u8..12, 0..3),
        no_repeat in vec(0u8..12, 0..3),
    ) {
        // Keep the required set inside the pool half the time; the other
        // half exercises the unreachable-required empty case.
        let plan = PermutationPlan::new(&pool, length, &required, &no_repeat);
        let emitted: Vec<Vec<u8>> = plan.iter().collect();
        prop_assert_eq!(emitted.len() as u64, plan.count());

        let mut sorted_pool = pool.clone();
        sorted_pool.sort_unstable();
        sorted_pool.dedup();

        for seq in &emitted {
            prop_assert_eq!(seq.len(), length);
            for x in seq {
                prop_assert!(sorted_pool.contains(x));
            }
            for &r in &required {
                prop_assert!(occurrences(seq, r) >= 1);
            }
            for &n in &no_repeat {
                prop_assert!(occurrences(seq, n) <= 1);
            }
        }

        // Strictly increasing lexicographic order implies no duplicates.
        for w in emitted.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn repetition_cap_matches_enumeration(
        pool in vec(0u8..10, 1..5),
        length in 1usize..5,
        cap in 1u32..3,
    ) {
        let plan = PermutationPlan::with_repetition_cap(&pool, length, cap);
        let emitted: Vec<Vec<u8>> = plan.iter().collect();
        prop_assert_eq!(emitted.len() as u64, plan.count());
        for seq in &emitted {
            for &id in &pool {
                prop_assert!(occurrences(seq, id) <= cap as usize);
            }
        }
    }
}
