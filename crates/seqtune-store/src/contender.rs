//! Bounded top-N contender store.

use std::collections::HashMap;

use parking_lot::Mutex;
use seqtune_types::Contender;

/// Thread-safe bounded table of the best contenders seen so far.
///
/// Keyed by sequence identity: offering a sequence already present replaces
/// the entry only on a strictly greater score. When full, a new entry must
/// beat the current minimum under `(score, pass_count)` to displace it.
pub struct ContenderStore {
    inner: Mutex<Inner>,
}

struct Inner {
    capacity: usize,
    by_sequence: HashMap<Vec<u8>, Contender>,
}

impl ContenderStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                by_sequence: HashMap::new(),
            }),
        }
    }

    /// Offer a contender; returns whether it was admitted (or replaced an
    /// existing entry).
    pub fn offer(&self, contender: Contender) -> bool {
        let mut inner = self.inner.lock();
        if inner.capacity == 0 {
            return false;
        }

        if let Some(existing) = inner.by_sequence.get(&contender.sequence) {
            if contender.aggregate_score > existing.aggregate_score {
                inner
                    .by_sequence
                    .insert(contender.sequence.clone(), contender);
                return true;
            }
            return false;
        }

        if inner.by_sequence.len() < inner.capacity {
            inner
                .by_sequence
                .insert(contender.sequence.clone(), contender);
            return true;
        }

        // Full: displace the worst entry if the newcomer beats it.
        let Some(worst_sequence) = inner
            .by_sequence
            .values()
            .max_by(|a, b| a.rank_cmp(b))
            .map(|c| c.sequence.clone())
        else {
            return false;
        };
        let newcomer_wins = inner
            .by_sequence
            .get(&worst_sequence)
            .is_some_and(|worst| contender.beats(worst));
        if newcomer_wins {
            inner.by_sequence.remove(&worst_sequence);
            inner
                .by_sequence
                .insert(contender.sequence.clone(), contender);
            true
        } else {
            false
        }
    }

    /// Sorted copy of the table, best first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Contender> {
        let inner = self.inner.lock();
        let mut all: Vec<Contender> = inner.by_sequence.values().cloned().collect();
        all.sort_by(Contender::rank_cmp);
        all
    }

    pub fn clear(&self) {
        self.inner.lock().by_sequence.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().by_sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contender(seq: &[u8], score: f64, pass: u32) -> Contender {
        Contender {
            sequence: seq.to_vec(),
            aggregate_score: score,
            metrics: Vec::new(),
            pass_count: pass,
        }
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let store = ContenderStore::new(3);
        for i in 0..10u8 {
            store.offer(contender(&[i], f64::from(i) / 10.0, 1));
        }
        assert_eq!(store.len(), 3);
        let snapshot = store.snapshot();
        let seqs: Vec<u8> = snapshot.iter().map(|c| c.sequence[0]).collect();
        assert_eq!(seqs, vec![9, 8, 7]);
    }

    #[test]
    fn snapshot_is_monotone_in_score_then_pass() {
        let store = ContenderStore::new(10);
        store.offer(contender(&[1], 0.5, 2));
        store.offer(contender(&[2], 0.9, 1));
        store.offer(contender(&[3], 0.5, 6));
        let snapshot = store.snapshot();
        for w in snapshot.windows(2) {
            let ordered = w[0].aggregate_score > w[1].aggregate_score
                || (w[0].aggregate_score == w[1].aggregate_score
                    && w[0].pass_count >= w[1].pass_count);
            assert!(ordered);
        }
    }

    #[test]
    fn duplicate_sequence_replaces_only_on_strictly_greater_score() {
        let store = ContenderStore::new(10);
        assert!(store.offer(contender(&[4], 0.6, 2)));
        assert!(!store.offer(contender(&[4], 0.6, 5)));
        assert!(!store.offer(contender(&[4], 0.5, 9)));
        assert!(store.offer(contender(&[4], 0.7, 1)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].aggregate_score, 0.7);
    }

    #[test]
    fn rejected_offers_never_beat_the_minimum() {
        let store = ContenderStore::new(2);
        store.offer(contender(&[1], 0.8, 3));
        store.offer(contender(&[2], 0.6, 3));
        // Worse than the current minimum: rejected.
        assert!(!store.offer(contender(&[3], 0.5, 9)));
        // Equal score, higher pass count: beats the minimum.
        assert!(store.offer(contender(&[4], 0.6, 4)));
        let seqs: Vec<u8> = store.snapshot().iter().map(|c| c.sequence[0]).collect();
        assert_eq!(seqs, vec![1, 4]);
    }

    #[test]
    fn concurrent_offers_respect_capacity_and_keep_the_best() {
        let store = std::sync::Arc::new(ContenderStore::new(8));
        let mut handles = Vec::new();
        for t in 0..4u8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..64u8 {
                    store.offer(contender(&[t, i], f64::from(i) / 64.0, 1));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 8);
        // Every surviving entry beats anything the eviction dropped: the
        // top scores were offered by all four threads.
        for c in &snapshot {
            assert!(c.aggregate_score >= 62.0 / 64.0);
        }
    }

    #[test]
    fn clear_empties_the_table() {
        let store = ContenderStore::new(4);
        store.offer(contender(&[1], 0.5, 1));
        store.clear();
        assert!(store.is_empty());
    }
}
