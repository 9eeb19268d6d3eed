//! Per-worker execution contexts and the pool that recycles them.

use parking_lot::Mutex;
use seqtune_analyzer::MetricAnalyzer;
use seqtune_cipher::Cipher;
use seqtune_types::InputProfile;

use crate::evaluate::{evaluate, Outcome};

/// Everything one worker needs to evaluate candidates: a keyed cipher, the
/// one-bit-off variant for the key-dependency pass, an analyzer, and the
/// per-thread optimizer state BTR relies on.
pub struct ExecutionContext {
    cipher: Cipher,
    keydep_cipher: Cipher,
    analyzer: MetricAnalyzer,
    /// Best score this context has seen in its current assignment.
    pub thread_best: f64,
    /// Consecutive iterations without improvement.
    pub no_progress: u32,
}

impl ExecutionContext {
    #[must_use]
    pub fn new(session_key: [u8; 32]) -> Self {
        let cipher = Cipher::new(session_key);
        let keydep_cipher = cipher.with_flipped_key_bit(0);
        Self {
            cipher,
            keydep_cipher,
            analyzer: MetricAnalyzer::new(),
            thread_best: 0.0,
            no_progress: 0,
        }
    }

    /// Evaluate one profile against the input block.
    pub fn evaluate(&self, profile: &InputProfile, input: &[u8]) -> Outcome {
        evaluate(
            &self.cipher,
            &self.keydep_cipher,
            &self.analyzer,
            profile,
            input,
        )
    }

    fn reset(&mut self) {
        self.thread_best = 0.0;
        self.no_progress = 0;
    }
}

/// Unbounded pool of execution contexts.
///
/// `rent` pops a recycled context (reset) or builds a fresh one; `give_back`
/// returns it. Prewarming at core entry builds the whole worker set up
/// front so the first permutations are not taxed with construction cost.
pub struct EnvPool {
    session_key: [u8; 32],
    contexts: Mutex<Vec<ExecutionContext>>,
}

impl EnvPool {
    #[must_use]
    pub fn new(session_key: [u8; 32]) -> Self {
        Self {
            session_key,
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Build `n` contexts ahead of demand.
    pub fn prewarm(&self, n: usize) {
        let mut contexts = self.contexts.lock();
        while contexts.len() < n {
            contexts.push(ExecutionContext::new(self.session_key));
        }
    }

    pub fn rent(&self) -> ExecutionContext {
        let recycled = self.contexts.lock().pop();
        match recycled {
            Some(mut ctx) => {
                ctx.reset();
                ctx
            }
            None => ExecutionContext::new(self.session_key),
        }
    }

    pub fn give_back(&self, ctx: ExecutionContext) {
        self.contexts.lock().push(ctx);
    }

    #[must_use]
    pub fn idle(&self) -> usize {
        self.contexts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prewarm_builds_contexts_once() {
        let pool = EnvPool::new([1u8; 32]);
        pool.prewarm(4);
        assert_eq!(pool.idle(), 4);
        pool.prewarm(2);
        assert_eq!(pool.idle(), 4);
    }

    #[test]
    fn rent_resets_optimizer_state() {
        let pool = EnvPool::new([1u8; 32]);
        let mut ctx = pool.rent();
        ctx.thread_best = 0.9;
        ctx.no_progress = 5;
        pool.give_back(ctx);
        let ctx = pool.rent();
        assert_eq!(ctx.thread_best, 0.0);
        assert_eq!(ctx.no_progress, 0);
    }

    #[test]
    fn rent_beyond_the_pool_creates_fresh_contexts() {
        let pool = EnvPool::new([1u8; 32]);
        let a = pool.rent();
        let b = pool.rent();
        pool.give_back(a);
        pool.give_back(b);
        assert_eq!(pool.idle(), 2);
    }
}
