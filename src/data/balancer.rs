// ============================================================
// Layer 4 — Span Table Balancers
// ============================================================
// Most windows of a long context do not contain the answer, so
// a raw span table is dominated by unanswerable rows. A model
// trained on it learns to always predict "no answer".
//
// Resampler undersamples whichever class is larger:
//
//   minority = min(#answerable, #unanswerable)
//   keep     = all minority rows
//            + ceil(ratio × minority) randomly chosen majority rows
//
// Chosen rows keep their original relative order, and the seed
// makes the choice reproducible across runs.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::annotation::SpanRecord;
use crate::domain::traits::Balancer;

/// Passes the table through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBalancing;

impl Balancer for NoBalancing {
    fn balance(
        &self,
        rows:         Vec<SpanRecord>,
        _is_positive: &dyn Fn(&SpanRecord) -> bool,
    ) -> Vec<SpanRecord> {
        rows
    }
}

/// Random undersampling of the majority class.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    /// Majority rows kept per minority row
    ratio: f64,
    seed:  u64,
}

impl Resampler {
    pub fn new(ratio: f64, seed: u64) -> Self {
        Self { ratio: ratio.max(0.0), seed }
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(1.0, 42)
    }
}

impl Balancer for Resampler {
    fn balance(
        &self,
        rows:        Vec<SpanRecord>,
        is_positive: &dyn Fn(&SpanRecord) -> bool,
    ) -> Vec<SpanRecord> {
        let flags: Vec<bool> = rows.iter().map(|r| is_positive(r)).collect();
        let positives = flags.iter().filter(|&&p| p).count();
        let negatives = flags.len() - positives;

        let minority = positives.min(negatives);
        if minority == 0 {
            tracing::warn!(
                "Span table has {} answerable and {} unanswerable rows, nothing to balance against",
                positives,
                negatives
            );
            return rows;
        }

        let majority_is_positive = positives > negatives;
        let target = ((minority as f64) * self.ratio).ceil() as usize;

        let mut majority: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, &p)| p == majority_is_positive)
            .map(|(i, _)| i)
            .collect();

        if target >= majority.len() {
            return rows;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        majority.shuffle(&mut rng);
        majority.truncate(target);

        let mut keep = vec![false; rows.len()];
        for (i, &p) in flags.iter().enumerate() {
            keep[i] = p != majority_is_positive;
        }
        for i in majority {
            keep[i] = true;
        }

        let before = rows.len();
        let kept: Vec<SpanRecord> = rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, k)| k.then_some(row))
            .collect();

        tracing::debug!(
            "Resampled span table: {} → {} rows ({} answerable, {} unanswerable before)",
            before,
            kept.len(),
            positives,
            negatives
        );

        kept
    }
}
