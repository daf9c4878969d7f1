// ============================================================
// Layer 4 — Train/Validation Question Splitter
// ============================================================
// Splits question identifiers (not windows!) into a training and
// a validation subset. Splitting on windows would leak: windows
// of the same question overlap, so the validation set would
// contain tokens the model was trained on.
//
// The identifiers are shuffled with a seeded RNG first so both
// subsets get a representative mix and runs are reproducible.
// Each subset is then fed to WindowDataset as its
// `selected_questions`.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `items` with `seed` and split into (train, validation).
///
/// `train_fraction` is clamped to `[0, 1]`.
pub fn split_train_val<T>(mut items: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total    = items.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = ((total as f64) * fraction).round() as usize;

    let val = items.split_off(split_at.min(total));

    tracing::debug!(
        "Question split: {} training, {} validation",
        items.len(),
        val.len()
    );

    (items, val)
}

/// Distinct question ids in first-seen order.
pub fn distinct_questions<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.8, 1);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_subsets_are_disjoint_and_complete() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.7, 9);
        let mut all: Vec<usize> = train.iter().chain(val.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = split_train_val((0..30).collect::<Vec<u32>>(), 0.5, 77);
        let b = split_train_val((0..30).collect::<Vec<u32>>(), 0.5, 77);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let (train, val) = split_train_val(Vec::<String>::new(), 0.8, 0);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_distinct_questions_keeps_first_seen_order() {
        let ids = ["q3", "q1", "q3", "q2", "q1"];
        assert_eq!(distinct_questions(ids), vec!["q3", "q1", "q2"]);
    }
}
