// ============================================================
// Layer 4 — Window Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks WindowSamples into the
// four tensors a span-prediction head trains on.
//
//   input_ids        [batch, max_length]   Int
//   attention_mask   [batch, max_length]   Int
//   start_positions  [batch]               Int
//   end_positions    [batch]               Int
//
// Every sample coming out of WindowDataset already has exactly
// max_length tokens, so stacking is a flatten plus a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::WindowSample;

/// A batch of windows ready for the forward pass.
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    pub input_ids:       Tensor<B, 2, Int>,
    pub attention_mask:  Tensor<B, 2, Int>,
    pub start_positions: Tensor<B, 1, Int>,
    pub end_positions:   Tensor<B, 1, Int>,
}

/// Holds the target device so tensors are created on it directly.
#[derive(Clone, Debug)]
pub struct WindowBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn matrix(&self, rows: &[&[u32]], width: usize) -> Tensor<B, 2, Int> {
        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|row| row.iter().map(|&x| x as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([rows.len(), width])
    }

    fn vector(&self, values: impl Iterator<Item = usize>) -> Tensor<B, 1, Int> {
        let v: Vec<i32> = values.map(|x| x as i32).collect();
        Tensor::<B, 1, Int>::from_ints(v.as_slice(), &self.device)
    }
}

impl<B: Backend> Batcher<WindowSample, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, items: Vec<WindowSample>) -> WindowBatch<B> {
        let width = items.first().map_or(0, |s| s.input_ids.len());

        let ids:  Vec<&[u32]> = items.iter().map(|s| s.input_ids.as_slice()).collect();
        let mask: Vec<&[u32]> = items.iter().map(|s| s.attention_mask.as_slice()).collect();

        WindowBatch {
            input_ids:       self.matrix(&ids, width),
            attention_mask:  self.matrix(&mask, width),
            start_positions: self.vector(items.iter().map(|s| s.start_positions)),
            end_positions:   self.vector(items.iter().map(|s| s.end_positions)),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn sample(fill: u32, start: usize, end: usize) -> WindowSample {
        WindowSample {
            input_ids:       vec![fill; 6],
            attention_mask:  vec![1, 1, 1, 1, 0, 0],
            start_positions: start,
            end_positions:   end,
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = WindowBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(7, 2, 3), sample(8, 0, 0), sample(9, 1, 1)]);

        assert_eq!(batch.input_ids.dims(), [3, 6]);
        assert_eq!(batch.attention_mask.dims(), [3, 6]);
        assert_eq!(batch.start_positions.dims(), [3]);
        assert_eq!(batch.end_positions.dims(), [3]);
    }

    #[test]
    fn test_labels_keep_sample_order() {
        let batcher = WindowBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(1, 4, 5), sample(2, 0, 0)]);

        let starts = batch.start_positions.into_data().to_vec::<i64>().unwrap();
        let ends   = batch.end_positions.into_data().to_vec::<i64>().unwrap();
        assert_eq!(starts, vec![4, 0]);
        assert_eq!(ends, vec![5, 0]);
    }
}
