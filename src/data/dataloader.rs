use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis};
use rand::{Rng, seq::SliceRandom};

/// Iterates over the rows of a borrowed dataset in mini-batches, in a shuffled order.
#[derive(Debug, Clone)]
pub struct DataLoader<'a> {
    data: ArrayView2<'a, f32>,
    order: Vec<usize>,
    batch_size: NonZeroUsize,
    cursor: usize,
}

impl<'a> DataLoader<'a> {
    /// Creates a new `DataLoader` that yields the rows in their original order.
    ///
    /// # Arguments
    /// * `data` - The samples, one per row.
    /// * `batch_size` - The maximum amount of rows per batch.
    pub fn new(data: ArrayView2<'a, f32>, batch_size: NonZeroUsize) -> Self {
        Self {
            order: (0..data.nrows()).collect(),
            data,
            batch_size,
            cursor: 0,
        }
    }

    /// Draws a new row order and rewinds the loader.
    ///
    /// The permutation always starts from the identity, so it depends on nothing but the
    /// state of `rng`.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order
            .iter_mut()
            .enumerate()
            .for_each(|(i, idx)| *idx = i);

        self.order.shuffle(rng);
        self.cursor = 0;
    }

    /// Returns the next batch of rows, or `None` once the epoch is exhausted.
    ///
    /// The last batch of an epoch may be smaller than the batch size.
    pub fn next_batch(&mut self) -> Option<Array2<f32>> {
        if self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size.get()).min(self.order.len());
        let batch = self.data.select(Axis(0), &self.order[self.cursor..end]);

        self.cursor = end;
        Some(batch)
    }
}
