use std::num::NonZeroUsize;

use ndarray::{Array2, Axis};
use rand::Rng;
use rand::seq::SliceRandom;

use super::dataset::GroupedDataset;

/// How a batch source orders its instances between epoch passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Full reshuffle at the start of every epoch pass.
    Shuffled,
    /// Fixed flattening order on every pass, for reproducible metrics.
    Sequential,
}

/// An iterable batching strategy over a flattened subset of groups.
///
/// Batches have exactly `batch_size` rows except possibly the last,
/// which may be shorter.
#[derive(Debug, Clone)]
pub struct BatchSource {
    xs: Array2<f32>,
    ys: Array2<f32>,
    order: Vec<usize>,
    batch_size: NonZeroUsize,
    mode: BatchMode,
}

impl BatchSource {
    /// Wraps pre-flattened instance matrices.
    ///
    /// # Panics
    /// - if `xs` and `ys` disagree on the number of rows
    pub fn new(xs: Array2<f32>, ys: Array2<f32>, batch_size: NonZeroUsize, mode: BatchMode) -> Self {
        assert_eq!(
            xs.nrows(),
            ys.nrows(),
            "xs and ys must have the same number of rows"
        );

        let order = (0..xs.nrows()).collect();
        Self {
            xs,
            ys,
            order,
            batch_size,
            mode,
        }
    }

    /// Flattens the groups selected by `indices` and wraps them.
    pub fn from_subset(
        dataset: &GroupedDataset,
        indices: &[usize],
        batch_size: NonZeroUsize,
        mode: BatchMode,
    ) -> Self {
        let (xs, ys) = dataset.flatten(indices);
        Self::new(xs, ys, batch_size, mode)
    }

    /// Number of instances in the source.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.nrows() == 0
    }

    /// Number of batches one pass yields.
    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size.get())
    }

    #[inline]
    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Starts a new epoch pass. In `Shuffled` mode this redraws the
    /// instance order from `rng`; in `Sequential` mode it is a no-op.
    pub fn begin_epoch<R: Rng>(&mut self, rng: &mut R) {
        if self.mode == BatchMode::Shuffled {
            self.order.shuffle(rng);
        }
    }

    /// Returns one pass over the current instance order.
    pub fn batches(&self) -> Batches<'_> {
        Batches {
            source: self,
            cursor: 0,
        }
    }
}

/// One pass of batches over a [`BatchSource`].
pub struct Batches<'a> {
    source: &'a BatchSource,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = (Array2<f32>, Array2<f32>);

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.source;
        if self.cursor >= src.order.len() {
            return None;
        }

        let end = (self.cursor + src.batch_size.get()).min(src.order.len());
        let rows = &src.order[self.cursor..end];
        self.cursor = end;

        Some((
            src.xs.select(Axis(0), rows),
            src.ys.select(Axis(0), rows),
        ))
    }
}
