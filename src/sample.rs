// sample.rs - Randomly drawn, sorted cell subsets for sub-lattice statistics

use rand::Rng;

use crate::sorted;
use crate::stats::OnlineStats;

/// A fixed subset of cells observed at its own length scale.
///
/// The cell list is drawn once at construction and sorted so that the hot
/// flip path can answer "is this cell mine?" with a binary search.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Sorted cell IDs (`id = x + y * n`).
    cells: Vec<usize>,
    /// Magnetization over the sample, maintained incrementally by the flip
    /// path and recomputed by the bulk seeding operations.
    pub magnetization: f64,
    /// Running statistics of the sample magnetization across generations.
    pub stats: OnlineStats,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Membership test over the sorted cell list, O(log len).
    pub fn contains(&self, id: usize) -> bool {
        sorted::binary_search(&self.cells, &id).is_some()
    }
}

/// Sample sizes on a geometric scale from `min` to `max`:
/// `size(s) = round(min * (max/min)^(s/(count-1)))`.
///
/// A single sample degenerates to `[min]`, the `s = 0` term of the
/// progression (the exponent would otherwise divide by zero).
pub fn sample_sizes(count: usize, min: usize, max: usize) -> Vec<usize> {
    if count <= 1 {
        return vec![min; count];
    }
    let ratio = (max as f64 / min as f64).powf(1.0 / (count - 1) as f64);
    (0..count)
        .map(|s| (min as f64 * ratio.powi(s as i32)).round() as usize)
        .collect()
}

/// Draw one sample per requested size: a uniform simple random sample of
/// distinct cell IDs taken by partial Fisher-Yates over a working pool,
/// sorted ascending for the flip path's binary search.
pub fn pick_samples(rng: &mut impl Rng, n_cells: usize, sizes: &[usize]) -> Vec<Sample> {
    let mut pool: Vec<usize> = (0..n_cells).collect();
    sizes
        .iter()
        .map(|&size| {
            for (i, id) in pool.iter_mut().enumerate() {
                *id = i;
            }
            let mut cells = Vec::with_capacity(size);
            for i in 0..size {
                let x = rng.gen_range(i..n_cells);
                cells.push(pool[x]);
                pool[x] = pool[i];
            }
            sorted::quicksort(&mut cells);
            Sample {
                cells,
                magnetization: 0.0,
                stats: OnlineStats::new(),
            }
        })
        .collect()
}
