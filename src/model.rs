// model.rs - The Ising lattice and its Monte Carlo generation engine

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{ConfigError, Dynamics, FlipStrategy, ModelConfig};
use crate::sample::{pick_samples, sample_sizes, Sample};
use crate::stats::{History, OnlineStats};

/// Critical temperature of the square-lattice Ising model, 2/ln(1+sqrt(2)),
/// in units of J/k.
pub const TEMP_CRIT: f64 = 2.269_185_314_213_02;

/// A 2D Ising model on an `n x n` toroidal lattice.
///
/// One value owns the whole simulation state: spins, the optional snapshot
/// and dead-cell mask, the sample lists and every statistics accumulator.
/// Nothing is shared, so independent models may run on separate threads as
/// long as each is driven by its own RNG.
pub struct IsingModel {
    n: usize,
    n_cells: usize,
    /// Temperature in units of J/k.
    pub temperature: f64,
    pub strategy: FlipStrategy,
    pub dynamics: Dynamics,
    /// Spins, one per cell at `x + y * n`, each exactly -1 or +1.
    spins: Vec<i8>,
    /// Frozen copy of the spins, used only by [`FlipStrategy::Copy`].
    /// Allocated on first use, overwritten at the start of every such sweep.
    snapshot: Option<Vec<i8>>,
    /// Cells excluded from their neighbors' energy sums.
    dead: Option<Vec<bool>>,
    /// Visitation permutation for [`FlipStrategy::Shuffle`].
    flip_order: Vec<usize>,
    /// Completed generations. `reset_stats` leaves it alone; callers zero it
    /// between runs.
    pub cur_gen: u64,
    start_gen: u64,
    /// Sum of per-cell energies, maintained incrementally as flips land.
    pub global_energy: i64,
    /// Mean spin over the grid, maintained incrementally as flips land.
    pub global_magnetization: f64,
    /// Running statistics of the global magnetization.
    pub global_stats: OnlineStats,
    samples: Option<Vec<Sample>>,
    history: Option<History>,
}

impl IsingModel {
    /// Build a model from a configuration.
    ///
    /// Spins start uniformly +1 with energy and magnetization already
    /// consistent; call [`randomize`](Self::randomize) or
    /// [`set_magnetization`](Self::set_magnetization) to seed a run. The RNG
    /// is only consulted to draw the dead-cell mask and the sample cell
    /// lists, when configured.
    pub fn from_config(config: &ModelConfig, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        let n = config.size;
        let n_cells = n * n;
        let mut model = Self {
            n,
            n_cells,
            temperature: config.temperature,
            strategy: config.strategy,
            dynamics: config.dynamics,
            spins: vec![1; n_cells],
            snapshot: None,
            dead: None,
            flip_order: (0..n_cells).collect(),
            cur_gen: 0,
            start_gen: 1,
            global_energy: 0,
            global_magnetization: 0.0,
            global_stats: OnlineStats::new(),
            samples: None,
            history: None,
        };
        if let Some(density) = config.dead_density {
            model.activate_dead_cells();
            model.randomize_dead(density, rng);
        }
        if let Some(t) = &config.tracking {
            model.start_gen = t.start_gen;
            let sizes = sample_sizes(t.num_samples, t.sample_min, t.sample_max);
            model.samples = Some(pick_samples(rng, n_cells, &sizes));
            model.history = Some(History::new(t.window));
        }
        model.update_energy();
        model.update_magnetization();
        model.refresh_sample_magns();
        Ok(model)
    }

    /// Bare model at the given size and temperature: shuffled visitation,
    /// Metropolis dynamics, no sample tracking.
    pub fn new(size: usize, temperature: f64, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        Self::from_config(&ModelConfig::new(size, temperature), rng)
    }

    /// Grid side length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Total number of cells, `n * n`.
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Spin at `(x, y)`.
    pub fn spin(&self, x: usize, y: usize) -> i8 {
        self.spins[x + y * self.n]
    }

    /// Overwrite the spin at `(x, y)` without touching any bookkeeping.
    /// Callers resynchronize with [`update_energy`](Self::update_energy) and
    /// [`update_magnetization`](Self::update_magnetization) afterwards.
    pub fn set_spin(&mut self, x: usize, y: usize, spin: i8) {
        assert!(spin == 1 || spin == -1, "spin must be -1 or +1, got {spin}");
        self.spins[x + y * self.n] = spin;
    }

    /// Global energy divided by the number of cells.
    pub fn energy_per_site(&self) -> f64 {
        self.global_energy as f64 / self.n_cells as f64
    }

    /// Cell ID of `(x, y)`.
    pub fn cell_id(&self, x: usize, y: usize) -> usize {
        x + y * self.n
    }

    /// Coordinates of a cell ID.
    pub fn cell_coords(&self, id: usize) -> (usize, usize) {
        (id % self.n, id / self.n)
    }

    /// The tracked samples.
    ///
    /// Panics when the model was built without sample tracking.
    pub fn samples(&self) -> &[Sample] {
        self.samples.as_deref().expect("sample tracking not enabled")
    }

    /// Windowed mean and sample variance of the recent global magnetization,
    /// recomputed on demand from the history buffer.
    ///
    /// Panics when the model was built without sample tracking.
    pub fn running_stats(&self) -> (f64, f64) {
        self.history().window_stats()
    }

    /// The raw history window.
    ///
    /// Panics when the model was built without sample tracking.
    pub fn history(&self) -> &History {
        self.history.as_ref().expect("history window not configured")
    }

    // ------------------------------------------------------------------
    // Seeding and resynchronization
    // ------------------------------------------------------------------

    /// Set every spin to -1 or +1 with equal probability, then recompute the
    /// global and per-sample magnetizations. The energy is not recomputed;
    /// call [`update_energy`](Self::update_energy) before relying on it.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        for spin in &mut self.spins {
            *spin = if rng.gen_bool(0.5) { 1 } else { -1 };
        }
        self.update_magnetization();
        self.refresh_sample_magns();
    }

    /// Seed each spin +1 with probability `(target + 1) / 2`, giving an
    /// *expected* global magnetization near `target` -- not an exact one.
    /// Recomputes the global and per-sample magnetizations; the energy is
    /// left to [`update_energy`](Self::update_energy).
    ///
    /// Panics unless `target` lies in `[-1, 1]`.
    pub fn set_magnetization(&mut self, target: f64, rng: &mut impl Rng) {
        assert!(
            (-1.0..=1.0).contains(&target),
            "target magnetization {target} outside [-1, 1]"
        );
        let p = (target + 1.0) / 2.0;
        for spin in &mut self.spins {
            *spin = if rng.gen_bool(p) { 1 } else { -1 };
        }
        self.update_magnetization();
        self.refresh_sample_magns();
    }

    /// Full recomputation of the global energy from every cell, O(n²).
    /// Used for initialization and resynchronization; flips maintain the
    /// energy incrementally.
    pub fn update_energy(&mut self) {
        let mut total = 0i64;
        for y in 0..self.n {
            for x in 0..self.n {
                total += self.energy_in(&self.spins, x, y) as i64;
            }
        }
        self.global_energy = total;
    }

    /// Full recomputation of the global magnetization, O(n²).
    pub fn update_magnetization(&mut self) {
        let sum: i64 = self.spins.iter().map(|&s| s as i64).sum();
        self.global_magnetization = sum as f64 / self.n_cells as f64;
    }

    fn refresh_sample_magns(&mut self) {
        let spins = &self.spins;
        if let Some(samples) = &mut self.samples {
            for sample in samples.iter_mut() {
                let sum: i64 = sample.cells().iter().map(|&id| spins[id] as i64).sum();
                sample.magnetization = sum as f64 / sample.len() as f64;
            }
        }
    }

    // ------------------------------------------------------------------
    // Dead cells
    // ------------------------------------------------------------------

    /// Allocate (or clear) the dead-cell mask and turn exclusions on.
    /// All cells start alive.
    pub fn activate_dead_cells(&mut self) {
        match &mut self.dead {
            Some(mask) => mask.fill(false),
            None => self.dead = Some(vec![false; self.n_cells]),
        }
    }

    /// Mark each cell dead independently with probability `density`.
    ///
    /// Panics unless `density` lies in `[0, 1]` and the mask has been
    /// activated with [`activate_dead_cells`](Self::activate_dead_cells).
    pub fn randomize_dead(&mut self, density: f64, rng: &mut impl Rng) {
        assert!(
            (0.0..=1.0).contains(&density),
            "dead-cell density {density} outside [0, 1]"
        );
        let mask = self.dead.as_mut().expect("dead cells not activated");
        for cell in mask.iter_mut() {
            *cell = rng.gen_bool(density);
        }
    }

    /// Mark a single cell dead or alive.
    ///
    /// Panics unless the mask has been activated with
    /// [`activate_dead_cells`](Self::activate_dead_cells).
    pub fn set_dead(&mut self, x: usize, y: usize, dead: bool) {
        let n = self.n;
        let mask = self.dead.as_mut().expect("dead cells not activated");
        mask[x + y * n] = dead;
    }

    /// Is `(x, y)` excluded from its neighbors' energy sums?
    pub fn is_dead(&self, x: usize, y: usize) -> bool {
        self.dead
            .as_ref()
            .map_or(false, |mask| mask[x + y * self.n])
    }

    // ------------------------------------------------------------------
    // Energy model
    // ------------------------------------------------------------------

    /// Energy of cell `(x, y)`: `-s * sum of live neighbor spins` over the
    /// four lattice neighbors with toroidal wraparound. A dead neighbor
    /// contributes nothing; the cell's own deadness changes only its role as
    /// a neighbor, never its own energy.
    pub fn cell_energy(&self, x: usize, y: usize) -> i32 {
        self.energy_in(&self.spins, x, y)
    }

    fn energy_in(&self, grid: &[i8], x: usize, y: usize) -> i32 {
        let n = self.n;
        let xp = (x + 1) % n;
        let xm = (x + n - 1) % n;
        let yp = (y + 1) % n;
        let ym = (y + n - 1) % n;
        let mut neigh = 0i32;
        for (nx, ny) in [(xp, y), (xm, y), (x, yp), (x, ym)] {
            if !self.is_dead(nx, ny) {
                neigh += grid[nx + ny * n] as i32;
            }
        }
        -(grid[x + y * n] as i32) * neigh
    }

    /// Attempt to flip `(x, y)` under the active dynamics.
    ///
    /// Flipping negates the cell's energy exactly, so `dE = -2 * E_old`. On
    /// acceptance the spin, global energy, global magnetization and any
    /// affected sample magnetizations are all updated incrementally; these
    /// fields change through this path or the explicit full recomputes only.
    fn try_flip(&mut self, x: usize, y: usize, from_snapshot: bool, rng: &mut impl Rng) {
        let old_e = if from_snapshot {
            let snap = self.snapshot.as_deref().expect("snapshot not taken");
            self.energy_in(snap, x, y)
        } else {
            self.energy_in(&self.spins, x, y)
        };
        let delta_e = -2 * old_e;
        let prob = self.dynamics.acceptance(delta_e as f64, self.temperature);
        if rng.gen::<f64>() <= prob {
            let idx = x + y * self.n;
            self.spins[idx] = -self.spins[idx];
            let new_spin = self.spins[idx] as f64;
            self.global_magnetization += 2.0 * new_spin / self.n_cells as f64;
            self.global_energy += delta_e as i64;
            if let Some(samples) = &mut self.samples {
                for sample in samples.iter_mut() {
                    if sample.contains(idx) {
                        sample.magnetization += 2.0 * new_spin / sample.len() as f64;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Generations
    // ------------------------------------------------------------------

    /// Advance the lattice by one generation: one attempted flip per cell in
    /// the order the active strategy dictates, then fold the new
    /// magnetizations into the statistics once `cur_gen` has reached the
    /// configured start generation.
    ///
    /// Every strategy except [`FlipStrategy::Copy`] lets later flips in the
    /// sweep see earlier ones.
    pub fn do_generation(&mut self, rng: &mut impl Rng) {
        match self.strategy {
            FlipStrategy::Shuffle => {
                self.flip_order.shuffle(rng);
                for i in 0..self.n_cells {
                    let (x, y) = self.cell_coords(self.flip_order[i]);
                    self.try_flip(x, y, false, rng);
                }
            }
            FlipStrategy::Random => {
                for _ in 0..self.n_cells {
                    let x = rng.gen_range(0..self.n);
                    let y = rng.gen_range(0..self.n);
                    self.try_flip(x, y, false, rng);
                }
            }
            FlipStrategy::Sequential => {
                for y in 0..self.n {
                    for x in 0..self.n {
                        self.try_flip(x, y, false, rng);
                    }
                }
            }
            FlipStrategy::Peano => self.peano_sweep(rng),
            FlipStrategy::Copy => {
                match &mut self.snapshot {
                    Some(snap) => snap.copy_from_slice(&self.spins),
                    None => self.snapshot = Some(self.spins.clone()),
                }
                for y in 0..self.n {
                    for x in 0..self.n {
                        self.try_flip(x, y, true, rng);
                    }
                }
            }
        }

        self.cur_gen += 1;
        if self.cur_gen >= self.start_gen {
            self.record_stats();
        }
    }

    /// Dual-cursor boustrophedon sweep. Each cursor snakes column-first from
    /// its corner, advancing before it flips, and the two alternate until n²
    /// attempts have been made. The seed corners themselves are skipped and
    /// the paths may overlap near the seam; a generation is n² attempts, not
    /// exact coverage.
    fn peano_sweep(&mut self, rng: &mut impl Rng) {
        if self.n == 1 {
            // No room to walk; the sweep is a single attempt.
            self.try_flip(0, 0, false, rng);
            return;
        }
        let last = self.n - 1;
        let (mut x1, mut y1) = (0usize, 0usize);
        let (mut x2, mut y2) = (last, last);
        let mut d1 = 1i64;
        let mut d2 = -1i64;
        let mut first_cursor = true;
        for _ in 0..self.n_cells {
            if first_cursor {
                if (d1 == 1 && x1 == last) || (d1 == -1 && x1 == 0) {
                    y1 += 1;
                    d1 = -d1;
                } else {
                    x1 = (x1 as i64 + d1) as usize;
                }
                self.try_flip(x1, y1, false, rng);
            } else {
                if (d2 == 1 && x2 == last) || (d2 == -1 && x2 == 0) {
                    y2 -= 1;
                    d2 = -d2;
                } else {
                    x2 = (x2 as i64 + d2) as usize;
                }
                self.try_flip(x2, y2, false, rng);
            }
            first_cursor = !first_cursor;
        }
    }

    fn record_stats(&mut self) {
        self.global_stats.push(self.global_magnetization);
        if let Some(history) = &mut self.history {
            history.push(self.global_magnetization);
        }
        if let Some(samples) = &mut self.samples {
            for sample in samples.iter_mut() {
                sample.stats.push(sample.magnetization);
            }
        }
    }

    /// Zero every statistic -- global energy and magnetization, the global
    /// and per-sample accumulators, and the history window -- without
    /// reallocating storage or touching the lattice. `cur_gen` is the
    /// caller's to reset between runs.
    pub fn reset_stats(&mut self) {
        self.global_energy = 0;
        self.global_magnetization = 0.0;
        self.global_stats.reset();
        if let Some(samples) = &mut self.samples {
            for sample in samples.iter_mut() {
                sample.stats.reset();
            }
        }
        if let Some(history) = &mut self.history {
            history.reset();
        }
    }
}

impl fmt::Display for IsingModel {
    /// ASCII rendering of the grid, one `+`/`-` per cell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.n {
            for x in 0..self.n {
                if x > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", if self.spin(x, y) == 1 { '+' } else { '-' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
