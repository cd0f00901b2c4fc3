// config.rs - Simulation configuration, strategy/dynamics selection, validation

use std::error::Error;
use std::fmt;

/// Cell-visitation order used for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipStrategy {
    /// Fisher-Yates reshuffle of the full cell permutation before each sweep.
    Shuffle,
    /// n² flip attempts at uniformly random coordinates; cells may repeat or
    /// be skipped within one sweep.
    Random,
    /// Row-major traversal, top to bottom, left to right.
    Sequential,
    /// Two boustrophedon cursors walking in from opposite corners,
    /// alternating moves, to attenuate the directional bias of a plain
    /// sequential sweep.
    Peano,
    /// Snapshot the grid before the sweep; every neighbor read comes from
    /// the snapshot, approximating a simultaneous update.
    Copy,
}

/// Rule mapping an energy change to a flip-acceptance probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dynamics {
    Metropolis,
    Glauber,
}

impl Dynamics {
    /// Acceptance probability for an energy change `delta_e` at temperature
    /// `temp`.
    ///
    /// Metropolis accepts downhill moves outright and uphill moves with
    /// probability `exp(-dE/T)`; Glauber always evaluates `1/(1+exp(dE/T))`,
    /// with no branch on the sign.
    pub fn acceptance(self, delta_e: f64, temp: f64) -> f64 {
        match self {
            Dynamics::Metropolis => {
                if delta_e <= 0.0 {
                    1.0
                } else {
                    (-delta_e / temp).exp()
                }
            }
            Dynamics::Glauber => 1.0 / (1.0 + (delta_e / temp).exp()),
        }
    }
}

/// Optional sample-tracking block of a [`ModelConfig`].
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Number of samples to monitor.
    pub num_samples: usize,
    /// Smallest sample size, in cells.
    pub sample_min: usize,
    /// Largest sample size, in cells. Sizes in between follow a geometric
    /// progression.
    pub sample_max: usize,
    /// Generation at which statistics recording begins.
    pub start_gen: u64,
    /// Capacity of the running-history window.
    pub window: usize,
}

/// Everything needed to build an [`IsingModel`](crate::model::IsingModel).
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Grid side length; the lattice is `size x size`.
    pub size: usize,
    /// Temperature in units of J/k.
    pub temperature: f64,
    pub strategy: FlipStrategy,
    pub dynamics: Dynamics,
    /// Fraction of cells marked dead at construction; `None` leaves the
    /// exclusion mask off entirely.
    pub dead_density: Option<f64>,
    /// Sample tracking; `None` runs the bare model.
    pub tracking: Option<TrackingConfig>,
}

impl ModelConfig {
    /// Bare configuration: shuffled visitation, Metropolis dynamics, no dead
    /// cells, no sample tracking.
    pub fn new(size: usize, temperature: f64) -> Self {
        Self {
            size,
            temperature,
            strategy: FlipStrategy::Shuffle,
            dynamics: Dynamics::Metropolis,
            dead_density: None,
            tracking: None,
        }
    }

    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = Some(tracking);
        self
    }

    /// Reject every malformed field a setup could smuggle in. Model
    /// construction assumes a validated configuration; nothing is patched
    /// mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(ConfigError::BadTemperature(self.temperature));
        }
        if let Some(density) = self.dead_density {
            if !density.is_finite() || !(0.0..=1.0).contains(&density) {
                return Err(ConfigError::BadDeadDensity(density));
            }
        }
        if let Some(t) = &self.tracking {
            let n_cells = self.size * self.size;
            if t.num_samples == 0 {
                return Err(ConfigError::NoSamples);
            }
            if t.sample_min == 0 || t.sample_min > t.sample_max {
                return Err(ConfigError::BadSampleSizes {
                    min: t.sample_min,
                    max: t.sample_max,
                });
            }
            if t.sample_max > n_cells {
                return Err(ConfigError::SampleTooLarge {
                    max: t.sample_max,
                    n_cells,
                });
            }
            if t.window == 0 {
                return Err(ConfigError::EmptyWindow);
            }
        }
        Ok(())
    }
}

/// A configuration the model refuses to run with.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSize,
    BadTemperature(f64),
    BadDeadDensity(f64),
    NoSamples,
    BadSampleSizes { min: usize, max: usize },
    SampleTooLarge { max: usize, n_cells: usize },
    EmptyWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSize => write!(f, "grid size must be at least 1"),
            ConfigError::BadTemperature(t) => {
                write!(f, "temperature must be finite and positive, got {t}")
            }
            ConfigError::BadDeadDensity(d) => {
                write!(f, "dead-cell density must lie in [0, 1], got {d}")
            }
            ConfigError::NoSamples => {
                write!(f, "sample tracking requires at least one sample")
            }
            ConfigError::BadSampleSizes { min, max } => {
                write!(f, "sample sizes must satisfy 1 <= min <= max, got {min}..{max}")
            }
            ConfigError::SampleTooLarge { max, n_cells } => {
                write!(f, "largest sample ({max} cells) exceeds the grid ({n_cells} cells)")
            }
            ConfigError::EmptyWindow => {
                write!(f, "running-history window must hold at least one value")
            }
        }
    }
}

impl Error for ConfigError {}
