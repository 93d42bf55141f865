//! Parameter space definitions and the normalized-coordinate utilities shared
//! by every search engine.
//!
//! Engines other than grid search work in the unit hypercube `[0, 1]^dim`;
//! [`ParameterSpace::denormalize`] maps a unit vector back to named parameter
//! values, snapping stepped dimensions onto their lattice.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{PfError, PfResult};

/// Parameter values keyed by parameter name.
pub type ParamMap = HashMap<String, f64>;

/// Number of grid intervals used for dimensions without an explicit step.
pub const DEFAULT_GRID_DIVISIONS: f64 = 10.0;

/// Minimum decimal places kept for lattice values, absorbing floating-point drift.
const LATTICE_DECIMALS: i32 = 10;

/// 2^53: beyond this every `f64` is already an integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single parameter dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Parameter name (e.g. "short_period"), unique within a space.
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Lattice spacing. `None` means a continuous dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl ParameterRange {
    pub fn continuous(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step: None,
        }
    }

    pub fn stepped(name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step: Some(step),
        }
    }

    pub fn validate(&self) -> PfResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PfError::invalid_range(&self.name, "bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(PfError::invalid_range(
                &self.name,
                format!("min ({}) must be below max ({})", self.min, self.max),
            ));
        }
        if let Some(step) = self.step {
            if !step.is_finite() || step <= 0.0 {
                return Err(PfError::invalid_range(
                    &self.name,
                    format!("step must be positive, got {step}"),
                ));
            }
            if !self.last_index(step).is_finite() {
                return Err(PfError::invalid_range(
                    &self.name,
                    format!("step {step} is too fine for the range width"),
                ));
            }
        }
        Ok(())
    }

    /// Map a value into `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width == 0.0 {
            return 0.0;
        }
        (value - self.min) / width
    }

    /// Map a unit coordinate back into the range, snapping to the lattice
    /// when a step is defined.
    pub fn denormalize(&self, unit: f64) -> f64 {
        let value = self.min + unit * (self.max - self.min);
        match self.step {
            Some(step) => self.snap(value, step),
            None => value,
        }
    }

    /// Nearest lattice point to `value`, never outside `[min, max]`.
    fn snap(&self, value: f64, step: f64) -> f64 {
        let k = ((value - self.min) / step)
            .round()
            .clamp(0.0, self.last_index(step));
        round_lattice(self.min + k * step, step).min(self.max)
    }

    /// Largest `k` with `min + k * step <= max`, as `f64`; for very fine
    /// steps it can exceed every integer index.
    fn last_index(&self, step: f64) -> f64 {
        ((self.max - self.min) / step + 1e-9).floor()
    }

    fn grid_step(&self) -> f64 {
        self.step
            .unwrap_or((self.max - self.min) / DEFAULT_GRID_DIVISIONS)
    }

    /// Number of grid values on this axis, or `None` if it cannot be indexed.
    pub fn grid_len(&self) -> Option<usize> {
        let last = self.last_index(self.grid_step());
        if !last.is_finite() || last < 0.0 || last >= usize::MAX as f64 {
            return None;
        }
        (last as usize).checked_add(1)
    }

    /// The `k`-th grid value, counting up from `min`.
    pub fn grid_value(&self, k: usize) -> f64 {
        let step = self.grid_step();
        round_lattice(self.min + k as f64 * step, step).min(self.max)
    }

    /// Candidate values for grid search, ascending. Produced lazily.
    pub fn grid_values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.grid_len().unwrap_or(usize::MAX)).map(move |k| self.grid_value(k))
    }
}

/// Round away floating-point drift at a resolution well below `step`.
///
/// Left untouched once the requested resolution is finer than `f64` can
/// represent at this magnitude.
fn round_lattice(value: f64, step: f64) -> f64 {
    let decimals =
        (6.0 - step.log10().floor()).clamp(f64::from(LATTICE_DECIMALS), 300.0) as i32;
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    if !scaled.is_finite() || scaled.abs() >= MAX_EXACT_INTEGER {
        return value;
    }
    scaled.round() / scale
}

/// The full search space: an ordered list of parameter ranges.
///
/// Dimension order fixes both the layout of normalized vectors and grid
/// iteration order (first range varies slowest).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub ranges: Vec<ParameterRange>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn from_ranges(ranges: Vec<ParameterRange>) -> Self {
        Self { ranges }
    }

    pub fn add_continuous(mut self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.ranges.push(ParameterRange::continuous(name, min, max));
        self
    }

    pub fn add_stepped(mut self, name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        self.ranges.push(ParameterRange::stepped(name, min, max, step));
        self
    }

    pub fn dimensions(&self) -> usize {
        self.ranges.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|r| r.name.as_str())
    }

    /// Reject empty spaces, duplicate names and malformed ranges.
    pub fn validate(&self) -> PfResult<()> {
        if self.ranges.is_empty() {
            return Err(PfError::EmptySpace);
        }
        let mut seen = HashSet::with_capacity(self.ranges.len());
        for range in &self.ranges {
            range.validate()?;
            if !seen.insert(range.name.as_str()) {
                return Err(PfError::DuplicateParameter {
                    name: range.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Per-dimension unit coordinates. Missing parameters map to `0`.
    pub fn normalize(&self, params: &ParamMap) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|r| params.get(&r.name).map_or(0.0, |v| r.normalize(*v)))
            .collect()
    }

    pub fn denormalize(&self, unit: &[f64]) -> ParamMap {
        self.ranges
            .iter()
            .zip(unit)
            .map(|(r, u)| (r.name.clone(), r.denormalize(*u)))
            .collect()
    }

    /// A uniform random point in `[0, 1]^dim`.
    pub fn sample_unit(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        (0..self.dimensions()).map(|_| rng.random::<f64>()).collect()
    }

    /// Total number of grid points, or `None` on overflow.
    pub fn grid_size(&self) -> Option<usize> {
        self.ranges
            .iter()
            .try_fold(1usize, |total, r| total.checked_mul(r.grid_len()?))
    }

    /// Lazily enumerate the cartesian product of every dimension's grid values.
    pub fn grid_points(&self) -> GridPoints<'_> {
        // An axis too long to index is still walked from the start; the
        // evaluation budget ends the walk long before the end.
        let axes: Vec<usize> = self
            .ranges
            .iter()
            .map(|r| r.grid_len().unwrap_or(usize::MAX))
            .collect();
        let cursor = if axes.contains(&0) {
            None
        } else {
            Some(vec![0; axes.len()])
        };
        GridPoints {
            space: self,
            axes,
            cursor,
        }
    }

    /// Materialize the full grid. Prefer [`grid_points`](Self::grid_points)
    /// for large spaces.
    pub fn generate_grid(&self) -> Vec<ParamMap> {
        self.grid_points().collect()
    }
}

/// Odometer over grid indices; the last dimension turns fastest.
#[derive(Debug, Clone)]
pub struct GridPoints<'a> {
    space: &'a ParameterSpace,
    /// Number of grid values per dimension.
    axes: Vec<usize>,
    cursor: Option<Vec<usize>>,
}

impl Iterator for GridPoints<'_> {
    type Item = ParamMap;

    fn next(&mut self) -> Option<ParamMap> {
        let indices = self.cursor.as_mut()?;
        let point: ParamMap = self
            .space
            .ranges
            .iter()
            .zip(indices.iter())
            .map(|(range, &k)| (range.name.clone(), range.grid_value(k)))
            .collect();

        let mut exhausted = true;
        for dim in (0..indices.len()).rev() {
            indices[dim] += 1;
            if indices[dim] < self.axes[dim] {
                exhausted = false;
                break;
            }
            indices[dim] = 0;
        }
        if exhausted {
            self.cursor = None;
        }

        Some(point)
    }
}
