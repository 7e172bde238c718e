//! Ordered `(time, value)` series, one per equation component.
//!
//! A `TrajectorySet` is what the integrator, the exact solver and the global error analysis
//! hand to each other and to the outside. It is append-only while being produced and is
//! never edited afterwards: every new solve builds a fresh set.
use nalgebra::{DMatrix, DVector};

/// how many samples per component a plotting consumer gets by default
pub const DEFAULT_MAX_POINTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(t: f64, value: f64) -> Self {
        Sample { t, value }
    }
}

/// samples of one component in chronological order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Trajectory::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Trajectory {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, t: f64, value: f64) {
        self.samples.push(Sample::new(t, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, i: usize) -> Option<&Sample> {
        self.samples.get(i)
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Keeps every k-th sample, k = ceil(len / max_points), so that at most `max_points`
    /// samples remain. Used by consumers that only need a plottable subset.
    pub fn decimate(&self, max_points: usize) -> Trajectory {
        if max_points == 0 || self.samples.len() <= max_points {
            return self.clone();
        }
        let skip = self.samples.len().div_ceil(max_points);
        Trajectory {
            samples: self.samples.iter().step_by(skip).copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectorySet {
    components: Vec<Trajectory>,
}

impl TrajectorySet {
    /// set without any component - the "nothing computed" result
    pub fn empty() -> Self {
        TrajectorySet::default()
    }

    pub fn with_components(n: usize) -> Self {
        TrajectorySet {
            components: vec![Trajectory::new(); n],
        }
    }

    pub(crate) fn with_capacity(n: usize, capacity: usize) -> Self {
        TrajectorySet {
            components: (0..n).map(|_| Trajectory::with_capacity(capacity)).collect(),
        }
    }

    /// appends one time stamp worth of values, `state[j]` goes to component j
    pub(crate) fn push_state(&mut self, t: f64, state: &[f64]) {
        for (component, &value) in self.components.iter_mut().zip(state) {
            component.push(t, value);
        }
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, j: usize) -> Option<&Trajectory> {
        self.components.get(j)
    }

    pub fn components(&self) -> &[Trajectory] {
        &self.components
    }

    /// number of time stamps common to all components
    pub fn len(&self) -> usize {
        self.components.iter().map(|c| c.len()).min().unwrap_or(0)
    }

    /// true if there is no sample at all
    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|c| c.is_empty())
    }

    /// time stamps of the first component
    pub fn times(&self) -> Vec<f64> {
        self.components
            .first()
            .map(|c| c.times())
            .unwrap_or_default()
    }

    /// Flattens into one sequence ordered by time stamp and, within a time stamp, by
    /// component: c0(t0), c1(t0), c0(t1), c1(t1), ...
    pub fn interleaved(&self) -> Vec<Sample> {
        let n = self.n_components();
        let len = self.len();
        let mut flat = Vec::with_capacity(n * len);
        for i in 0..len {
            for component in &self.components {
                flat.push(component.samples[i]);
            }
        }
        flat
    }

    pub fn decimate(&self, max_points: usize) -> TrajectorySet {
        TrajectorySet {
            components: self
                .components
                .iter()
                .map(|c| c.decimate(max_points))
                .collect(),
        }
    }

    /// time column and a `len x n_components` matrix of values, the layout used for export
    pub fn to_matrix(&self) -> (DVector<f64>, DMatrix<f64>) {
        let len = self.len();
        let n = self.n_components();
        let t = DVector::from_vec(self.times().into_iter().take(len).collect());
        let y = DMatrix::from_fn(len, n, |i, j| self.components[j].samples[i].value);
        (t, y)
    }
}
