/// Shared "decayed to numerical noise" policy.
///
/// The same `decay` threshold stops the implicit integrator (every component of the state
/// is at or below it) and truncates the global error scan (either the numerical or the
/// exact value is at or below it). `snap` is the much smaller level below which a closed-form
/// value is replaced by an exact zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFloor {
    pub decay: f64,
    pub snap: f64,
}

pub const DEFAULT_DECAY_THRESHOLD: f64 = 1e-9;
pub const DEFAULT_SNAP_THRESHOLD: f64 = 1e-15;

impl Default for NoiseFloor {
    fn default() -> Self {
        NoiseFloor {
            decay: DEFAULT_DECAY_THRESHOLD,
            snap: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

impl NoiseFloor {
    pub fn new(decay: f64, snap: f64) -> Self {
        NoiseFloor { decay, snap }
    }

    pub fn with_decay(decay: f64) -> Self {
        NoiseFloor {
            decay,
            ..NoiseFloor::default()
        }
    }

    /// true if |value| <= decay threshold
    pub fn is_noise(&self, value: f64) -> bool {
        value.abs() <= self.decay
    }

    /// true if every component is noise. An empty state is not considered decayed.
    pub fn is_decayed(&self, state: &[f64]) -> bool {
        !state.is_empty() && state.iter().all(|&y| self.is_noise(y))
    }

    pub fn snap(&self, value: f64) -> f64 {
        if value.abs() < self.snap { 0.0 } else { value }
    }
}
