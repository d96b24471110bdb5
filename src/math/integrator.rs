// src/math/integrator.rs

/// Derivative memory of the second-order predictor integrator.
///
/// One instance per evolved variable. Holds the logarithmic derivative at the
/// previous step and at the step before that, together with the redshifts
/// they were evaluated at. The integrator is only accurate because the fixed
/// step in ln(a) is small against every regime timescale; there is no
/// stability control here.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeMemory {
    pub z_prev: f64,
    pub f_prev: f64,
    pub z_prev2: f64,
    pub f_prev2: f64,
}

impl DerivativeMemory {
    /// Advances `y` by one step `dlna` given the freshly computed derivative
    /// `f_now` at redshift `z`, then rolls the memory: previous becomes
    /// two-ago, now becomes previous. The roll is part of the contract —
    /// every regime relies on it staying consistent across steps.
    ///
    /// # Arguments
    /// - `y`: current value of the evolved variable
    /// - `dlna`: fixed step in ln(scale factor)
    /// - `z`: redshift at which `f_now` was evaluated
    /// - `f_now`: dy/dlna at the current step
    ///
    /// # Returns
    /// The predicted value at the next step,
    /// `y + dlna * (1.25 * f_now - 0.25 * f_two_steps_ago)`.
    pub fn advance(&mut self, y: f64, dlna: f64, z: f64, f_now: f64) -> f64 {
        let y_next = y + dlna * (1.25 * f_now - 0.25 * self.f_prev2);
        self.z_prev2 = self.z_prev;
        self.f_prev2 = self.f_prev;
        self.z_prev = z;
        self.f_prev = f_now;
        y_next
    }

    /// Rebuilds the memory by central finite differencing of the stored
    /// history, for use when entering a new regime.
    ///
    /// The derivative's functional form changes across regime boundaries, so
    /// the memory must never be carried over from the previous regime's
    /// internal cache. Requires `iz >= 4`.
    pub fn from_history(
        history: &[f64],
        iz: usize,
        dlna: f64,
        z_at: impl Fn(usize) -> f64,
    ) -> Self {
        DerivativeMemory {
            z_prev: z_at(iz - 2),
            f_prev: (history[iz - 1] - history[iz - 3]) / (2.0 * dlna),
            z_prev2: z_at(iz - 3),
            f_prev2: (history[iz - 2] - history[iz - 4]) / (2.0 * dlna),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// The predictor formula and the memory roll, against hand values.
    #[test]
    fn advance_applies_predictor_and_rolls_memory() {
        let mut mem = DerivativeMemory {
            z_prev: 100.0,
            f_prev: 2.0,
            z_prev2: 101.0,
            f_prev2: 4.0,
        };
        let y_next = mem.advance(1.0, 0.1, 99.0, 3.0);
        // 1.0 + 0.1 * (1.25*3.0 - 0.25*4.0) = 1.0 + 0.1*2.75
        assert_relative_eq!(y_next, 1.275, epsilon = 1e-12);
        assert_eq!(mem.z_prev2, 100.0);
        assert_eq!(mem.f_prev2, 2.0);
        assert_eq!(mem.z_prev, 99.0);
        assert_eq!(mem.f_prev, 3.0);
    }

    /// Central differencing is exact for a quadratic history, so the rebuilt
    /// memory must match the analytic derivative to round-off.
    #[test]
    fn from_history_matches_analytic_derivative_on_quadratic() {
        let dlna = 8.49e-5;
        let y = |i: usize| {
            let x = i as f64 * dlna;
            0.3 + 1.7 * x - 4.2 * x * x
        };
        let dy = |i: usize| 1.7 - 8.4 * (i as f64 * dlna);
        let history: Vec<f64> = (0..10).map(y).collect();

        let mem = DerivativeMemory::from_history(&history, 8, dlna, |i| 1000.0 - i as f64);
        assert_relative_eq!(mem.f_prev, dy(6), epsilon = 1e-10);
        assert_relative_eq!(mem.f_prev2, dy(5), epsilon = 1e-10);
        assert_eq!(mem.z_prev, 994.0);
        assert_eq!(mem.z_prev2, 995.0);
    }

    /// Integrating dy/dlna = -y over many fixed steps stays well within
    /// second-order accuracy.
    #[test]
    fn predictor_tracks_exponential_decay() {
        let dlna = 1e-3;
        // memory seeded with the exact derivatives at steps 0 and 1,
        // integration starts from step 1
        let mut mem = DerivativeMemory {
            z_prev: 0.0,
            f_prev: -(-dlna as f64).exp(),
            z_prev2: 0.0,
            f_prev2: -1.0,
        };
        let mut y = (-dlna as f64).exp();
        for i in 1..1000 {
            let f_now = -y;
            y = mem.advance(y, dlna, i as f64, f_now);
        }
        let expected = (-(1000.0 * dlna) as f64).exp();
        assert_relative_eq!(y, expected, epsilon = 1e-6);
    }
}
