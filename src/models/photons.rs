// src/models/photons.rs

/// Number of virtual frequency bins between the Lyman lines.
pub const NVIRT: usize = 311;
/// Tracked Lyman lines: alpha, beta, gamma.
pub const NLY: usize = 3;

/// Photon-occupation history: log occupation-number departures from a
/// blackbody spectrum, per virtual frequency bin and per step, plus the
/// three Lyman-line values.
///
/// Allocated once for the whole run before the regime loop starts and owned
/// by the regime state machine; the rate provider reads and writes it only
/// through this interface. Allocation failure is fatal to the run. Written
/// forward-only: step `iz` never rewrites earlier steps.
pub struct PhotonHistory {
    nz: usize,
    /// bin-major, NVIRT x nz
    log_fminus: Vec<f64>,
    log_fminus_ly: [Vec<f64>; NLY],
}

impl PhotonHistory {
    pub fn new(nz: usize) -> Self {
        PhotonHistory {
            nz,
            log_fminus: vec![0.0; NVIRT * nz],
            log_fminus_ly: [vec![0.0; nz], vec![0.0; nz], vec![0.0; nz]],
        }
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Thermal-seeding write path: stamps blackbody-consistent values (zero
    /// departure) at step `iz`. Used while the ionization fraction is still
    /// near its Saha value and the radiation field is undistorted.
    pub fn seed_thermal(&mut self, iz: usize) {
        debug_assert!(iz < self.nz);
        for bin in 0..NVIRT {
            self.log_fminus[bin * self.nz + iz] = 0.0;
        }
        for line in self.log_fminus_ly.iter_mut() {
            line[iz] = 0.0;
        }
    }

    pub fn virt(&self, bin: usize, iz: usize) -> f64 {
        self.log_fminus[bin * self.nz + iz]
    }

    /// Evolving write path for the virtual bins, driven by the rate provider.
    pub fn set_virt(&mut self, bin: usize, iz: usize, value: f64) {
        self.log_fminus[bin * self.nz + iz] = value;
    }

    pub fn ly(&self, line: usize, iz: usize) -> f64 {
        self.log_fminus_ly[line][iz]
    }

    /// Evolving write path for the Lyman lines, driven by the rate provider.
    pub fn set_ly(&mut self, line: usize, iz: usize, value: f64) {
        self.log_fminus_ly[line][iz] = value;
    }
}
