// src/models/cosmology.rs

use crate::config::CosmoParams;

/// Conversion from sqrt(sum of omega_i h^2 densities) to a Hubble rate in s^-1.
const HUBBLE_CONVERSION: f64 = 3.2407792896393e-18;
/// Photon density omega_gamma h^2 per K^4 of CMB temperature.
/// Coefficient based on 1 AU = 1.49597870691e11 m (JPL SSD).
const OGH2_PER_T0_4: f64 = 4.48162687719e-7;
/// Energy-density ratio of one neutrino species to the photons.
const NEUTRINO_PHOTON_RATIO: f64 = 0.227107317660239;

/// Hubble expansion rate in s^-1.
///
/// Sums matter, curvature, dark energy, radiation and neutrino densities.
/// Degenerate parameter sets (zero curvature, zero dark energy) need no
/// special casing: the corresponding terms simply vanish.
pub fn hubble_rate(params: &CosmoParams, z: f64) -> f64 {
    let ainv = 1.0 + z; // inverse scale factor

    let rho_matter = params.omh2 * ainv * ainv * ainv;
    let rho_curvature = params.okh2 * ainv * ainv;
    let rho_de = params.odeh2
        * ainv.powf(3.0 * (1.0 + params.w0))
        * (3.0 * params.wa * (ainv.ln() - 1.0 + 1.0 / ainv)).exp();

    let ogh2 = OGH2_PER_T0_4 * params.t0 * params.t0 * params.t0 * params.t0;
    let rho_radiation = ogh2 * ainv * ainv * ainv * ainv;
    let rho_neutrino = NEUTRINO_PHOTON_RATIO * rho_radiation * params.nnu_eff;

    let rho = rho_matter + rho_curvature + rho_de + rho_radiation + rho_neutrino;
    HUBBLE_CONVERSION * rho.sqrt()
}

/// Above this redshift the annihilation parameter sits on its high-z plateau.
const Z_ANN_PLATEAU_HIGH: f64 = 2500.0;
/// Below this redshift the annihilation parameter is frozen at its z = 30 value.
const Z_ANN_PLATEAU_LOW: f64 = 30.0;
/// Pivot (1+z) of the log-parabolic annihilation profile.
const ANN_PIVOT: f64 = 2501.0;
/// ln((1+1000)/2501)^2 — normalization of the profile at z = 1000.
const ANN_LOG_NORM: f64 = 0.838490285049671;
/// Density-squared coefficient of the annihilation channel, per omh2.
const ANN_DENSITY_COEFF: f64 = 4.827652e-18;
/// Coefficient of the decay channel:
/// (0.71e5 / Mpc_in_m)^2 * 3 c^2 / (8 pi G) * Omega_cdm-like normalization.
const DECAY_COEFF: f64 = 1.932e-10;

/// Exotic energy injection rate dE/dt/dV (J m^-3 s^-1).
///
/// Annihilation-like channel scaled by (1+z)^6 with a redshift-dependent
/// efficiency, plus a decay-like channel scaled by (1+z)^3. The breakpoints
/// and exponents are exact constants of the model; results must be
/// bit-for-bit reproducible.
pub fn energy_injection_rate(params: &CosmoParams, z: f64) -> f64 {
    let p_ann_at_z = if z > Z_ANN_PLATEAU_HIGH {
        params.p_ann * (-params.alpha_ann * ANN_LOG_NORM).exp()
    } else if z > Z_ANN_PLATEAU_LOW {
        let lg = ((1.0 + z) / ANN_PIVOT).ln();
        params.p_ann * (params.alpha_ann * (lg * lg - ANN_LOG_NORM)).exp()
    } else {
        let lg = ((1.0 + Z_ANN_PLATEAU_LOW) / ANN_PIVOT).ln();
        params.p_ann * (params.alpha_ann * (lg * lg - ANN_LOG_NORM)).exp()
    };

    let ainv = 1.0 + z;
    (params.omh2 * ANN_DENSITY_COEFF).powi(2) * ainv.powi(6) * p_ann_at_z
        + DECAY_COEFF * ainv.powi(3) * params.p_dec
}
