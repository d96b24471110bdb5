// src/models/rates.rs
//
// Atomic rate provider: the interface the regime state machine integrates
// against, plus a reference implementation built from effective two-level
// recombination physics. Units: temperatures in K, number densities in m^-3,
// rates per second (helium) or per e-fold of the scale factor (hydrogen),
// injection rates in J m^-3 s^-1.

use std::f64::consts::PI;

use serde::Deserialize;

use crate::models::photons::{PhotonHistory, NVIRT};
use crate::models::saha::{saha_xe_h, EION_H_K, EION_HEI_K, SAHA_CONST};

/// Atomic model of a run, selected once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicModel {
    Peebles,
    RecFast,
    Emla2s2p,
    Full,
}

/// Hydrogen rate branch requested by the regime state machine. The branch
/// follows the regime (two-photon radiative transfer, frozen radiative
/// transfer, plainest low-z model); the `AtomicModel` stays fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrogenBranch {
    TwoPhoton,
    Mla,
    Peebles,
}

/// Instantaneous ionization derivatives for a selected atomic model.
pub trait AtomicRates {
    /// dxe/dt in s^-1 during the helium recombination era. Hydrogen is held
    /// on its Saha solution; the rate includes that solution's drift so the
    /// total `xe` remains the single evolved quantity.
    fn helium_dxedt(&self, xe: f64, nh0: f64, t0: f64, fhe: f64, h: f64, z: f64) -> f64;

    /// dxe/dlna from hydrogen recombination. The two-photon branch reads and
    /// writes the photon-occupation history at the evaluation step `iz`.
    #[allow(clippy::too_many_arguments)]
    fn hydrogen_dxedlna(
        &self,
        branch: HydrogenBranch,
        xe: f64,
        nh: f64,
        h: f64,
        tm: f64,
        tr: f64,
        z: f64,
        energy_rate: f64,
        photons: &mut PhotonHistory,
        iz: usize,
    ) -> f64;
}

/// Binding energy of H(2s) over k_B (K); chi_H / 4.
const E2S_H_K: f64 = 39_450.8;
/// H 2s -> 1s two-photon decay rate (s^-1).
const LAMBDA_2S1S_H: f64 = 8.2245809;
/// Lyman-alpha wavelength (m).
const LYA_WAVELENGTH: f64 = 1.21567e-7;
/// Hydrogen ionization energy (J), for the injection ionization channel.
const EION_H_J: f64 = 2.17872e-18;

/// Case-B recombination fit (Pequignot et al. 1991): a, b, c, d with
/// alpha_B = 1e-19 * F * a t^b / (1 + c t^d) m^3/s, t = Tm / 1e4 K.
const ALPHA_B_A: f64 = 4.309;
const ALPHA_B_B: f64 = -0.6166;
const ALPHA_B_C: f64 = 0.6703;
const ALPHA_B_D: f64 = 0.5300;
/// RecFast-style fudge factor mimicking the full multilevel cascade.
const RECFAST_FUDGE: f64 = 1.14;

/// Binding energy of He(2s) over k_B (K).
const E2S_BIND_HEI_K: f64 = 46_088.8;
/// HeI case-B recombination fit (Hummer & Storey 1998): q, p, T1, T2 with
/// alpha_He = q / (sqrt(T/T2) (1+sqrt(T/T2))^(1-p) (1+sqrt(T/T1))^(1+p)).
const HE_ALPHA_Q: f64 = 1.8029e-17;
const HE_ALPHA_P: f64 = 0.711;
const HE_ALPHA_T1: f64 = 1.30017e5;
const HE_ALPHA_T2: f64 = 3.0;
/// He 2s -> 1s two-photon decay rate (s^-1).
const LAMBDA_2S1S_HE: f64 = 51.3;
/// He 2^1P - 1^1S resonance wavelength (m) and decay rate (s^-1).
const HE_21P_WAVELENGTH: f64 = 5.843344e-8;
const A_HE_21P: f64 = 1.7989e9;
/// Ratio of the H photoionization cross-section at the He 2^1P energy to the
/// Doppler-core cross-section of the He resonance line at 6000 K
/// (1.66e-22 m^2 over 4.86e-18 m^2); scales as sqrt(T) through the Doppler
/// width.
const SIGMA_CONT_TO_LINE_6K: f64 = 3.4e-5;

/// Reference rate provider: effective two-level atoms for hydrogen and
/// helium with Sobolev escape, continuum absorption of He resonance photons
/// by neutral hydrogen, and the exotic-injection ionization channel. The
/// multilevel interpolation tables of the full code are collaborator
/// internals; `Emla2s2p` and `Full` map onto the fudged effective rate.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveTwoLevel {
    model: AtomicModel,
}

impl EffectiveTwoLevel {
    pub fn new(model: AtomicModel) -> Self {
        EffectiveTwoLevel { model }
    }

    fn fudge(&self) -> f64 {
        match self.model {
            AtomicModel::Peebles => 1.0,
            AtomicModel::RecFast | AtomicModel::Emla2s2p | AtomicModel::Full => RECFAST_FUDGE,
        }
    }

    /// Case-B recombination coefficient to excited hydrogen states (m^3/s).
    fn alpha_b(tm: f64, fudge: f64) -> f64 {
        let t4 = tm / 1e4;
        1e-19 * fudge * ALPHA_B_A * t4.powf(ALPHA_B_B) / (1.0 + ALPHA_B_C * t4.powf(ALPHA_B_D))
    }

    /// HeI case-B recombination coefficient (m^3/s).
    fn alpha_he(t: f64) -> f64 {
        let s2 = (t / HE_ALPHA_T2).sqrt();
        let s1 = (t / HE_ALPHA_T1).sqrt();
        HE_ALPHA_Q
            / (s2 * (1.0 + s2).powf(1.0 - HE_ALPHA_P) * (1.0 + s1).powf(1.0 + HE_ALPHA_P))
    }
}

impl AtomicRates for EffectiveTwoLevel {
    fn helium_dxedt(&self, xe: f64, nh0: f64, t0: f64, fhe: f64, h: f64, z: f64) -> f64 {
        let ainv = 1.0 + z;
        let tr = t0 * ainv;
        let nh = nh0 * ainv * ainv * ainv;

        let xe_saha_h = saha_xe_h(nh0, t0, z);
        let x_heii = (xe - xe_saha_h).max(0.0);
        let n_he1s = (fhe - x_heii).max(0.0) * nh;
        let n_h1s = (1.0 - xe_saha_h) * nh;

        let alpha = Self::alpha_he(tr);
        // photoionization from He(2s), detailed-balance partner of alpha
        let beta = alpha * 4.0 * SAHA_CONST * tr.powf(1.5) * (-E2S_BIND_HEI_K / tr).exp();
        // equilibrium of the net rate is the full HeI Saha balance
        let s_he = 4.0 * SAHA_CONST * tr.powf(1.5) * (-EION_HEI_K / tr).exp();

        let k_he = HE_21P_WAVELENGTH.powi(3) / (8.0 * PI * h);
        // destruction of trapped He 2^1P photons by H photoionization; this
        // drives helium recombination back toward Saha once neutral hydrogen
        // builds up
        let gamma_con = 3.0
            * A_HE_21P
            * k_he
            * n_h1s
            * SIGMA_CONT_TO_LINE_6K
            * (tr / 6000.0).sqrt();
        let c_he = (1.0 + gamma_con + k_he * LAMBDA_2S1S_HE * n_he1s)
            / (1.0 + gamma_con + k_he * (LAMBDA_2S1S_HE + beta) * n_he1s);

        let dxheii_dt = -c_he * alpha * (xe * x_heii * nh - s_he * (fhe - x_heii));

        // hydrogen stays on its Saha solution through this regime; carry its
        // drift here so total xe has a single derivative source
        let delta = 1e-4;
        let z_fwd = ainv * (-delta as f64).exp() - 1.0;
        let z_back = ainv * (delta as f64).exp() - 1.0;
        let dxsaha_dlna =
            (saha_xe_h(nh0, t0, z_fwd) - saha_xe_h(nh0, t0, z_back)) / (2.0 * delta);

        dxheii_dt + dxsaha_dlna * h
    }

    fn hydrogen_dxedlna(
        &self,
        branch: HydrogenBranch,
        xe: f64,
        nh: f64,
        h: f64,
        tm: f64,
        tr: f64,
        _z: f64,
        energy_rate: f64,
        photons: &mut PhotonHistory,
        iz: usize,
    ) -> f64 {
        let fudge = match branch {
            // terminal low-z regime always uses the plain two-level atom
            HydrogenBranch::Peebles => 1.0,
            HydrogenBranch::TwoPhoton | HydrogenBranch::Mla => self.fudge(),
        };

        let alpha = Self::alpha_b(tm, fudge);
        // photoionization from H(2s), detailed-balance partner of alpha
        let beta = alpha * SAHA_CONST * tm.powf(1.5) * (-E2S_H_K / tm).exp();
        // Boltzmann factor of the Lyman-alpha gap, at the radiation temperature
        let boltz_21 = (-(EION_H_K - E2S_H_K) / tr).exp();

        let n1s = (1.0 - xe).max(0.0) * nh;
        let k = LYA_WAVELENGTH.powi(3) / (8.0 * PI * h);
        let c = (1.0 + k * LAMBDA_2S1S_H * n1s)
            / (1.0 + k * (LAMBDA_2S1S_H + beta) * n1s);

        let mut dxedt = -c * (alpha * nh * xe * xe - beta * (1.0 - xe) * boltz_21);
        // exotic injection: (1-xe)/3 of the deposited energy goes into
        // ionizations of chi_H each
        dxedt += (1.0 - xe) / 3.0 * energy_rate / (EION_H_J * nh);

        if branch == HydrogenBranch::TwoPhoton {
            // evolving write path: record the Lyman-alpha distortion implied
            // by the net resonance suppression; higher lines and the virtual
            // bins carry no departure in this provider and are stamped thermal
            photons.set_ly(0, iz, -c.ln());
            photons.set_ly(1, iz, 0.0);
            photons.set_ly(2, iz, 0.0);
            for bin in 0..NVIRT {
                photons.set_virt(bin, iz, 0.0);
            }
        }

        dxedt / h
    }
}
