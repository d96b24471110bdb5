// src/models/saha.rs
//
// Closed-form Saha ionization solutions. All temperatures in Kelvin, number
// densities in m^-3, ionization fractions normalized to the total hydrogen
// number density.

/// (2 pi m_e k / h^2)^(3/2) in m^-3 K^-3/2.
pub const SAHA_CONST: f64 = 2.414667e21;

/// Ionization energy of hydrogen over k_B (K).
pub const EION_H_K: f64 = 157_803.0;
/// Ionization energy of neutral helium over k_B (K).
pub const EION_HEI_K: f64 = 285_324.8;
/// Second ionization energy of helium over k_B (K).
pub const EION_HEII_K: f64 = 631_492.0;

/// Statistical-weight factor 2 g_HeII / g_HeI of the first helium stage.
const G_HEI: f64 = 4.0;

/// Saha right-hand side n_e n_{i+1} / n_i, normalized by nh.
fn saha_rhs(t: f64, chi_over_k: f64, g: f64, nh: f64) -> f64 {
    g * SAHA_CONST * t.powf(1.5) * (-chi_over_k / t).exp() / nh
}

/// HeII <-> HeIII Saha equilibrium at radiation temperature.
///
/// Hydrogen and the first helium stage are fully ionized in this phase.
///
/// # Returns
/// `(xe, x_heiii)`: total free-electron fraction and the doubly-ionized
/// helium fraction (per helium nucleus).
pub fn saha_he_iii(nh0: f64, t0: f64, fhe: f64, z: f64) -> (f64, f64) {
    let ainv = 1.0 + z;
    let t = t0 * ainv;
    let nh = nh0 * ainv * ainv * ainv;
    let s = saha_rhs(t, EION_HEII_K, 1.0, nh);

    // xe * x / (1 - x) = s with xe = 1 + fhe + fhe*x; the root below is the
    // cancellation-free form of the quadratic fhe*x^2 + (1+fhe+s)*x - s = 0
    let b = 1.0 + fhe + s;
    let x = 2.0 * s / (b + (b * b + 4.0 * fhe * s).sqrt());
    (1.0 + fhe + fhe * x, x)
}

/// HeI <-> HeII Saha equilibrium at radiation temperature, with hydrogen
/// fully ionized and no HeIII left.
///
/// # Returns
/// `(xe, x_heii)` with `x_heii` the singly-ionized helium fraction per
/// helium nucleus.
pub fn saha_he_ii(nh0: f64, t0: f64, fhe: f64, z: f64) -> (f64, f64) {
    let ainv = 1.0 + z;
    let t = t0 * ainv;
    let nh = nh0 * ainv * ainv * ainv;
    let s = saha_rhs(t, EION_HEI_K, G_HEI, nh);

    // (1 + fhe*x) * x = s * (1 - x)
    let b = 1.0 + s;
    let x = 2.0 * s / (b + (b * b + 4.0 * fhe * s).sqrt());
    (1.0 + fhe * x, x)
}

/// Hydrogen Saha free-electron fraction (helium neutral) at radiation
/// temperature. Stable for both the fully ionized and the frozen-out limit.
pub fn saha_xe_h(nh0: f64, t0: f64, z: f64) -> f64 {
    let ainv = 1.0 + z;
    let t = t0 * ainv;
    let nh = nh0 * ainv * ainv * ainv;
    let s = saha_rhs(t, EION_H_K, 1.0, nh);

    // xe^2 / (1 - xe) = s
    2.0 * s / (s + (s * s + 4.0 * s).sqrt())
}
