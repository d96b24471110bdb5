// src/config/cosmology.rs

use std::io::{BufRead, Write};

use serde::Deserialize;

use crate::config::error::ConfigError;

/// Hydrogen number density today per unit obh2, in m^-3.
const NH0_PER_OBH2: f64 = 11.223846333047;
/// Helium-to-hydrogen mass ratio entering the number-fraction conversion.
const HE_MASS_RATIO: f64 = 3.97153;

/// Redshift range and step of every run. The step is fixed in ln(a); the
/// regime switching thresholds in the driver are only valid for this value.
const ZSTART: f64 = 8000.0;
const ZEND: f64 = 0.0;
const DLNA: f64 = 8.49e-5;

/// Raw cosmology block as read from YAML.
#[derive(Debug, Deserialize, Clone)]
pub struct CosmologyInput {
    pub t0: f64,       // CMB temperature today (K)
    pub obh2: f64,     // baryon density
    pub omh2: f64,     // total matter (CDM+baryons) density
    pub okh2: f64,     // curvature
    pub odeh2: f64,    // dark energy density
    pub w0: f64,       // dark energy equation of state
    pub wa: f64,
    pub yhe: f64,      // primordial helium mass fraction
    pub nnu_eff: f64,  // effective number of neutrino species
    #[serde(default)]
    pub p_ann: f64,    // annihilation parameter
    #[serde(default)]
    pub alpha_ann: f64, // redshift slope of the annihilation parameter
    #[serde(default)]
    pub p_dec: f64,    // decay parameter
}

/// Full parameter set of a run: the nine input scalars, the injection
/// parameters, and the derived quantities. Read-only after construction.
#[derive(Debug, Clone)]
pub struct CosmoParams {
    pub t0: f64,
    pub obh2: f64,
    pub omh2: f64,
    pub okh2: f64,
    pub odeh2: f64,
    pub w0: f64,
    pub wa: f64,
    pub yhe: f64,
    pub nnu_eff: f64,
    pub p_ann: f64,
    pub alpha_ann: f64,
    pub p_dec: f64,
    /// Hydrogen number density today (m^-3).
    pub nh0: f64,
    /// Helium-to-hydrogen number ratio.
    pub fhe: f64,
    pub zstart: f64,
    pub zend: f64,
    /// Step in ln(scale factor).
    pub dlna: f64,
    /// Number of redshift steps.
    pub nz: usize,
}

impl CosmoParams {
    pub fn from_input(input: CosmologyInput) -> Self {
        let nh0 = NH0_PER_OBH2 * input.obh2 * (1.0 - input.yhe);
        let fhe = input.yhe / (1.0 - input.yhe) / HE_MASS_RATIO;
        let nz = (2.0 + ((1.0 + ZSTART) / (1.0 + ZEND)).ln() / DLNA).floor() as usize;
        CosmoParams {
            t0: input.t0,
            obh2: input.obh2,
            omh2: input.omh2,
            okh2: input.okh2,
            odeh2: input.odeh2,
            w0: input.w0,
            wa: input.wa,
            yhe: input.yhe,
            nnu_eff: input.nnu_eff,
            p_ann: input.p_ann,
            alpha_ann: input.alpha_ann,
            p_dec: input.p_dec,
            nh0,
            fhe,
            zstart: ZSTART,
            zend: ZEND,
            dlna: DLNA,
            nz,
        }
    }

    /// Redshift of step `iz`.
    pub fn z_at(&self, iz: usize) -> f64 {
        (1.0 + self.zstart) * (-self.dlna * iz as f64).exp() - 1.0
    }
}

/// Prompt strings of the sequential reader, in read order. `w0` and `wa` share
/// one prompt and are read back to back.
const PROMPTS: [&str; 8] = [
    "Enter CMB temperature today [Kelvin]: ",
    "Enter baryon density, omega_bh2: ",
    "Enter total matter (CDM+baryons) density, omega_mh2: ",
    "Enter curvature, omega_kh2: ",
    "Enter dark energy density, omega_deh2: ",
    "Enter dark energy equation of state parameters, w wa: ",
    "Enter primordial helium mass fraction, Y: ",
    "Enter effective number of neutrino species, N_nu_eff: ",
];

/// Reads the nine cosmology scalars sequentially from `input`, emitting the
/// fixed prompt string before each read when `prompt` is supplied.
///
/// # Errors
/// Malformed or missing numeric input is fatal (`ConfigError`); no recovery.
pub fn read_cosmoparams<R: BufRead, W: Write>(
    input: &mut R,
    mut prompt: Option<&mut W>,
) -> Result<CosmologyInput, ConfigError> {
    let mut scan = TokenScanner::new(input);
    let mut emit = |i: usize| -> Result<(), ConfigError> {
        if let Some(out) = prompt.as_deref_mut() {
            out.write_all(PROMPTS[i].as_bytes())?;
            out.flush()?;
        }
        Ok(())
    };

    emit(0)?;
    let t0 = scan.next_f64("t0")?;
    emit(1)?;
    let obh2 = scan.next_f64("obh2")?;
    emit(2)?;
    let omh2 = scan.next_f64("omh2")?;
    emit(3)?;
    let okh2 = scan.next_f64("okh2")?;
    emit(4)?;
    let odeh2 = scan.next_f64("odeh2")?;
    emit(5)?;
    let w0 = scan.next_f64("w0")?;
    let wa = scan.next_f64("wa")?;
    emit(6)?;
    let yhe = scan.next_f64("yhe")?;
    emit(7)?;
    let nnu_eff = scan.next_f64("nnu_eff")?;

    Ok(CosmologyInput {
        t0,
        obh2,
        omh2,
        okh2,
        odeh2,
        w0,
        wa,
        yhe,
        nnu_eff,
        p_ann: 0.0,
        alpha_ann: 0.0,
        p_dec: 0.0,
    })
}

/// Whitespace-delimited token reader over a buffered stream.
struct TokenScanner<'a, R: BufRead> {
    input: &'a mut R,
    buf: Vec<String>,
}

impl<'a, R: BufRead> TokenScanner<'a, R> {
    fn new(input: &'a mut R) -> Self {
        TokenScanner {
            input,
            buf: Vec::new(),
        }
    }

    fn next_f64(&mut self, field: &'static str) -> Result<f64, ConfigError> {
        loop {
            if let Some(token) = self.buf.pop() {
                return token
                    .parse::<f64>()
                    .map_err(|_| ConfigError::Malformed(field));
            }
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(ConfigError::Missing(field));
            }
            // tokens are consumed front to back
            self.buf = line.split_whitespace().rev().map(String::from).collect();
        }
    }
}
