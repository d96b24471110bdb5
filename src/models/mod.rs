// src/models/mod.rs

pub mod cosmology;
pub mod photons;
pub mod rates;
pub mod saha;
pub mod thermal;

pub use photons::PhotonHistory;
pub use rates::{AtomicModel, AtomicRates, EffectiveTwoLevel, HydrogenBranch};
