// src/config/mod.rs

pub mod cosmology;
pub mod error;
pub mod run;

pub use cosmology::{read_cosmoparams, CosmoParams, CosmologyInput};
pub use error::ConfigError;
pub use run::RunInput;
