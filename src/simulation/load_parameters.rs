// src/simulation/load_parameters.rs

use std::fs::File;

use serde_yaml::from_reader;

use crate::config::{ConfigError, CosmologyInput, RunInput};

/// Loads the cosmology block from a YAML file.
pub fn load_cosmology(path: &str) -> Result<CosmologyInput, ConfigError> {
    let file = File::open(path)?;
    let input: CosmologyInput = from_reader(file)?;
    Ok(input)
}

/// Loads the run settings from a YAML file.
pub fn load_run(path: &str) -> Result<RunInput, ConfigError> {
    let file = File::open(path)?;
    let input: RunInput = from_reader(file)?;
    Ok(input)
}
