// src/main.rs

use std::error::Error;
use std::io;

use recomb::config::{read_cosmoparams, ConfigError, CosmoParams, RunInput};
use recomb::models::EffectiveTwoLevel;
use recomb::simulation::csv::{setup_csv_output, write_history};
use recomb::simulation::framework::build_history;
use recomb::simulation::load_parameters::{load_cosmology, load_run};

fn main() -> Result<(), Box<dyn Error>> {
    // cosmology from YAML, or the prompt-driven reader when there is none
    let cosmo = match load_cosmology("config/cosmology.yaml") {
        Ok(input) => input,
        Err(ConfigError::Io(_)) => {
            let stdin = io::stdin();
            read_cosmoparams(&mut stdin.lock(), Some(&mut io::stdout()))?
        }
        Err(err) => return Err(err.into()),
    };
    let run = match load_run("config/run.yaml") {
        Ok(run) => run,
        Err(ConfigError::Io(_)) => RunInput::default(),
        Err(err) => return Err(err.into()),
    };
    let params = CosmoParams::from_input(cosmo);

    // full recombination and thermal history
    let rates = EffectiveTwoLevel::new(run.model);
    let history = build_history(&params, &rates);

    // CSV output
    let mut writer = setup_csv_output(&run.output)?;
    write_history(&mut writer, &params, &history, run.stride)?;

    Ok(())
}
