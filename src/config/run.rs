// src/config/run.rs

use serde::Deserialize;

use crate::models::rates::AtomicModel;

fn default_model() -> AtomicModel {
    AtomicModel::RecFast
}

fn default_output() -> String {
    String::from("output/history.csv")
}

fn default_stride() -> usize {
    10
}

/// Run settings block as read from YAML. Every field has a default so an
/// empty file is a valid fiducial run.
#[derive(Debug, Deserialize, Clone)]
pub struct RunInput {
    /// Atomic model driving the hydrogen and helium rates.
    #[serde(default = "default_model")]
    pub model: AtomicModel,
    /// Path of the produced CSV history.
    #[serde(default = "default_output")]
    pub output: String,
    /// Every how many grid steps a row is written.
    #[serde(default = "default_stride")]
    pub stride: usize,
}

impl Default for RunInput {
    fn default() -> Self {
        RunInput {
            model: default_model(),
            output: default_output(),
            stride: default_stride(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_settings_parse_from_yaml() {
        let input: RunInput =
            serde_yaml::from_str("model: peebles\noutput: out.csv\nstride: 1\n").unwrap();
        assert_eq!(input.model, AtomicModel::Peebles);
        assert_eq!(input.output, "out.csv");
        assert_eq!(input.stride, 1);
    }

    #[test]
    fn run_settings_default_to_a_fiducial_run() {
        let input: RunInput = serde_yaml::from_str("{}").unwrap();
        assert_eq!(input.model, AtomicModel::RecFast);
        assert_eq!(input.output, "output/history.csv");
        assert_eq!(input.stride, 10);
    }

    #[test]
    fn model_names_are_lowercase() {
        for (name, model) in [
            ("peebles", AtomicModel::Peebles),
            ("recfast", AtomicModel::RecFast),
            ("emla2s2p", AtomicModel::Emla2s2p),
            ("full", AtomicModel::Full),
        ] {
            let input: RunInput = serde_yaml::from_str(&format!("model: {name}")).unwrap();
            assert_eq!(input.model, model);
        }
    }
}
