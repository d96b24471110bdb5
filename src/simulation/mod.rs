// src/simulation/mod.rs

pub mod csv;
pub mod framework;
pub mod load_parameters;

pub use framework::{build_history, HistoryOutput, Regime};
