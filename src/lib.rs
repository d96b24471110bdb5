// src/lib.rs
//
// Recombination and thermal history of the early universe: xe(z) and Tm(z)
// from z = 8000 to z = 0 on a fixed ln(a) grid, integrated through eight
// physical regimes.

pub mod config;
pub mod math;
pub mod models;
pub mod simulation;
