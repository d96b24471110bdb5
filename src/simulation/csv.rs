// src/simulation/csv.rs

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::CosmoParams;
use crate::simulation::framework::HistoryOutput;

/// Opens the output file (creating its directory if needed) and writes the
/// header.
pub fn setup_csv_output(path: &str) -> Result<Box<dyn Write>, Box<dyn Error>> {
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let output_file = File::create(path)?;
    let mut writer = BufWriter::new(output_file);
    write_csv_header(&mut writer)?;
    Ok(Box::new(writer))
}

pub fn write_csv_header<W: Write>(writer: &mut W) -> Result<(), std::io::Error> {
    writer.write_all(b"z,xe,Tm(K)\n")
}

/// One output row.
pub fn create_csv_row(z: f64, xe: f64, tm: f64) -> String {
    format!("{:.2},{:.8e},{:.8e}\n", z, xe, tm)
}

/// Streams the history to `writer`, one row every `stride` grid steps. The
/// final step is always written so the output ends at z = zend.
pub fn write_history<W: Write>(
    writer: &mut W,
    params: &CosmoParams,
    history: &HistoryOutput,
    stride: usize,
) -> Result<(), std::io::Error> {
    let stride = stride.max(1);
    let last = params.nz - 1;
    for iz in (0..params.nz).step_by(stride) {
        let row = create_csv_row(params.z_at(iz), history.xe[iz], history.tm[iz]);
        writer.write_all(row.as_bytes())?;
    }
    if last % stride != 0 {
        let row = create_csv_row(params.z_at(last), history.xe[last], history.tm[last]);
        writer.write_all(row.as_bytes())?;
    }
    writer.flush()
}
