//! File output for forward-model runs
//!
//! CSV tables for the brightness vector, the response matrix and the line
//! spectrum, plus a PNG plot of flux against wavelength.

pub mod csv;
pub mod plot;

pub use csv::{write_brightness_csv, write_matrix_csv, write_spectrum_csv};
pub use plot::plot_spectrum;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to draw plot: {0}")]
    Plot(String),

    #[error("Nothing to plot: spectrum is empty")]
    EmptySpectrum,

    #[error("Spectrum of {len} samples does not split into phases of {samples_per_phase}")]
    PhaseLayout { len: usize, samples_per_phase: usize },
}
