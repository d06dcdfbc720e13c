//! Doppler imaging forward model for rotating stars
//!
//! This crate synthesizes the spectrum of a rotating star from a map of its
//! surface brightness. Every surface element emits a black-body spectrum set
//! by its brightness, is Doppler shifted by its line-of-sight velocity and is
//! weighted by how much of it faces the observer. The per-element spectra form
//! a response matrix per rotation phase; the matrices of a phase sequence are
//! joined along the wavelength axis and projected against the brightness map
//! to give the observed line spectrum.

pub mod algo;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod phases;
pub mod photometry;
pub mod response;
pub mod shift;
pub mod surface;
pub mod units;

// Re-exports for easier access
pub use config::{ConfigError, ForwardModelConfig};
pub use error::{BuildStage, ElementError, ForwardModelError};
pub use geometry::{observe, projected_area, radial_velocity, SurfaceObservation, VisibilityModel};
pub use phases::{
    project, BrightnessWeighting, LineSpectrum, PhaseAggregator, PhaseSchedule, PhaseSeries,
};
pub use photometry::{PlanckLaw, RadiationConstants, TemperatureScale};
pub use response::{ResponseMatrixBuilder, WavelengthGrid, MIN_WAVELENGTH};
pub use shift::{rotational_broadening_factors, shift_spectrum};
pub use surface::{BandedSurface, StellarGeometry, StellarSurface, SurfaceCoordinate};
