//! Photometry models for the forward model
//!
//! Black-body emission of individual surface elements and the adaptive
//! quadrature used to integrate it over wavelength bands.

pub mod planck;
pub mod quadrature;

pub use planck::{PlanckLaw, RadiationConstants, RadiationError, TemperatureScale};
pub use quadrature::{integrate, QuadratureError, QuadratureResult, QuadratureTolerance};
