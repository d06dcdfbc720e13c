//! Numerical helpers shared by the forward model
//!
//! Grid construction and linear resampling for spectra.

pub mod interp;

pub use interp::{linspace, resample_linear, EdgeHandling, InterpError};
