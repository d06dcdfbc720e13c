//! Doppler shifting of per-element spectra.
//!
//! A source receding at velocity v emits a sample at rest wavelength lambda that
//! arrives at lambda (1 + v / c). The shifted spectrum is resampled back onto the
//! shared grid with linear interpolation; grid points the stretched spectrum no
//! longer covers take its first or last value.

use log::debug;
use thiserror::Error;

use crate::algo::{resample_linear, EdgeHandling, InterpError};
use crate::geometry::radial_velocity_at;
use crate::surface::StellarSurface;
use crate::units::{Velocity, VelocityExt, SPEED_OF_LIGHT_KM_S};

/// Radicands between this and zero are rounding noise and clamp to zero
const RADICAND_CLAMP: f64 = -1e-12;

/// Errors from spectrum resampling
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShiftError {
    #[error("Radial velocity {0} km/s is not a finite sub-light speed")]
    InvalidVelocity(f64),

    #[error("Resampling failed: {0}")]
    Interp(#[from] InterpError),
}

/// Errors from the rotational broadening diagnostic
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BroadeningError {
    #[error("Broadening factor is undefined for a pole-on star (sin i = {0})")]
    DegenerateInclination(f64),

    #[error("Broadening factor is undefined for a non-rotating star")]
    DegenerateVelocity,

    #[error("Broadening radicand for element {element} is negative ({radicand})")]
    NegativeRadicand { element: usize, radicand: f64 },

    #[error("Surface element {index} has no coordinate (surface has {len} elements)")]
    UnknownElement { index: usize, len: usize },
}

/// Wavelength scale factor 1 + v / c for a radial velocity in km/s
pub fn doppler_factor(radial_velocity_km_s: f64) -> Result<f64, ShiftError> {
    let beta = Velocity::from_kilometers_per_second(radial_velocity_km_s).as_beta();
    if !beta.is_finite() || beta.abs() >= 1.0 {
        return Err(ShiftError::InvalidVelocity(radial_velocity_km_s));
    }
    Ok(1.0 + beta)
}

/// Shift `spectrum`, sampled on `wavelengths`, by `radial_velocity_km_s` and
/// resample it onto the same grid.
///
/// Zero velocity returns the input unchanged.
pub fn shift_spectrum(
    spectrum: &[f64],
    radial_velocity_km_s: f64,
    wavelengths: &[f64],
) -> Result<Vec<f64>, ShiftError> {
    let factor = doppler_factor(radial_velocity_km_s)?;
    if spectrum.len() != wavelengths.len() {
        return Err(InterpError::MismatchedLengths.into());
    }

    let shifted_grid: Vec<f64> = wavelengths.iter().map(|w| w * factor).collect();
    Ok(resample_linear(
        &shifted_grid,
        spectrum,
        wavelengths,
        EdgeHandling::FirstLast,
    )?)
}

/// Square root of a broadening radicand, clamping rounding noise below zero
fn resolve_radicand(element: usize, radicand: f64) -> Result<f64, BroadeningError> {
    if radicand >= 0.0 {
        Ok(radicand.sqrt())
    } else if radicand >= RADICAND_CLAMP {
        debug!("Clamping broadening radicand {radicand:e} for element {element}");
        Ok(0.0)
    } else {
        Err(BroadeningError::NegativeRadicand { element, radicand })
    }
}

/// Rotational broadening scale per element at the surface's current phase:
/// sqrt(1 - l^2 / (v_e^2 sin^2 i)), with l = v_radial / c and v_e = v_eq / c.
///
/// Not part of the synthesized spectrum; reproduced for validation plots.
///
/// # Errors
///
/// * `DegenerateInclination` - sin i is zero (pole-on)
/// * `DegenerateVelocity` - the star does not rotate
/// * `NegativeRadicand` - the radicand is below zero beyond rounding noise
/// * `UnknownElement` - the surface reports no coordinate for an element
pub fn rotational_broadening_factors<S: StellarSurface + ?Sized>(
    surface: &S,
) -> Result<Vec<f64>, BroadeningError> {
    let geometry = surface.geometry();
    let sin_i = geometry.inclination_rad.sin();
    if sin_i.abs() < f64::EPSILON {
        return Err(BroadeningError::DegenerateInclination(sin_i));
    }

    let v_e = geometry.equatorial_velocity().as_beta();
    if v_e == 0.0 {
        return Err(BroadeningError::DegenerateVelocity);
    }

    let len = surface.len();
    let phase = surface.phase();
    (0..len)
        .map(|index| {
            let coord = surface
                .coordinate(index)
                .ok_or(BroadeningError::UnknownElement { index, len })?;
            let l = radial_velocity_at(&coord, geometry, phase) / SPEED_OF_LIGHT_KM_S;
            let radicand = 1.0 - (1.0 / (v_e * v_e)) * l * l * (1.0 / (sin_i * sin_i));
            resolve_radicand(index, radicand)
        })
        .collect()
}
