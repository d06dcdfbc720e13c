//! Black-body radiation law for surface elements.
//!
//! Radiance is evaluated with explicit radiation constants instead of fixed
//! SI values. At the working scale of the forward model (wavelengths of order
//! unity, temperatures of order unity) SI constants would push the exponent far
//! outside single-precision range, so the default set is the normalized one
//! with h = c = k = 1. The CGS set is available for physical-unit checks.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use super::quadrature::{integrate, QuadratureError, QuadratureTolerance};

/// Upper limit of the dimensionless variable x = hc / (lambda k T) used for
/// the bolometric integral. x^3 / (e^x - 1) is below 1e-20 past this point.
const BOLOMETRIC_X_LIMIT: f64 = 64.0;

/// Errors from radiance evaluation and integration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RadiationError {
    #[error("Wavelength must be positive and finite, got {0}")]
    InvalidWavelength(f64),

    #[error("Band width must be non-negative and finite, got {0}")]
    InvalidBandWidth(f64),

    #[error("Temperature must be positive and finite, got {0}")]
    InvalidTemperature(f64),

    #[error("Brightness must be non-negative and finite, got {0}")]
    InvalidBrightness(f64),

    #[error("Radiance integration failed: {0}")]
    Quadrature(#[from] QuadratureError),
}

/// Physical constants entering Planck's law
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiationConstants {
    /// Planck constant h
    pub planck: f64,
    /// Speed of light c
    pub speed_of_light: f64,
    /// Boltzmann constant k
    pub boltzmann: f64,
}

impl RadiationConstants {
    /// h = c = k = 1
    pub const NORMALIZED: Self = Self {
        planck: 1.0,
        speed_of_light: 1.0,
        boltzmann: 1.0,
    };

    /// CGS values: erg s, cm/s, erg/K. Wavelengths are then in cm.
    pub const CGS: Self = Self {
        planck: 6.62607015e-27,
        speed_of_light: 2.99792458e10,
        boltzmann: 1.380649e-16,
    };

    /// hc/k, the scale of the exponent in Planck's law
    pub fn second_radiation_constant(&self) -> f64 {
        self.planck * self.speed_of_light / self.boltzmann
    }

    pub fn is_valid(&self) -> bool {
        [self.planck, self.speed_of_light, self.boltzmann]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

impl Default for RadiationConstants {
    fn default() -> Self {
        Self::NORMALIZED
    }
}

/// Maps element brightness to an effective temperature: T = brightness^0.25 / sigma
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScale {
    pub sigma: f64,
}

impl Default for TemperatureScale {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl TemperatureScale {
    /// Effective temperature of an element with the given brightness.
    ///
    /// Zero brightness maps to zero temperature; callers skip those elements
    /// before integrating.
    pub fn temperature(&self, brightness: f64) -> Result<f64, RadiationError> {
        if !brightness.is_finite() || brightness < 0.0 {
            return Err(RadiationError::InvalidBrightness(brightness));
        }
        Ok(brightness.powf(0.25) / self.sigma)
    }
}

/// Planck's law with configurable constants and integration tolerance
#[derive(Debug, Clone, Default)]
pub struct PlanckLaw {
    constants: RadiationConstants,
    tolerance: QuadratureTolerance,
}

impl PlanckLaw {
    pub fn new(constants: RadiationConstants, tolerance: QuadratureTolerance) -> Self {
        Self {
            constants,
            tolerance,
        }
    }

    pub fn constants(&self) -> &RadiationConstants {
        &self.constants
    }

    pub fn tolerance(&self) -> &QuadratureTolerance {
        &self.tolerance
    }

    /// B(lambda, T) without argument checks, for use inside the integrator.
    ///
    /// Uses `exp_m1` so long wavelengths keep full precision. Short wavelengths
    /// underflow to 0 once the exponent overflows.
    #[inline]
    fn radiance(&self, wavelength: f64, temperature: f64) -> f64 {
        let c = &self.constants;
        let exponent = c.second_radiation_constant() / (wavelength * temperature);
        2.0 * c.planck * c.speed_of_light * c.speed_of_light
            / (wavelength.powi(5) * exponent.exp_m1())
    }

    /// Spectral radiance B(lambda, T) = 2hc^2 / lambda^5 / (exp(hc / (lambda k T)) - 1)
    ///
    /// # Errors
    ///
    /// `InvalidWavelength` / `InvalidTemperature` when either argument is not
    /// strictly positive and finite.
    pub fn spectral_radiance(&self, wavelength: f64, temperature: f64) -> Result<f64, RadiationError> {
        check_wavelength(wavelength)?;
        check_temperature(temperature)?;
        Ok(self.radiance(wavelength, temperature))
    }

    /// Integral of B over `[start, start + width]` at fixed temperature
    pub fn integrate_radiance(
        &self,
        start: f64,
        width: f64,
        temperature: f64,
    ) -> Result<f64, RadiationError> {
        check_wavelength(start)?;
        if !width.is_finite() || width < 0.0 {
            return Err(RadiationError::InvalidBandWidth(width));
        }
        check_temperature(temperature)?;

        let result = integrate(
            |lambda| self.radiance(lambda, temperature),
            start,
            start + width,
            &self.tolerance,
        )?;
        Ok(result.value)
    }

    /// Integral of B over all wavelengths.
    ///
    /// Substituting x = hc / (lambda k T) turns the improper integral into
    /// 2 (kT)^4 / (h^3 c^2) * int_0^inf x^3 / (e^x - 1) dx, which is evaluated
    /// on a finite range. Matches 2 pi^4 (kT)^4 / (15 h^3 c^2).
    pub fn total_radiance(&self, temperature: f64) -> Result<f64, RadiationError> {
        check_temperature(temperature)?;
        let c = &self.constants;

        let shape = integrate(
            |x: f64| {
                if x == 0.0 {
                    0.0
                } else {
                    x.powi(3) / x.exp_m1()
                }
            },
            0.0,
            BOLOMETRIC_X_LIMIT,
            &self.tolerance,
        )?;

        let kt = c.boltzmann * temperature;
        Ok(2.0 * kt.powi(4) / (c.planck.powi(3) * c.speed_of_light.powi(2)) * shape.value)
    }

    /// Closed form of [`Self::total_radiance`], used as a reference value
    pub fn stefan_boltzmann_radiance(&self, temperature: f64) -> f64 {
        let c = &self.constants;
        let kt = c.boltzmann * temperature;
        2.0 * PI.powi(4) * kt.powi(4) / (15.0 * c.planck.powi(3) * c.speed_of_light.powi(2))
    }

    /// Bolometric radiance for each (fraction, temperature) pair.
    ///
    /// Rows are fraction-major: all temperatures for `fractions[0]`, then all
    /// temperatures for `fractions[1]`, and so on. Shape is
    /// `(fractions.len() * temperatures.len(), 1)`.
    pub fn bolometric_column(
        &self,
        temperatures: &[f64],
        fractions: &[f64],
    ) -> Result<Array2<f64>, RadiationError> {
        let totals = temperatures
            .iter()
            .map(|&t| self.total_radiance(t))
            .collect::<Result<Vec<_>, _>>()?;

        let values: Array1<f64> = fractions
            .iter()
            .flat_map(|&f| totals.iter().map(move |&total| total * f))
            .collect();

        Ok(values.insert_axis(Axis(1)))
    }
}

fn check_wavelength(wavelength: f64) -> Result<(), RadiationError> {
    if wavelength.is_finite() && wavelength > 0.0 {
        Ok(())
    } else {
        Err(RadiationError::InvalidWavelength(wavelength))
    }
}

fn check_temperature(temperature: f64) -> Result<(), RadiationError> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(RadiationError::InvalidTemperature(temperature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn peak_wavelength(law: &PlanckLaw, temperature: f64) -> f64 {
        (1..2000)
            .map(|i| i as f64 * 0.0005)
            .max_by(|a, b| {
                let ra = law.spectral_radiance(*a, temperature).unwrap();
                let rb = law.spectral_radiance(*b, temperature).unwrap();
                ra.total_cmp(&rb)
            })
            .unwrap()
    }

    #[test]
    fn test_radiance_positive() {
        let law = PlanckLaw::default();
        for &t in &[0.5, 1.0, 2.0, 5.0] {
            for &lambda in &[0.05, 0.1, 0.5, 1.0, 5.0, 50.0] {
                let b = law.spectral_radiance(lambda, t).unwrap();
                assert!(b > 0.0, "B({}, {}) = {}", lambda, t, b);
            }
        }
    }

    #[test]
    fn test_normalized_formula() {
        let law = PlanckLaw::default();
        let (lambda, t): (f64, f64) = (0.3, 1.5);
        let expected = 2.0 * lambda.powi(-5) / ((1.0 / (lambda * t)).exp() - 1.0);
        assert_relative_eq!(
            law.spectral_radiance(lambda, t).unwrap(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_wien_ordering() {
        let law = PlanckLaw::default();
        let cool = peak_wavelength(&law, 1.0);
        let hot = peak_wavelength(&law, 2.0);

        // lambda_max T = hc / (4.965 k)
        assert_relative_eq!(cool, 0.2014, epsilon = 0.001);
        assert_relative_eq!(hot, 0.1007, epsilon = 0.001);
        assert!(hot < cool);
    }

    #[test]
    fn test_decreasing_past_peak() {
        let law = PlanckLaw::default();
        let t = 1.0;
        let samples: Vec<f64> = (0..200)
            .map(|i| 0.25 + i as f64 * 0.025)
            .map(|lambda| law.spectral_radiance(lambda, t).unwrap())
            .collect();
        for pair in samples.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn test_rejects_singular_arguments() {
        let law = PlanckLaw::default();
        assert_eq!(
            law.spectral_radiance(0.0, 1.0),
            Err(RadiationError::InvalidWavelength(0.0))
        );
        assert_eq!(
            law.spectral_radiance(1.0, 0.0),
            Err(RadiationError::InvalidTemperature(0.0))
        );
        assert!(matches!(
            law.spectral_radiance(f64::NAN, 1.0),
            Err(RadiationError::InvalidWavelength(_))
        ));
        assert!(matches!(
            law.integrate_radiance(0.1, -0.1, 1.0),
            Err(RadiationError::InvalidBandWidth(_))
        ));
    }

    #[test]
    fn test_integral_additivity() {
        let law = PlanckLaw::default();
        let t = 1.3;
        let whole = law.integrate_radiance(0.05, 1.0, t).unwrap();
        for split in [0.1, 0.17, 0.5, 0.9] {
            let left = law.integrate_radiance(0.05, split - 0.05, t).unwrap();
            let right = law.integrate_radiance(split, 1.05 - split, t).unwrap();
            assert_relative_eq!(whole, left + right, max_relative = 1e-7);
        }
    }

    #[test]
    fn test_narrow_band_matches_midpoint() {
        let law = PlanckLaw::default();
        let width = 1e-6;
        let integral = law.integrate_radiance(0.4, width, 1.0).unwrap();
        let midpoint = law.spectral_radiance(0.4 + width / 2.0, 1.0).unwrap() * width;
        assert_relative_eq!(integral, midpoint, max_relative = 1e-9);
    }

    #[test]
    fn test_total_radiance_matches_closed_form() {
        let law = PlanckLaw::default();
        for &t in &[0.5, 1.0, 3.0] {
            let total = law.total_radiance(t).unwrap();
            assert_relative_eq!(total, law.stefan_boltzmann_radiance(t), max_relative = 1e-7);
        }
        assert_relative_eq!(
            law.total_radiance(1.0).unwrap(),
            2.0 * PI.powi(4) / 15.0,
            max_relative = 1e-7
        );
    }

    #[test]
    fn test_total_radiance_cgs() {
        let law = PlanckLaw::new(RadiationConstants::CGS, QuadratureTolerance::default());
        // sigma_SB T^4 / pi for a 5778 K photosphere
        let sigma_sb = 5.670374419e-5;
        let expected = sigma_sb * 5778.0f64.powi(4) / PI;
        assert_relative_eq!(
            law.total_radiance(5778.0).unwrap(),
            expected,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_bolometric_column() {
        let law = PlanckLaw::default();
        let temps = [1.0, 2.0];
        let column = law.bolometric_column(&temps, &[1.0, 0.5]).unwrap();
        assert_eq!(column.dim(), (4, 1));
        let base = law.total_radiance(1.0).unwrap();
        assert_relative_eq!(column[[0, 0]], base, max_relative = 1e-12);
        assert_relative_eq!(column[[1, 0]], 16.0 * base, max_relative = 1e-7);
        assert_relative_eq!(column[[2, 0]], 0.5 * base, max_relative = 1e-12);
        assert_relative_eq!(column[[3, 0]], 8.0 * base, max_relative = 1e-7);
    }

    #[test]
    fn test_temperature_scale() {
        let scale = TemperatureScale { sigma: 2.0 };
        assert_relative_eq!(scale.temperature(16.0).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(scale.temperature(0.0).unwrap(), 0.0);
        assert!(matches!(
            scale.temperature(-1.0),
            Err(RadiationError::InvalidBrightness(_))
        ));
    }
}
