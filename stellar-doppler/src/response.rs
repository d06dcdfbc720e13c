//! Response matrix construction.
//!
//! One row per surface element, one column per wavelength sample. Each row is
//! the element's band-integrated black-body spectrum divided by its brightness,
//! Doppler shifted by the element's radial velocity and scaled by its visible
//! area. Projecting the matrix against the brightness vector gives the
//! observed spectrum for one phase.

use log::debug;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use thiserror::Error;

use crate::algo::linspace;
use crate::config::ForwardModelConfig;
use crate::error::{BuildStage, ForwardModelError};
use crate::geometry::{projected_area, radial_velocity, GeometryError, VisibilityModel};
use crate::photometry::{PlanckLaw, TemperatureScale};
use crate::shift::shift_spectrum;
use crate::surface::StellarSurface;

/// Shortest wavelength on every grid, in the working units of the radiation law
pub const MIN_WAVELENGTH: f64 = 0.01;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Wavelength grid needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("Maximum wavelength must be finite and above 0.01, got {0}")]
    InvalidMaximum(f64),
}

/// Evenly spaced wavelength samples plus the band each sample integrates over
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    samples: Vec<f64>,
    band_width: f64,
}

impl WavelengthGrid {
    /// `num_wavelengths` samples over `[MIN_WAVELENGTH, max_wavelength]`, each
    /// integrated over a band `max_wavelength / num_wavelengths` wide.
    pub fn new(num_wavelengths: usize, max_wavelength: f64) -> Result<Self, GridError> {
        if num_wavelengths < 2 {
            return Err(GridError::TooFewSamples(num_wavelengths));
        }
        if !max_wavelength.is_finite() || max_wavelength <= MIN_WAVELENGTH {
            return Err(GridError::InvalidMaximum(max_wavelength));
        }

        Ok(Self {
            samples: linspace(MIN_WAVELENGTH, max_wavelength, num_wavelengths),
            band_width: max_wavelength / num_wavelengths as f64,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn band_width(&self) -> f64 {
        self.band_width
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Builds per-phase response matrices for a surface snapshot
#[derive(Debug, Clone, Default)]
pub struct ResponseMatrixBuilder {
    law: PlanckLaw,
    temperature_scale: TemperatureScale,
    visibility: VisibilityModel,
}

impl ResponseMatrixBuilder {
    pub fn new(
        law: PlanckLaw,
        temperature_scale: TemperatureScale,
        visibility: VisibilityModel,
    ) -> Self {
        Self {
            law,
            temperature_scale,
            visibility,
        }
    }

    pub fn from_config(config: &ForwardModelConfig) -> Self {
        Self::new(
            PlanckLaw::new(config.radiation, config.quadrature),
            config.temperature_scale,
            config.visibility,
        )
    }

    pub fn law(&self) -> &PlanckLaw {
        &self.law
    }

    pub fn visibility(&self) -> VisibilityModel {
        self.visibility
    }

    /// Response matrix of shape `(surface.len(), num_wavelengths)`.
    ///
    /// # Errors
    ///
    /// * `Grid` - fewer than 2 samples or an unusable maximum wavelength
    /// * `Element` - the first failing element, with the stage that failed
    pub fn build<S: StellarSurface + Sync + ?Sized>(
        &self,
        surface: &S,
        num_wavelengths: usize,
        max_wavelength: f64,
    ) -> Result<Array2<f64>, ForwardModelError> {
        let grid = WavelengthGrid::new(num_wavelengths, max_wavelength)?;
        self.build_on_grid(surface, &grid)
    }

    /// Same as [`Self::build`] on a grid the caller already holds
    pub fn build_on_grid<S: StellarSurface + Sync + ?Sized>(
        &self,
        surface: &S,
        grid: &WavelengthGrid,
    ) -> Result<Array2<f64>, ForwardModelError> {
        debug!(
            "Building response for {} elements x {} wavelengths (band width {:.4}, phase {:.4} rad)",
            surface.len(),
            grid.len(),
            grid.band_width(),
            surface.phase()
        );

        // Rows are independent; indexed collect keeps element order
        let rows = (0..surface.len())
            .into_par_iter()
            .map(|index| self.element_row(surface, index, grid))
            .collect::<Result<Vec<_>, _>>()?;

        let mut matrix: Array2<f64> = Array2::zeros((rows.len(), grid.len()));
        for (index, row) in rows.iter().enumerate() {
            matrix.row_mut(index).assign(&ArrayView1::from(row.as_slice()));
        }
        Ok(matrix)
    }

    /// Shifted, area-weighted spectrum of one element divided by its brightness
    pub fn element_row<S: StellarSurface + ?Sized>(
        &self,
        surface: &S,
        index: usize,
        grid: &WavelengthGrid,
    ) -> Result<Vec<f64>, ForwardModelError> {
        let brightness = surface.brightness().get(index).copied().ok_or_else(|| {
            ForwardModelError::element(
                index,
                BuildStage::Temperature,
                GeometryError::UnknownElement {
                    index,
                    len: surface.len(),
                },
            )
        })?;

        // Dark elements emit nothing, and 1 / brightness is undefined
        if brightness == 0.0 {
            return Ok(vec![0.0; grid.len()]);
        }

        let temperature = self
            .temperature_scale
            .temperature(brightness)
            .map_err(|e| ForwardModelError::element(index, BuildStage::Temperature, e))?;

        let spectrum = grid
            .samples()
            .iter()
            .map(|&lambda| {
                self.law
                    .integrate_radiance(lambda, grid.band_width(), temperature)
                    .map(|flux| flux / brightness)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ForwardModelError::element(index, BuildStage::Integration, e))?;

        let velocity = radial_velocity(surface, index)
            .map_err(|e| ForwardModelError::element(index, BuildStage::RadialVelocity, e))?;

        let shifted = shift_spectrum(&spectrum, velocity, grid.samples())
            .map_err(|e| ForwardModelError::element(index, BuildStage::DopplerShift, e))?;

        let area = projected_area(surface, index, self.visibility)
            .map_err(|e| ForwardModelError::element(index, BuildStage::ProjectedArea, e))?;

        Ok(shifted.into_iter().map(|v| v * area).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::{QuadratureTolerance, RadiationConstants};
    use crate::surface::{BandedSurface, StellarGeometry};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn surface(velocity: f64, inclination: f64) -> BandedSurface {
        let geometry = StellarGeometry::new(3.4e6, velocity, inclination, 4, 24).unwrap();
        BandedSurface::uniform(geometry, 1.0).unwrap()
    }

    #[test]
    fn test_grid_layout() {
        let grid = WavelengthGrid::new(400, 5.0).unwrap();
        assert_eq!(grid.len(), 400);
        assert_eq!(grid.samples()[0], MIN_WAVELENGTH);
        assert_eq!(*grid.samples().last().unwrap(), 5.0);
        assert_relative_eq!(grid.band_width(), 5.0 / 400.0);
    }

    #[test]
    fn test_grid_rejections() {
        assert_eq!(WavelengthGrid::new(1, 5.0), Err(GridError::TooFewSamples(1)));
        assert_eq!(WavelengthGrid::new(0, 5.0), Err(GridError::TooFewSamples(0)));
        assert_eq!(
            WavelengthGrid::new(10, 0.01),
            Err(GridError::InvalidMaximum(0.01))
        );
        assert!(matches!(
            WavelengthGrid::new(10, f64::NAN),
            Err(GridError::InvalidMaximum(_))
        ));

        let builder = ResponseMatrixBuilder::default();
        assert!(matches!(
            builder.build(&surface(5.0, 1.0), 1, 5.0),
            Err(ForwardModelError::Grid(GridError::TooFewSamples(1)))
        ));
    }

    #[test]
    fn test_matrix_shape() {
        let star = surface(5.0, PI / 4.2);
        let matrix = ResponseMatrixBuilder::default().build(&star, 20, 5.0).unwrap();
        assert_eq!(matrix.dim(), (star.len(), 20));
        assert!(matrix.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_zero_brightness_rows() {
        let star = surface(5.0, PI / 2.0);
        let mut values = vec![1.0; star.len()];
        values[0] = 0.0;
        values[5] = 0.0;
        let star = star.with_brightness_values(values).unwrap();

        let builder = ResponseMatrixBuilder::default();
        for n in [2, 7, 33] {
            let matrix = builder.build(&star, n, 5.0).unwrap();
            assert!(matrix.row(0).iter().all(|&v| v == 0.0));
            assert!(matrix.row(5).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_static_star_rows_are_scaled_spectra() {
        let star = surface(0.0, PI / 2.0);
        let builder = ResponseMatrixBuilder::default();
        let grid = WavelengthGrid::new(25, 5.0).unwrap();
        let matrix = builder.build_on_grid(&star, &grid).unwrap();

        let reference: Vec<f64> = grid
            .samples()
            .iter()
            .map(|&l| builder.law().integrate_radiance(l, grid.band_width(), 1.0).unwrap())
            .collect();

        for index in 0..star.len() {
            let area = projected_area(&star, index, VisibilityModel::BackFaceCulled).unwrap();
            for (j, expected) in reference.iter().enumerate() {
                assert_relative_eq!(matrix[[index, j]], expected * area, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_brightness_normalization() {
        // Brightness 16 doubles the temperature and the row is divided by 16
        let star = surface(0.0, PI / 2.0);
        let bright = star.with_brightness_values(vec![16.0; star.len()]).unwrap();
        let builder = ResponseMatrixBuilder::default();
        let grid = WavelengthGrid::new(10, 5.0).unwrap();
        let row = builder.element_row(&bright, 2, &grid).unwrap();

        let area = projected_area(&bright, 2, VisibilityModel::BackFaceCulled).unwrap();
        let expected = builder
            .law()
            .integrate_radiance(grid.samples()[4], grid.band_width(), 2.0)
            .unwrap()
            / 16.0
            * area;
        assert_relative_eq!(row[4], expected, max_relative = 1e-12);
    }

    #[test]
    fn test_builds_are_deterministic() {
        let star = surface(40_000.0, 1.1).rotated(0.3);
        let builder = ResponseMatrixBuilder::default();
        let a = builder.build(&star, 40, 5.0).unwrap();
        let b = builder.build(&star, 40, 5.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_integration_failure_is_attributed() {
        let impossible = QuadratureTolerance {
            absolute: 0.0,
            relative: 0.0,
            max_subdivisions: 1,
        };
        let builder = ResponseMatrixBuilder::new(
            PlanckLaw::new(RadiationConstants::NORMALIZED, impossible),
            TemperatureScale::default(),
            VisibilityModel::default(),
        );
        let star = surface(5.0, 1.0);

        match builder.build(&star, 5, 5.0) {
            Err(ForwardModelError::Element { element, stage, .. }) => {
                assert_eq!(stage, BuildStage::Integration);
                assert!(element < star.len());
            }
            other => panic!("expected an element failure, got {:?}", other),
        }
    }
}
