//! Stellar surface maps and geometry.
//!
//! The forward model only needs three things from a star: a brightness value
//! per surface element, the (colatitude, longitude) of each element, and the
//! fixed geometry of the body. [`StellarSurface`] captures that contract.
//! [`BandedSurface`] is the concrete map used by the CLI and the tests: the
//! sphere is cut into latitude bands and each band into longitude zones, with
//! the zone count per band proportional to the band's circumference so that
//! elements have roughly equal area.
//!
//! Rotation never mutates a map. [`StellarSurface::rotated`] returns a new
//! snapshot with the phase offset advanced, so a phase sequence can run
//! against shared, read-only maps.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;
use thiserror::Error;

use crate::units::{Velocity, VelocityExt};

/// Errors raised while constructing or editing a surface map
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Stellar radius must be positive and finite, got {0} m")]
    InvalidRadius(f64),

    #[error("Equatorial velocity must be non-negative and finite, got {0} m/s")]
    InvalidVelocity(f64),

    #[error("Inclination must lie in [0, pi], got {0} rad")]
    InvalidInclination(f64),

    #[error("Cannot tile {zone_count} zones into {num_latitudes} latitude bands")]
    InvalidTiling {
        num_latitudes: usize,
        zone_count: usize,
    },

    #[error("Brightness vector has {got} values but the surface has {expected} elements")]
    BrightnessLength { expected: usize, got: usize },

    #[error("Brightness of element {index} must be non-negative and finite, got {value}")]
    InvalidBrightness { index: usize, value: f64 },
}

/// Fixed physical description of a star
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StellarGeometry {
    /// Stellar radius in metres
    pub radius_m: f64,
    /// Rotational velocity at the equator in m/s
    pub equatorial_velocity_m_s: f64,
    /// Angle between the rotation axis and the line of sight, radians
    pub inclination_rad: f64,
    /// Number of latitude bands in the tiling
    pub num_latitudes: usize,
    /// Requested number of surface elements
    pub zone_count: usize,
}

impl StellarGeometry {
    pub fn new(
        radius_m: f64,
        equatorial_velocity_m_s: f64,
        inclination_rad: f64,
        num_latitudes: usize,
        zone_count: usize,
    ) -> Result<Self, SurfaceError> {
        let geometry = Self {
            radius_m,
            equatorial_velocity_m_s,
            inclination_rad,
            num_latitudes,
            zone_count,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(SurfaceError::InvalidRadius(self.radius_m));
        }
        if !self.equatorial_velocity_m_s.is_finite() || self.equatorial_velocity_m_s < 0.0 {
            return Err(SurfaceError::InvalidVelocity(self.equatorial_velocity_m_s));
        }
        if !(0.0..=PI).contains(&self.inclination_rad) {
            return Err(SurfaceError::InvalidInclination(self.inclination_rad));
        }
        if self.num_latitudes == 0 || self.zone_count < self.num_latitudes {
            return Err(SurfaceError::InvalidTiling {
                num_latitudes: self.num_latitudes,
                zone_count: self.zone_count,
            });
        }
        Ok(())
    }

    pub fn equatorial_velocity(&self) -> Velocity {
        Velocity::from_meters_per_second(self.equatorial_velocity_m_s)
    }

    /// Rotation rate omega = v_eq / R in rad/s
    pub fn angular_velocity(&self) -> f64 {
        self.equatorial_velocity_m_s / self.radius_m
    }
}

/// Location of a surface element, radians.
///
/// `colatitude` is the polar angle from the rotation pole: 0 at the pole the
/// angular velocity vector points out of, pi at the opposite pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCoordinate {
    pub colatitude: f64,
    pub longitude: f64,
}

impl SurfaceCoordinate {
    pub fn new(colatitude: f64, longitude: f64) -> Self {
        Self {
            colatitude,
            longitude,
        }
    }

    /// Great-circle angle to another coordinate, radians
    pub fn angular_distance(&self, other: &SurfaceCoordinate) -> f64 {
        let cos_d = self.colatitude.cos() * other.colatitude.cos()
            + self.colatitude.sin()
                * other.colatitude.sin()
                * (self.longitude - other.longitude).cos();
        cos_d.clamp(-1.0, 1.0).acos()
    }
}

/// Read-only view of a star consumed by the forward model
pub trait StellarSurface {
    /// Brightness per surface element, in element order
    fn brightness(&self) -> &[f64];

    /// Coordinate of an element, `None` for an index past the end
    fn coordinate(&self, index: usize) -> Option<SurfaceCoordinate>;

    fn geometry(&self) -> &StellarGeometry;

    /// Accumulated rotation phase, radians
    fn phase(&self) -> f64;

    /// A new snapshot advanced by `phase_step` radians. Steps are expected to
    /// be non-negative so the phase only grows.
    fn rotated(&self, phase_step: f64) -> Self
    where
        Self: Sized;

    fn len(&self) -> usize {
        self.brightness().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Latitude-band tiling of a sphere
#[derive(Debug, Clone)]
pub struct BandedSurface {
    geometry: StellarGeometry,
    band_sizes: Arc<Vec<usize>>,
    coordinates: Arc<Vec<SurfaceCoordinate>>,
    brightness: Arc<Vec<f64>>,
    phase: f64,
}

/// Zones per band, proportional to sin(colatitude) of the band centre
fn band_layout(num_latitudes: usize, zone_count: usize) -> Vec<usize> {
    let centres: Vec<f64> = (0..num_latitudes)
        .map(|k| (k as f64 + 0.5) * PI / num_latitudes as f64)
        .collect();
    let total_weight: f64 = centres.iter().map(|c| c.sin()).sum();

    centres
        .iter()
        .map(|c| {
            let share = zone_count as f64 * c.sin() / total_weight;
            (share.round() as usize).max(1)
        })
        .collect()
}

impl BandedSurface {
    /// Surface with every element set to `brightness`
    pub fn uniform(geometry: StellarGeometry, brightness: f64) -> Result<Self, SurfaceError> {
        geometry.validate()?;
        let band_sizes = band_layout(geometry.num_latitudes, geometry.zone_count);
        let count: usize = band_sizes.iter().sum();
        Self::from_layout(geometry, band_sizes, vec![brightness; count])
    }

    /// Surface with an explicit brightness per element.
    ///
    /// The vector length must match [`BandedSurface::element_count`] for the
    /// geometry.
    pub fn with_brightness(
        geometry: StellarGeometry,
        brightness: Vec<f64>,
    ) -> Result<Self, SurfaceError> {
        geometry.validate()?;
        let band_sizes = band_layout(geometry.num_latitudes, geometry.zone_count);
        Self::from_layout(geometry, band_sizes, brightness)
    }

    /// Number of elements the tiling produces for a geometry. Can differ
    /// slightly from `zone_count` because of per-band rounding.
    pub fn element_count(geometry: &StellarGeometry) -> usize {
        band_layout(geometry.num_latitudes, geometry.zone_count)
            .iter()
            .sum()
    }

    fn from_layout(
        geometry: StellarGeometry,
        band_sizes: Vec<usize>,
        brightness: Vec<f64>,
    ) -> Result<Self, SurfaceError> {
        let n_bands = band_sizes.len();
        let coordinates: Vec<SurfaceCoordinate> = band_sizes
            .iter()
            .enumerate()
            .flat_map(|(band, &zones)| {
                let colatitude = (band as f64 + 0.5) * PI / n_bands as f64;
                (0..zones).map(move |zone| {
                    let longitude = (zone as f64 + 0.5) * 2.0 * PI / zones as f64;
                    SurfaceCoordinate::new(colatitude, longitude)
                })
            })
            .collect();

        if brightness.len() != coordinates.len() {
            return Err(SurfaceError::BrightnessLength {
                expected: coordinates.len(),
                got: brightness.len(),
            });
        }
        check_brightness(&brightness)?;

        Ok(Self {
            geometry,
            band_sizes: Arc::new(band_sizes),
            coordinates: Arc::new(coordinates),
            brightness: Arc::new(brightness),
            phase: 0.0,
        })
    }

    /// Number of zones in each latitude band, pole to pole
    pub fn band_sizes(&self) -> &[usize] {
        &self.band_sizes
    }

    /// Copy of this snapshot with a different brightness vector
    pub fn with_brightness_values(&self, brightness: Vec<f64>) -> Result<Self, SurfaceError> {
        if brightness.len() != self.coordinates.len() {
            return Err(SurfaceError::BrightnessLength {
                expected: self.coordinates.len(),
                got: brightness.len(),
            });
        }
        check_brightness(&brightness)?;

        Ok(Self {
            brightness: Arc::new(brightness),
            ..self.clone()
        })
    }

    /// Paint a circular spot: every element whose centre lies within
    /// `angular_radius` of `centre` takes the value `brightness`.
    pub fn with_spot(
        &self,
        centre: SurfaceCoordinate,
        angular_radius: f64,
        brightness: f64,
    ) -> Result<Self, SurfaceError> {
        let values = self
            .coordinates
            .iter()
            .zip(self.brightness.iter())
            .map(|(coord, &current)| {
                if coord.angular_distance(&centre) <= angular_radius {
                    brightness
                } else {
                    current
                }
            })
            .collect();
        self.with_brightness_values(values)
    }
}

fn check_brightness(values: &[f64]) -> Result<(), SurfaceError> {
    match values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        Some((index, &value)) => Err(SurfaceError::InvalidBrightness { index, value }),
        None => Ok(()),
    }
}

impl StellarSurface for BandedSurface {
    fn brightness(&self) -> &[f64] {
        &self.brightness
    }

    fn coordinate(&self, index: usize) -> Option<SurfaceCoordinate> {
        self.coordinates.get(index).copied()
    }

    fn geometry(&self) -> &StellarGeometry {
        &self.geometry
    }

    fn phase(&self) -> f64 {
        self.phase
    }

    fn rotated(&self, phase_step: f64) -> Self {
        Self {
            phase: self.phase + phase_step,
            ..self.clone()
        }
    }
}
