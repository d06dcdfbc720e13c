//! Type-safe physical units for the stellar geometry
//!
//! Stellar geometry is specified in SI (metres per second) while the
//! Doppler shifter works in kilometres per second. The conversions go through
//! `uom` so the scale factor lives in one place.

use uom::si::f64::Velocity as UomVelocity;
use uom::si::velocity::{kilometer_per_second, meter_per_second};

/// Type alias for rotational and radial velocities
pub type Velocity = UomVelocity;

/// Speed of light in vacuum, km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Extension trait for velocity conversions used by the Doppler model
pub trait VelocityExt {
    /// Create velocity from metres per second
    fn from_meters_per_second(m_s: f64) -> Self;

    /// Get velocity in metres per second
    fn as_meters_per_second(&self) -> f64;

    /// Create velocity from kilometres per second
    fn from_kilometers_per_second(km_s: f64) -> Self;

    /// Get velocity in kilometres per second
    fn as_kilometers_per_second(&self) -> f64;

    /// Velocity as a fraction of the speed of light
    fn as_beta(&self) -> f64;
}

impl VelocityExt for Velocity {
    fn from_meters_per_second(m_s: f64) -> Self {
        Velocity::new::<meter_per_second>(m_s)
    }

    fn as_meters_per_second(&self) -> f64 {
        self.get::<meter_per_second>()
    }

    fn from_kilometers_per_second(km_s: f64) -> Self {
        Velocity::new::<kilometer_per_second>(km_s)
    }

    fn as_kilometers_per_second(&self) -> f64 {
        self.get::<kilometer_per_second>()
    }

    fn as_beta(&self) -> f64 {
        self.as_kilometers_per_second() / SPEED_OF_LIGHT_KM_S
    }
}
