//! Geometry kernel: where a surface element is, how fast it moves along the
//! line of sight, and how much of it the observer sees.
//!
//! Frame: z is the rotation axis, the observer looks along
//! n = (0, sin i, cos i). Element positions use the polar angle from the pole
//! (colatitude) and the tiling longitude advanced by the snapshot's rotation
//! phase, so velocity and visibility are always evaluated in the same frame.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::surface::{StellarGeometry, StellarSurface, SurfaceCoordinate};
use crate::units::{Velocity, VelocityExt};

/// Errors from per-element geometry queries
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Surface element {index} does not exist (surface has {len} elements)")]
    UnknownElement { index: usize, len: usize },
}

/// How the projected-area factor treats elements on the far hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityModel {
    /// Foreshortening factor d for d > 0, zero for elements facing away
    #[default]
    BackFaceCulled,
    /// |d| whenever d >= -1. Every element passes the guard, so far-side
    /// elements contribute as if they faced the observer.
    Literal,
}

/// Everything the builder needs to know about one element at one phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceObservation {
    /// Position relative to the stellar centre, metres
    pub position: Vector3<f64>,
    /// Line-of-sight velocity in km/s, positive when receding
    pub radial_velocity_km_s: f64,
    /// Visible, foreshortened area fraction in [0, 1]
    pub projected_area: f64,
}

/// Unit line-of-sight vector for an inclination
pub fn line_of_sight(inclination: f64) -> Vector3<f64> {
    Vector3::new(0.0, inclination.sin(), inclination.cos())
}

/// Position R (sin th cos ph, sin th sin ph, cos th) of a coordinate at zero phase
pub fn surface_position(coord: &SurfaceCoordinate, radius: f64) -> Vector3<f64> {
    let (sin_t, cos_t) = coord.colatitude.sin_cos();
    let (sin_p, cos_p) = coord.longitude.sin_cos();
    Vector3::new(sin_t * cos_p, sin_t * sin_p, cos_t) * radius
}

fn at_phase(coord: &SurfaceCoordinate, phase: f64) -> SurfaceCoordinate {
    SurfaceCoordinate::new(coord.colatitude, coord.longitude + phase)
}

/// Radial velocity of a coordinate in km/s at a rotation phase: -(omega x p) . n
/// with p taken at longitude ph + phase.
///
/// Velocities in the geometry are m/s; the result is converted to km/s for
/// the Doppler shifter.
pub fn radial_velocity_at(
    coord: &SurfaceCoordinate,
    geometry: &StellarGeometry,
    phase: f64,
) -> f64 {
    let omega = Vector3::new(0.0, 0.0, geometry.angular_velocity());
    let position = surface_position(&at_phase(coord, phase), geometry.radius_m);
    let n = line_of_sight(geometry.inclination_rad);

    let v_m_s = -omega.cross(&position).dot(&n);
    Velocity::from_meters_per_second(v_m_s).as_kilometers_per_second()
}

/// Projected-area factor of a coordinate at a rotation phase.
///
/// d = sin th sin(ph + phase) sin i + cos th cos i
pub fn projected_area_at(
    coord: &SurfaceCoordinate,
    inclination: f64,
    phase: f64,
    model: VisibilityModel,
) -> f64 {
    let (sin_i, cos_i) = inclination.sin_cos();
    let d = coord.colatitude.sin() * (coord.longitude + phase).sin() * sin_i
        + coord.colatitude.cos() * cos_i;

    let factor = match model {
        VisibilityModel::BackFaceCulled if d > 0.0 => d,
        VisibilityModel::BackFaceCulled => 0.0,
        VisibilityModel::Literal if d >= -1.0 => d.abs(),
        VisibilityModel::Literal => 0.0,
    };
    factor.min(1.0)
}

fn element<S: StellarSurface + ?Sized>(
    surface: &S,
    index: usize,
) -> Result<SurfaceCoordinate, GeometryError> {
    surface
        .coordinate(index)
        .ok_or(GeometryError::UnknownElement {
            index,
            len: surface.len(),
        })
}

/// Radial velocity of element `index` at the surface's current phase, km/s
pub fn radial_velocity<S: StellarSurface + ?Sized>(
    surface: &S,
    index: usize,
) -> Result<f64, GeometryError> {
    let coord = element(surface, index)?;
    Ok(radial_velocity_at(&coord, surface.geometry(), surface.phase()))
}

/// Projected-area factor of element `index` at the surface's current phase
pub fn projected_area<S: StellarSurface + ?Sized>(
    surface: &S,
    index: usize,
    model: VisibilityModel,
) -> Result<f64, GeometryError> {
    let coord = element(surface, index)?;
    Ok(projected_area_at(
        &coord,
        surface.geometry().inclination_rad,
        surface.phase(),
        model,
    ))
}

/// Position, radial velocity and visibility of element `index`
pub fn observe<S: StellarSurface + ?Sized>(
    surface: &S,
    index: usize,
    model: VisibilityModel,
) -> Result<SurfaceObservation, GeometryError> {
    let coord = element(surface, index)?;
    let geometry = surface.geometry();
    let phase = surface.phase();
    Ok(SurfaceObservation {
        position: surface_position(&at_phase(&coord, phase), geometry.radius_m),
        radial_velocity_km_s: radial_velocity_at(&coord, geometry, phase),
        projected_area: projected_area_at(
            &coord,
            geometry.inclination_rad,
            phase,
            model,
        ),
    })
}
