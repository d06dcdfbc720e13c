//! Top-level error type of the forward model.
//!
//! Leaf modules own their error enums. Builder and aggregator failures are
//! lifted into [`ForwardModelError`] together with the element, build stage and
//! phase at which they happened.

use std::fmt;
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::photometry::RadiationError;
use crate::response::GridError;
use crate::shift::ShiftError;

/// Step of the per-element pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Temperature,
    Integration,
    RadialVelocity,
    DopplerShift,
    ProjectedArea,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Temperature => "temperature",
            BuildStage::Integration => "integration",
            BuildStage::RadialVelocity => "radial velocity",
            BuildStage::DopplerShift => "Doppler shift",
            BuildStage::ProjectedArea => "projected area",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a per-element failure
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ElementError {
    #[error(transparent)]
    Radiation(#[from] RadiationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Shift(#[from] ShiftError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForwardModelError {
    #[error("Invalid wavelength grid: {0}")]
    Grid(#[from] GridError),

    #[error("Element {element} failed during {stage}: {source}")]
    Element {
        element: usize,
        stage: BuildStage,
        #[source]
        source: ElementError,
    },

    #[error("Phase {phase} failed: {source}")]
    Phase {
        phase: usize,
        #[source]
        source: Box<ForwardModelError>,
    },

    #[error("Brightness vector has {got} values but the response has {expected} rows")]
    BrightnessLength { expected: usize, got: usize },
}

impl ForwardModelError {
    pub(crate) fn element(element: usize, stage: BuildStage, source: impl Into<ElementError>) -> Self {
        ForwardModelError::Element {
            element,
            stage,
            source: source.into(),
        }
    }

    pub(crate) fn in_phase(self, phase: usize) -> Self {
        ForwardModelError::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// Index of the failing element, looking through phase wrappers
    pub fn failed_element(&self) -> Option<usize> {
        match self {
            ForwardModelError::Element { element, .. } => Some(*element),
            ForwardModelError::Phase { source, .. } => source.failed_element(),
            _ => None,
        }
    }
}
