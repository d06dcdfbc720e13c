//! Phase aggregation.
//!
//! Steps the star through a rotation schedule, builds a response matrix per
//! phase and lays the matrices side by side along the wavelength axis. The
//! observed line spectrum is the transpose of that wide matrix applied to the
//! brightness vector.

use log::info;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::ForwardModelError;
use crate::response::{ResponseMatrixBuilder, WavelengthGrid};
use crate::surface::StellarSurface;

/// Number of phases and the rotation applied before each one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSchedule {
    pub count: usize,
    /// Phase advance per step, radians
    pub step: f64,
}

impl PhaseSchedule {
    pub fn new(count: usize, step: f64) -> Self {
        Self { count, step }
    }

    /// `count` evenly spaced phases covering one full rotation
    pub fn full_rotation(count: usize) -> Self {
        let step = if count == 0 {
            0.0
        } else {
            2.0 * PI / count as f64
        };
        Self { count, step }
    }
}

/// Which brightness vector weights the concatenated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessWeighting {
    /// Snapshot after the last rotation step
    #[default]
    Final,
    /// Snapshot passed in by the caller, before any rotation
    Initial,
    /// Each phase block weighted by its own snapshot
    PerPhase,
}

/// Observed flux per (phase, wavelength) sample, phase-major
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpectrum {
    pub wavelengths: Vec<f64>,
    pub flux: Vec<f64>,
}

impl LineSpectrum {
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// (wavelength, flux) pairs in output order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths.iter().copied().zip(self.flux.iter().copied())
    }

    /// Flux of phase `phase` given `samples_per_phase` wavelengths per block
    pub fn phase_block(&self, phase: usize, samples_per_phase: usize) -> Option<&[f64]> {
        let start = phase.checked_mul(samples_per_phase)?;
        self.flux.get(start..start.checked_add(samples_per_phase)?)
    }
}

/// Output of a full phase run
#[derive(Debug, Clone)]
pub struct PhaseSeries {
    /// Accumulated rotation of each phase's snapshot, radians
    pub phase_offsets: Vec<f64>,
    pub grid: WavelengthGrid,
    /// Shape `(elements, phases * wavelengths)`, phase blocks left to right
    pub response: Array2<f64>,
    pub spectrum: LineSpectrum,
}

impl PhaseSeries {
    pub fn phase_count(&self) -> usize {
        self.phase_offsets.len()
    }

    /// Response columns belonging to one phase
    pub fn response_block(&self, phase: usize) -> Option<ArrayView2<'_, f64>> {
        if phase >= self.phase_count() {
            return None;
        }
        let n = self.grid.len();
        Some(self.response.slice(s![.., phase * n..(phase + 1) * n]))
    }
}

/// Flux seen through `response` for a brightness vector: response^T . brightness
pub fn project(
    response: &ArrayView2<'_, f64>,
    brightness: &[f64],
) -> Result<Array1<f64>, ForwardModelError> {
    if response.nrows() != brightness.len() {
        return Err(ForwardModelError::BrightnessLength {
            expected: response.nrows(),
            got: brightness.len(),
        });
    }
    Ok(response.t().dot(&ArrayView1::from(brightness)))
}

/// Drives a [`ResponseMatrixBuilder`] over a phase schedule
#[derive(Debug, Clone, Default)]
pub struct PhaseAggregator {
    builder: ResponseMatrixBuilder,
    weighting: BrightnessWeighting,
}

impl PhaseAggregator {
    pub fn new(builder: ResponseMatrixBuilder, weighting: BrightnessWeighting) -> Self {
        Self { builder, weighting }
    }

    pub fn builder(&self) -> &ResponseMatrixBuilder {
        &self.builder
    }

    pub fn weighting(&self) -> BrightnessWeighting {
        self.weighting
    }

    /// Rotate, build and collect for every phase of `schedule`.
    ///
    /// The star is advanced by one step before each build, so phase k is built
    /// at `surface.phase() + (k + 1) * step`. `surface` itself is untouched.
    pub fn run<S: StellarSurface + Sync>(
        &self,
        surface: &S,
        schedule: PhaseSchedule,
        num_wavelengths: usize,
        max_wavelength: f64,
    ) -> Result<PhaseSeries, ForwardModelError> {
        let grid = WavelengthGrid::new(num_wavelengths, max_wavelength)?;
        let n = grid.len();

        let mut snapshots: Vec<S> = Vec::with_capacity(schedule.count);
        for _ in 0..schedule.count {
            let next = match snapshots.last() {
                Some(previous) => previous.rotated(schedule.step),
                None => surface.rotated(schedule.step),
            };
            snapshots.push(next);
        }

        let mut response: Array2<f64> = Array2::zeros((surface.len(), schedule.count * n));
        for (phase, snapshot) in snapshots.iter().enumerate() {
            info!(
                "Phase {}/{} at offset {:.4} rad",
                phase + 1,
                schedule.count,
                snapshot.phase()
            );
            let block = self
                .builder
                .build_on_grid(snapshot, &grid)
                .map_err(|e| e.in_phase(phase))?;
            if block.nrows() != response.nrows() {
                return Err(ForwardModelError::BrightnessLength {
                    expected: response.nrows(),
                    got: block.nrows(),
                }
                .in_phase(phase));
            }
            response
                .slice_mut(s![.., phase * n..(phase + 1) * n])
                .assign(&block);
        }

        let flux = match self.weighting {
            BrightnessWeighting::Final => {
                let last = snapshots
                    .last()
                    .map(|s| s.brightness())
                    .unwrap_or_else(|| surface.brightness());
                project(&response.view(), last)?.to_vec()
            }
            BrightnessWeighting::Initial => project(&response.view(), surface.brightness())?.to_vec(),
            BrightnessWeighting::PerPhase => {
                let mut flux = Vec::with_capacity(response.ncols());
                for (phase, snapshot) in snapshots.iter().enumerate() {
                    let block = response.slice(s![.., phase * n..(phase + 1) * n]);
                    let part = project(&block, snapshot.brightness())
                        .map_err(|e| e.in_phase(phase))?;
                    flux.extend(part.iter());
                }
                flux
            }
        };

        let wavelengths = grid
            .samples()
            .iter()
            .copied()
            .cycle()
            .take(schedule.count * n)
            .collect();

        Ok(PhaseSeries {
            phase_offsets: snapshots.iter().map(|s| s.phase()).collect(),
            grid,
            response,
            spectrum: LineSpectrum { wavelengths, flux },
        })
    }
}
