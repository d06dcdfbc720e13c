use plotters::prelude::*;
use std::path::Path;

use super::OutputError;
use crate::phases::LineSpectrum;

fn plot_err<E: std::fmt::Display>(e: E) -> OutputError {
    OutputError::Plot(e.to_string())
}

/// Flux against wavelength on a logarithmic wavelength axis, one line per phase
pub fn plot_spectrum(
    path: &Path,
    spectrum: &LineSpectrum,
    samples_per_phase: usize,
) -> Result<(), OutputError> {
    if spectrum.is_empty() || samples_per_phase == 0 {
        return Err(OutputError::EmptySpectrum);
    }
    if spectrum.len() % samples_per_phase != 0 {
        return Err(OutputError::PhaseLayout {
            len: spectrum.len(),
            samples_per_phase,
        });
    }

    let positive_wavelengths = spectrum.wavelengths.iter().copied().filter(|w| *w > 0.0);
    let x_min = positive_wavelengths.clone().fold(f64::INFINITY, f64::min);
    let x_max = positive_wavelengths.fold(f64::NEG_INFINITY, f64::max);
    if !x_min.is_finite() || !x_max.is_finite() {
        return Err(OutputError::EmptySpectrum);
    }
    // Log axis needs a non-degenerate, strictly positive range
    let x_max = if x_max > x_min { x_max } else { x_min * 10.0 };

    let y_min = spectrum.flux.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = spectrum.flux.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_max = if y_max > y_min { y_max } else { y_min + 1.0 };
    let y_pad = 0.05 * (y_max - y_min);

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Flux vs wavelength", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min - y_pad)..(y_max + y_pad))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Wavelength")
        .y_desc("Flux")
        .y_label_formatter(&|y| format!("{:.2e}", y))
        .draw()
        .map_err(plot_err)?;

    let phases = spectrum.len() / samples_per_phase;
    for phase in 0..phases {
        let start = phase * samples_per_phase;
        let end = start + samples_per_phase;
        let points: Vec<(f64, f64)> = spectrum.wavelengths[start..end]
            .iter()
            .copied()
            .zip(spectrum.flux[start..end].iter().copied())
            .filter(|(w, _)| *w > 0.0)
            .collect();

        let color = Palette99::pick(phase).to_rgba();
        chart
            .draw_series(LineSeries::new(points, &color))
            .map_err(plot_err)?
            .label(format!("phase {}", phase + 1))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
