//! One-dimensional linear interpolation and resampling.
//!
//! Spectra in this crate live on sorted wavelength grids. A Doppler shift
//! stretches the grid, so every shifted spectrum has to be resampled back onto
//! the shared grid. The routines here do that with linear interpolation and an
//! explicit policy for targets that fall outside the source range.

use thiserror::Error;

/// Errors that can occur during interpolation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Value {0} is out of bounds for interpolation range [{1}, {2}]")]
    OutOfBounds(f64, f64, f64),
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be sorted in ascending order")]
    UnsortedData,
}

/// What to return for targets outside the source abscissae.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeHandling {
    /// Extend with the first source value below the range and the last above it
    #[default]
    FirstLast,
    /// Report `InterpError::OutOfBounds`
    Error,
}

fn validate(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }

    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }

    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpError::UnsortedData);
    }

    Ok(())
}

#[inline]
fn lerp(xs: &[f64], ys: &[f64], i1: usize, x: f64) -> f64 {
    let (x1, x2) = (xs[i1], xs[i1 + 1]);
    let (y1, y2) = (ys[i1], ys[i1 + 1]);
    let t = (x - x1) / (x2 - x1);
    y1 + t * (y2 - y1)
}

/// Resample `ys`, sampled at `xs`, onto a sorted list of `targets`.
///
/// Both `xs` and `targets` must be ascending, which lets the segment search
/// walk forward instead of bisecting for every target. A target that lands
/// exactly on a source abscissa returns that sample unchanged.
///
/// # Arguments
///
/// * `xs` - Source abscissae, strictly ascending
/// * `ys` - Source values
/// * `targets` - Abscissae to evaluate at, ascending
/// * `edge` - Policy for targets outside `[xs[0], xs[n-1]]`
pub fn resample_linear(
    xs: &[f64],
    ys: &[f64],
    targets: &[f64],
    edge: EdgeHandling,
) -> Result<Vec<f64>, InterpError> {
    validate(xs, ys)?;

    let n = xs.len();
    let (min_x, max_x) = (xs[0], xs[n - 1]);
    let mut out = Vec::with_capacity(targets.len());
    let mut segment = 0;

    for &x in targets {
        if x < min_x || x > max_x || x.is_nan() {
            match edge {
                EdgeHandling::FirstLast if x < min_x => out.push(ys[0]),
                EdgeHandling::FirstLast if x > max_x => out.push(ys[n - 1]),
                _ => return Err(InterpError::OutOfBounds(x, min_x, max_x)),
            }
            continue;
        }

        while segment + 2 < n && xs[segment + 1] <= x {
            segment += 1;
        }

        let value = if xs[segment] == x {
            ys[segment]
        } else if xs[segment + 1] == x {
            ys[segment + 1]
        } else {
            lerp(xs, ys, segment, x)
        };
        out.push(value);
    }

    Ok(out)
}

/// Evenly spaced samples over `[start, stop]`, both ends included.
///
/// Returns a single `start` sample when `count == 1` and nothing when
/// `count == 0`.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        stop
                    } else {
                        start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}
