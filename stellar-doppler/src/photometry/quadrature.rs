//! Adaptive Gauss-Kronrod quadrature.
//!
//! The Planck function falls off exponentially on the short-wavelength side of
//! its peak, so fixed-step rules either waste evaluations or miss the knee.
//! This module bisects the interval with the largest error estimate until the
//! global estimate meets the tolerance, using the 7-point Gauss / 15-point
//! Kronrod pair on every segment.
//!
//! The error estimate follows the QUADPACK QK15 scaling, so tolerances behave
//! like the usual adaptive-quadrature defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kronrod abscissae on [-1, 1]; odd indices are shared with the Gauss rule.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for XGK[1], XGK[3], XGK[5] and the centre.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Errors raised by the adaptive integrator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuadratureError {
    #[error("Integration bounds must be finite with lower <= upper, got [{lower}, {upper}]")]
    InvalidInterval { lower: f64, upper: f64 },

    #[error("Integrand is not finite at x = {at}")]
    NonFinite { at: f64 },

    #[error(
        "Integral over [{lower}, {upper}] did not converge after {subdivisions} subdivisions \
         (estimate {estimate:e}, error {error_estimate:e})"
    )]
    NonConvergence {
        lower: f64,
        upper: f64,
        estimate: f64,
        error_estimate: f64,
        subdivisions: usize,
    },
}

/// Convergence criteria for [`integrate`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratureTolerance {
    /// Absolute error target
    pub absolute: f64,
    /// Relative error target
    pub relative: f64,
    /// Maximum number of segments before giving up
    pub max_subdivisions: usize,
}

impl Default for QuadratureTolerance {
    fn default() -> Self {
        Self {
            absolute: 1.49e-8,
            relative: 1.49e-8,
            max_subdivisions: 50,
        }
    }
}

/// Value and error estimate of a converged integral
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureResult {
    pub value: f64,
    pub error_estimate: f64,
    /// Number of segments the interval ended up split into
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

fn kronrod15<F: Fn(f64) -> f64>(f: &F, lower: f64, upper: f64) -> Result<Segment, QuadratureError> {
    let center = 0.5 * (lower + upper);
    let half = 0.5 * (upper - lower);
    let abs_half = half.abs();

    let eval = |x: f64| -> Result<f64, QuadratureError> {
        let y = f(x);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(QuadratureError::NonFinite { at: x })
        }
    };

    let fc = eval(center)?;
    let mut res_gauss = fc * WG[3];
    let mut res_kronrod = fc * WGK[7];
    let mut res_abs = res_kronrod.abs();

    let mut fv1 = [0.0; 7];
    let mut fv2 = [0.0; 7];

    for j in 0..7 {
        let dx = half * XGK[j];
        let f1 = eval(center - dx)?;
        let f2 = eval(center + dx)?;
        fv1[j] = f1;
        fv2[j] = f2;
        res_kronrod += WGK[j] * (f1 + f2);
        res_abs += WGK[j] * (f1.abs() + f2.abs());
        if j % 2 == 1 {
            res_gauss += WG[j / 2] * (f1 + f2);
        }
    }

    let mean = res_kronrod * 0.5;
    let mut res_asc = WGK[7] * (fc - mean).abs();
    for j in 0..7 {
        res_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
    }

    let value = res_kronrod * half;
    res_abs *= abs_half;
    res_asc *= abs_half;
    let mut error = ((res_kronrod - res_gauss) * half).abs();

    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (1.0f64).min((200.0 * error / res_asc).powf(1.5));
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    Ok(Segment {
        lower,
        upper,
        value,
        error,
    })
}

/// Integrate `f` over `[lower, upper]` to the requested tolerance.
///
/// Converges when the summed error estimate drops below
/// `max(tolerance.absolute, tolerance.relative * |value|)`.
///
/// # Errors
///
/// * `InvalidInterval` - non-finite bounds or `lower > upper`
/// * `NonFinite` - the integrand returned NaN or infinity
/// * `NonConvergence` - the subdivision budget ran out
pub fn integrate<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    tolerance: &QuadratureTolerance,
) -> Result<QuadratureResult, QuadratureError> {
    if !lower.is_finite() || !upper.is_finite() || lower > upper {
        return Err(QuadratureError::InvalidInterval { lower, upper });
    }

    if lower == upper {
        return Ok(QuadratureResult {
            value: 0.0,
            error_estimate: 0.0,
            subdivisions: 1,
        });
    }

    let mut segments = vec![kronrod15(&f, lower, upper)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();

        if error <= tolerance.absolute.max(tolerance.relative * value.abs()) {
            return Ok(QuadratureResult {
                value,
                error_estimate: error,
                subdivisions: segments.len(),
            });
        }

        if segments.len() >= tolerance.max_subdivisions.max(1) {
            return Err(QuadratureError::NonConvergence {
                lower,
                upper,
                estimate: value,
                error_estimate: error,
                subdivisions: segments.len(),
            });
        }

        // Bisect the worst segment
        let worst = segments
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.error.total_cmp(&b.1.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.lower + seg.upper);

        // Segment has shrunk to the float resolution, nothing left to refine
        if mid <= seg.lower || mid >= seg.upper {
            return Err(QuadratureError::NonConvergence {
                lower,
                upper,
                estimate: value,
                error_estimate: error,
                subdivisions: segments.len() + 1,
            });
        }

        segments.push(kronrod15(&f, seg.lower, mid)?);
        segments.push(kronrod15(&f, mid, seg.upper)?);
    }
}
