//! Synthesize the line spectrum of a spotted, rotating star
//!
//! Builds a latitude-band surface map, paints a few dark spots at seeded
//! random positions, steps the star through one full rotation and writes the
//! brightness vector, the concatenated response matrix, the line spectrum and
//! a log-wavelength plot of the spectrum.
//!
//! Usage:
//! ```
//! cargo run --release --bin doppler_forward -- [OPTIONS]
//! ```
//!
//! See --help for detailed options.

use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::f64::consts::PI;
use std::path::PathBuf;
use stellar_doppler::io::{
    plot_spectrum, write_brightness_csv, write_matrix_csv, write_spectrum_csv,
};
use stellar_doppler::{
    rotational_broadening_factors, BandedSurface, ForwardModelConfig, PhaseAggregator,
    PhaseSchedule, ResponseMatrixBuilder, StellarGeometry, StellarSurface, SurfaceCoordinate,
};

/// Command line arguments for the forward model
#[derive(Parser, Debug)]
#[command(
    name = "Doppler Forward Model",
    about = "Synthesizes rotationally Doppler-shifted spectra of a spotted star",
    long_about = None
)]
struct Args {
    /// Inclination of the rotation axis to the line of sight, radians
    #[arg(long, default_value_t = PI / 4.2)]
    inclination: f64,

    /// Stellar radius in metres
    #[arg(long, default_value_t = 3.4e6)]
    radius: f64,

    /// Equatorial rotation velocity in m/s
    #[arg(long, default_value_t = 5.0)]
    velocity: f64,

    /// Number of latitude bands
    #[arg(long, default_value_t = 24)]
    latitudes: usize,

    /// Requested number of surface elements
    #[arg(long, default_value_t = 700)]
    zones: usize,

    /// Number of phases over one rotation
    #[arg(short, long, default_value_t = 10)]
    phases: usize,

    /// Number of wavelength samples per phase
    #[arg(short, long, default_value_t = 400)]
    wavelengths: usize,

    /// Longest wavelength of the grid
    #[arg(long, default_value_t = 5.0)]
    max_wavelength: f64,

    /// Number of dark spots to paint on the surface
    #[arg(long, default_value_t = 3)]
    spots: usize,

    /// Angular radius of each spot, radians
    #[arg(long, default_value_t = 0.3)]
    spot_radius: f64,

    /// Brightness inside a spot (photosphere is 1.0)
    #[arg(long, default_value_t = 0.2)]
    spot_brightness: f64,

    /// Seed for spot placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Optional JSON model configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for CSV and plot output
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Skip the spectrum plot
    #[arg(long, default_value_t = false)]
    no_plot: bool,
}

/// Paint `args.spots` spots at positions drawn uniformly over the sphere
fn spotted_surface(args: &Args, geometry: StellarGeometry) -> Result<BandedSurface, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut surface = BandedSurface::uniform(geometry, 1.0)?;

    for _ in 0..args.spots {
        let colatitude = rng.gen_range(-1.0f64..1.0).acos();
        let longitude = rng.gen_range(0.0..2.0 * PI);
        info!(
            "Spot at colatitude {:.3} rad, longitude {:.3} rad",
            colatitude, longitude
        );
        surface = surface.with_spot(
            SurfaceCoordinate::new(colatitude, longitude),
            args.spot_radius,
            args.spot_brightness,
        )?;
    }
    Ok(surface)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ForwardModelConfig::from_json_file(path)?,
        None => ForwardModelConfig::default(),
    };

    let geometry = StellarGeometry::new(
        args.radius,
        args.velocity,
        args.inclination,
        args.latitudes,
        args.zones,
    )?;
    let surface = spotted_surface(&args, geometry)?;
    println!(
        "Star: {} elements in {} bands, v_eq = {} m/s, i = {:.4} rad",
        surface.len(),
        surface.band_sizes().len(),
        args.velocity,
        args.inclination
    );

    match rotational_broadening_factors(&surface) {
        Ok(factors) if !factors.is_empty() => {
            let mean = factors.iter().sum::<f64>() / factors.len() as f64;
            info!("Mean rotational broadening factor {:.4}", mean);
        }
        Ok(_) => {}
        Err(e) => warn!("Skipping broadening diagnostic: {}", e),
    }

    std::fs::create_dir_all(&args.output_dir)?;
    write_brightness_csv(&args.output_dir.join("I_vector.csv"), surface.brightness())?;

    let aggregator = PhaseAggregator::new(
        ResponseMatrixBuilder::from_config(&config),
        config.brightness_weighting,
    );
    let schedule = PhaseSchedule::full_rotation(args.phases);
    let series = aggregator.run(&surface, schedule, args.wavelengths, args.max_wavelength)?;

    write_matrix_csv(&args.output_dir.join("R_matrix.csv"), &series.response)?;
    write_spectrum_csv(
        &args.output_dir.join("flux_vs_wavelength_data.csv"),
        &series.spectrum,
    )?;

    if !args.no_plot && !series.spectrum.is_empty() {
        let plot_path = args.output_dir.join("spectrum.png");
        plot_spectrum(&plot_path, &series.spectrum, series.grid.len())?;
        println!("Plot saved to: {}", plot_path.display());
    }

    println!(
        "Wrote {} phases x {} wavelengths to {}",
        series.phase_count(),
        series.grid.len(),
        args.output_dir.display()
    );
    Ok(())
}
