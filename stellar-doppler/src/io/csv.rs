use ndarray::Array2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::OutputError;
use crate::phases::LineSpectrum;

/// One row per element: `index,brightness`
pub fn write_brightness_csv(path: &Path, brightness: &[f64]) -> Result<(), OutputError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "index,brightness")?;
    for (index, value) in brightness.iter().enumerate() {
        writeln!(file, "{index},{value}")?;
    }
    file.flush()?;
    Ok(())
}

/// One line per matrix row, values separated by ", "
pub fn write_matrix_csv(path: &Path, matrix: &Array2<f64>) -> Result<(), OutputError> {
    let mut file = BufWriter::new(File::create(path)?);
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", line.join(", "))?;
    }
    file.flush()?;
    Ok(())
}

/// One row per (phase, wavelength) sample: `index,wavelength,flux`
pub fn write_spectrum_csv(path: &Path, spectrum: &LineSpectrum) -> Result<(), OutputError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "index,wavelength,flux")?;
    for (index, (wavelength, flux)) in spectrum.iter().enumerate() {
        writeln!(file, "{index},{wavelength},{flux}")?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn test_brightness_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("I_vector.csv");
        write_brightness_csv(&path, &[1.0, 0.25, 0.0]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["index,brightness", "0,1", "1,0.25", "2,0"]);
    }

    #[test]
    fn test_matrix_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("R_matrix.csv");
        write_matrix_csv(&path, &array![[1.0, 2.5, 0.0], [0.5, 0.0, 3.0]]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["1, 2.5, 0", "0.5, 0, 3"]);
    }

    #[test]
    fn test_spectrum_csv_round_trips_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flux_vs_wavelength_data.csv");
        let spectrum = LineSpectrum {
            wavelengths: vec![0.01, 2.505, 5.0, 0.01, 2.505, 5.0],
            flux: vec![1.0e-30, 0.123456789, 0.5, 2.0e-30, 0.2, 0.6],
        };
        write_spectrum_csv(&path, &spectrum).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("index,wavelength,flux"));

        let rows: Vec<(usize, f64, f64)> = lines
            .map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                (
                    fields[0].parse().unwrap(),
                    fields[1].parse().unwrap(),
                    fields[2].parse().unwrap(),
                )
            })
            .collect();
        assert_eq!(rows.len(), 6);
        for (i, (index, wavelength, flux)) in rows.into_iter().enumerate() {
            assert_eq!(index, i);
            assert_eq!(wavelength, spectrum.wavelengths[i]);
            assert_eq!(flux, spectrum.flux[i]);
        }
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("I_vector.csv");
        assert!(matches!(
            write_brightness_csv(&path, &[1.0]),
            Err(OutputError::Io(_))
        ));
    }
}
