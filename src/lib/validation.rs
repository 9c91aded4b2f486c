//! Input validation for command-line parameters and file paths.
//!
//! Failures are reported as [`CovcapError`] variants so that messages name the
//! offending parameter or file.

use crate::errors::{CovcapError, Result};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Validate that a file exists.
///
/// # Errors
/// Returns an error if the file does not exist.
///
/// # Example
/// ```
/// use covcap_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.bam", "Input BAM").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_file() {
        return Err(CovcapError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that a value lies in `[min, max]`.
///
/// # Errors
/// Returns an error naming `name` if the value is out of range.
pub fn validate_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
    if value < min || value > max {
        return Err(CovcapError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

/// Validate that a value is strictly positive.
///
/// # Errors
/// Returns an error naming `name` if the value is zero or negative.
pub fn validate_positive<T: PartialOrd + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(CovcapError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("must be > 0, got {value}"),
        });
    }
    Ok(())
}

/// Two paths refer to the same file, comparing canonical forms when both exist.
#[must_use]
pub fn same_file<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> bool {
    let (a, b) = (a.as_ref(), b.as_ref());
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Validate that no output path coincides with an input path and that the
/// outputs are pairwise distinct.
///
/// # Errors
/// Returns an error for the first collision found.
pub fn validate_output_paths(inputs: &[PathBuf], outputs: &[PathBuf]) -> Result<()> {
    let mut seen = HashSet::new();
    for output in outputs {
        if let Some(input) = inputs.iter().find(|input| same_file(input, output)) {
            return Err(CovcapError::InvalidParameter {
                parameter: "output".to_string(),
                reason: format!(
                    "output {} would overwrite input {}",
                    output.display(),
                    input.display()
                ),
            });
        }
        if !seen.insert(output.as_path()) {
            return Err(CovcapError::InvalidParameter {
                parameter: "output".to_string(),
                reason: format!("output {} is derived from more than one input", output.display()),
            });
        }
    }
    Ok(())
}
