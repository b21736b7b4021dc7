//! Validation for coordinates and envelopes entering the indexes.

use crate::error::{CloudtreeError, Result};
use cloudtree_types::{Coord, Envelope};

/// Validates that a coordinate has finite components.
///
/// # Examples
///
/// ```
/// use cloudtree::validation::validate_coord;
/// use cloudtree::Coord;
///
/// assert!(validate_coord(&Coord::new(1.0, 2.0, 3.0)).is_ok());
/// assert!(validate_coord(&Coord::new(f64::NAN, 2.0, 3.0)).is_err());
/// ```
pub fn validate_coord(coord: &Coord) -> Result<()> {
    if !coord.is_finite() {
        return Err(CloudtreeError::InvalidInput(format!(
            "Coordinate must have finite components, got: ({}, {}, {})",
            coord.x, coord.y, coord.z
        )));
    }
    Ok(())
}

/// Validates that an envelope has finite, correctly ordered bounds.
///
/// # Examples
///
/// ```
/// use cloudtree::validation::validate_envelope;
/// use cloudtree::Envelope;
///
/// assert!(validate_envelope(&Envelope::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)).is_ok());
/// assert!(validate_envelope(&Envelope::new(1.0, 0.0, 0.0, 0.0, 1.0, 1.0)).is_err());
/// ```
pub fn validate_envelope(envelope: &Envelope) -> Result<()> {
    if !envelope.is_finite() {
        return Err(CloudtreeError::InvalidInput(format!(
            "Envelope bounds must be finite, got: {:?}",
            envelope
        )));
    }

    if envelope.is_empty() {
        return Err(CloudtreeError::InvalidInput(format!(
            "Envelope bounds must satisfy min <= max on every axis, got: {:?}",
            envelope
        )));
    }

    Ok(())
}
