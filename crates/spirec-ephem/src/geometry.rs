//! Time-indexed geometry queries used to pose the scene

use glam::{DMat3, DVec3};
use hifitime::Epoch;

use crate::error::{EphemerisError, EphemerisResult};
use crate::source::{Correction, EphemerisSource};

/// Bodies and frames for one observation
#[derive(Clone, Copy, Debug)]
pub struct GeometryQuery<'a> {
    pub observer: &'a str,
    pub observer_frame: &'a str,
    pub target: &'a str,
    pub target_frame: &'a str,
    pub illuminator: &'a str,
    pub correction: Correction,
}

/// Observation geometry at one instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Target relative to observer, observer frame, km
    pub position: DVec3,
    /// Observer frame -> target frame
    pub rotation: DMat3,
    /// Unit vector from the observer toward the illuminator, observer frame
    pub illumination: DVec3,
}

/// Full query: position, relative orientation and illumination direction
pub fn observe<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    query: &GeometryQuery<'_>,
) -> EphemerisResult<Geometry> {
    let (position, rotation) = relative_pose(
        source,
        epoch,
        query.target,
        query.observer,
        query.observer_frame,
        query.target_frame,
        query.correction,
    )?;
    let illumination = illumination_direction(
        source,
        epoch,
        query.illuminator,
        query.observer,
        query.observer_frame,
        query.correction,
    )?;

    Ok(Geometry {
        position,
        rotation,
        illumination,
    })
}

/// Position of `target` relative to `observer` in `frame`, and the rotation
/// `frame -> other_frame`
pub fn relative_pose<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    target: &str,
    observer: &str,
    frame: &str,
    other_frame: &str,
    correction: Correction,
) -> EphemerisResult<(DVec3, DMat3)> {
    let position = source.position(target, observer, frame, epoch, correction)?;
    let rotation = source.rotation(frame, other_frame, epoch)?;

    if !position.is_finite() || !rotation.is_finite() {
        return Err(EphemerisError::query(
            format!("{} relative to {}", target, observer),
            epoch,
            "non-finite geometry",
        ));
    }
    Ok((position, rotation))
}

/// Unit direction from `observer` toward `illuminator` in `frame`
pub fn illumination_direction<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    illuminator: &str,
    observer: &str,
    frame: &str,
    correction: Correction,
) -> EphemerisResult<DVec3> {
    let r = source.position(illuminator, observer, frame, epoch, correction)?;
    let norm = r.length();
    if !norm.is_finite() || norm == 0.0 {
        return Err(EphemerisError::query(
            format!("{} direction from {}", illuminator, observer),
            epoch,
            "illumination vector has zero or non-finite length",
        ));
    }
    Ok(r / norm)
}
