//! Instrument parameters from the kernel pool (`INS<id>_*` variables)

use std::fmt;

use crate::error::{EphemerisError, EphemerisResult};
use crate::source::EphemerisSource;

/// Units of `INS<id>_FOV_REF_ANGLE` / `_FOV_CROSS_ANGLE`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AngleUnits {
    Degrees,
    Radians,
    Arcminutes,
    Arcseconds,
}

impl AngleUnits {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "DEGREES" => Some(Self::Degrees),
            "RADIANS" => Some(Self::Radians),
            "ARCMINUTES" => Some(Self::Arcminutes),
            "ARCSECONDS" => Some(Self::Arcseconds),
            _ => None,
        }
    }

    pub fn to_radians(&self, value: f64) -> f64 {
        match self {
            Self::Degrees => value.to_radians(),
            Self::Radians => value,
            Self::Arcminutes => (value / 60.0).to_radians(),
            Self::Arcseconds => (value / 3600.0).to_radians(),
        }
    }
}

/// Perspective camera aperture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldOfView {
    /// Full vertical angle, radians
    pub yfov: f64,
    /// Width / height
    pub aspect_ratio: f64,
}

impl FieldOfView {
    /// From rectangular FOV half-angles: vertical = 2 x reference, aspect = cross / reference
    pub fn from_half_angles(ref_angle: f64, cross_angle: f64) -> Option<Self> {
        if !(ref_angle > 0.0 && cross_angle > 0.0) || !ref_angle.is_finite() || !cross_angle.is_finite() {
            return None;
        }
        Some(Self {
            yfov: 2.0 * ref_angle,
            aspect_ratio: cross_angle / ref_angle,
        })
    }
}

/// What the kernel pool knows about an instrument; absent values stay `None`
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentParameters {
    pub name: String,
    pub id: i32,
    pub frame: Option<String>,
    pub pixel_lines: Option<u32>,
    pub pixel_samples: Option<u32>,
    pub field_of_view: Option<FieldOfView>,
}

impl fmt::Display for InstrumentParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instrument {} (id {})", self.name, self.id)?;
        writeln!(f, "  frame:   {}", self.frame.as_deref().unwrap_or("-"))?;
        match (self.pixel_samples, self.pixel_lines) {
            (Some(s), Some(l)) => writeln!(f, "  pixels:  {} x {}", s, l)?,
            _ => writeln!(f, "  pixels:  -")?,
        }
        match self.field_of_view {
            Some(fov) => write!(f, "  fov:     {:.4} deg (aspect {:.4})", fov.yfov.to_degrees(), fov.aspect_ratio),
            None => write!(f, "  fov:     -"),
        }
    }
}

/// Look up an instrument's frame, pixel grid and field of view
pub fn instrument_parameters<S: EphemerisSource + ?Sized>(
    source: &S,
    instrument: &str,
) -> EphemerisResult<InstrumentParameters> {
    let id = source.body_id(instrument)?;
    let pool = source.kernel_pool();
    let key = |suffix: &str| format!("INS{}_{}", id, suffix);

    let pixels = |suffix: &str| -> EphemerisResult<Option<u32>> {
        match pool.first_number(&key(suffix)) {
            None => Ok(None),
            Some(v) if v >= 1.0 && v <= u32::MAX as f64 => Ok(Some(v.round() as u32)),
            Some(v) => Err(EphemerisError::PoolVariable {
                name: key(suffix),
                reason: format!("invalid pixel count {}", v),
            }),
        }
    };

    let units = match pool.first_string(&key("FOV_ANGLE_UNITS")) {
        None => AngleUnits::Degrees,
        Some(text) => AngleUnits::parse(text).ok_or_else(|| EphemerisError::Instrument {
            instrument: instrument.to_string(),
            reason: format!("unsupported FOV angle units '{}'", text),
        })?,
    };

    let field_of_view = match (
        pool.first_number(&key("FOV_REF_ANGLE")),
        pool.first_number(&key("FOV_CROSS_ANGLE")),
    ) {
        (Some(r), Some(c)) => Some(
            FieldOfView::from_half_angles(units.to_radians(r), units.to_radians(c)).ok_or_else(|| {
                EphemerisError::Instrument {
                    instrument: instrument.to_string(),
                    reason: format!("invalid FOV angles {} / {}", r, c),
                }
            })?,
        ),
        _ => None,
    };

    Ok(InstrumentParameters {
        name: instrument.to_string(),
        id,
        frame: pool.first_string(&key("FOV_FRAME")).map(str::to_string),
        pixel_lines: pixels("PIXEL_LINES")?,
        pixel_samples: pixels("PIXEL_SAMPLES")?,
        field_of_view,
    })
}
