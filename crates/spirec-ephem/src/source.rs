//! Ephemeris source abstraction

use glam::{DMat3, DVec3};
use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EphemerisResult;
use crate::kernel_pool::KernelPool;
use crate::names;

/// Aberration correction applied to position queries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correction {
    #[serde(rename = "NONE")]
    None,
    /// Light time
    #[serde(rename = "LT")]
    LightTime,
    /// Light time and stellar aberration
    #[default]
    #[serde(rename = "LT+S")]
    LightTimeStellar,
}

impl Correction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::LightTime => "LT",
            Self::LightTimeStellar => "LT+S",
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Owned handle to loaded ephemeris data.
///
/// Implementations hold all kernel state themselves; nothing is process-global.
pub trait EphemerisSource {
    /// Position of `target` relative to `observer` in `frame`, km
    fn position(
        &self,
        target: &str,
        observer: &str,
        frame: &str,
        epoch: Epoch,
        correction: Correction,
    ) -> EphemerisResult<DVec3>;

    /// Matrix mapping coordinates in `from` to coordinates in `to`
    fn rotation(&self, from: &str, to: &str, epoch: Epoch) -> EphemerisResult<DMat3>;

    /// Text kernel variables (instrument parameters, names)
    fn kernel_pool(&self) -> &KernelPool;

    fn body_id(&self, name: &str) -> EphemerisResult<i32> {
        names::body_id(name, self.kernel_pool())
    }

    fn frame_id(&self, name: &str) -> EphemerisResult<i32> {
        names::frame_id(name, self.kernel_pool())
    }
}
