//! Fixed-width sample identifiers

use std::fmt;

use crate::error::{PipelineError, PipelineResult};

/// Digits in a printed sample id
pub const SAMPLE_ID_WIDTH: usize = 6;

/// Largest id that fits in [`SAMPLE_ID_WIDTH`] digits
pub const MAX_SAMPLE_ID: u32 = 999_999;

/// Per-run sample counter, starting at 1. Printed zero-padded so that
/// lexicographic and numeric order of output names agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(u32);

impl SampleId {
    pub const FIRST: SampleId = SampleId(1);

    pub fn new(value: u32) -> PipelineResult<Self> {
        if value == 0 {
            return Err(PipelineError::InvalidSampleId(value));
        }
        if value > MAX_SAMPLE_ID {
            return Err(PipelineError::SampleIdOverflow {
                id: value as u64,
                width: SAMPLE_ID_WIDTH,
            });
        }
        Ok(Self(value))
    }

    /// Id of the `index`-th sample (0-based)
    pub fn from_index(index: usize) -> PipelineResult<Self> {
        let value = index as u64 + 1;
        if value > MAX_SAMPLE_ID as u64 {
            return Err(PipelineError::SampleIdOverflow {
                id: value,
                width: SAMPLE_ID_WIDTH,
            });
        }
        Self::new(value as u32)
    }

    pub fn next(&self) -> PipelineResult<Self> {
        Self::from_index(self.0 as usize)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = SAMPLE_ID_WIDTH)
    }
}
