//! Uniform time grids

use crate::error::{CoreError, CoreResult};

/// `count` uniformly spaced values from `start` to `end`, both inclusive.
///
/// A single sample is `start`. More than one sample needs `end > start` and
/// a step large enough that every value is distinct.
pub fn uniform_samples(start: f64, end: f64, count: usize) -> CoreResult<Vec<f64>> {
    if !start.is_finite() || !end.is_finite() {
        return Err(CoreError::NonFinite("sample interval"));
    }
    match count {
        0 => Err(CoreError::EmptySampleGrid),
        1 => Ok(vec![start]),
        _ => {
            if end <= start {
                return Err(CoreError::NonIncreasingInterval { start, end });
            }
            let intervals = (count - 1) as f64;
            let step = (end - start) / intervals;
            let mut samples: Vec<f64> = (0..count - 1).map(|i| start + step * i as f64).collect();
            // Land exactly on the end point rather than accumulating rounding
            samples.push(end);
            if !samples.windows(2).all(|w| w[1] > w[0]) {
                return Err(CoreError::UnresolvableStep { step, start, end });
            }
            Ok(samples)
        }
    }
}
