//! Uniform time grid over ephemeris time

use hifitime::{Duration, Epoch, TimeScale};
use std::str::FromStr;

use spirec_core::uniform_samples;

use crate::error::{PipelineError, PipelineResult};
use crate::sample_id::{SampleId, MAX_SAMPLE_ID};

/// One instant of the run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSample {
    pub id: SampleId,
    pub epoch: Epoch,
}

/// `n` instants uniformly spaced in ephemeris time, both ends included
#[derive(Clone, Debug)]
pub struct Timeline {
    epochs: Vec<Epoch>,
}

impl Timeline {
    pub fn new(start: Epoch, end: Epoch, samples: usize) -> PipelineResult<Self> {
        if samples > MAX_SAMPLE_ID as usize {
            return Err(PipelineError::SampleIdOverflow {
                id: samples as u64,
                width: crate::sample_id::SAMPLE_ID_WIDTH,
            });
        }
        let seconds = uniform_samples(start.to_et_seconds(), end.to_et_seconds(), samples)
            .map_err(|e| PipelineError::config(format!("time grid {} .. {}: {}", start, end, e)))?;

        let epochs: Vec<Epoch> = seconds.into_iter().map(Epoch::from_et_seconds).collect();
        if let Some(w) = epochs.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PipelineError::config(format!(
                "time grid {} .. {} with {} samples repeats instant {}",
                start, end, samples, w[0]
            )));
        }
        Ok(Self { epochs })
    }

    /// Parse UTC strings (`2014-08-01T00:00:00`, optionally with a scale suffix)
    pub fn from_utc(start: &str, end: &str, samples: usize) -> PipelineResult<Self> {
        Self::new(parse_epoch(start)?, parse_epoch(end)?, samples)
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = PipelineResult<TimeSample>> + '_ {
        self.epochs
            .iter()
            .enumerate()
            .map(|(i, &epoch)| Ok(TimeSample { id: SampleId::from_index(i)?, epoch }))
    }
}

pub fn parse_epoch(text: &str) -> PipelineResult<Epoch> {
    Epoch::from_str(text.trim()).map_err(|e| PipelineError::config(format!("invalid time '{}': {}", text, e)))
}

/// ISO calendar UTC with two decimals, e.g. `2014-08-01T12:30:15.13`
pub fn format_utc(epoch: Epoch) -> String {
    let rounded = epoch
        .to_time_scale(TimeScale::UTC)
        .round(Duration::from_milliseconds(10.0));
    let (y, mo, d, h, mi, s, ns) = rounded.to_gregorian_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:02}",
        y,
        mo,
        d,
        h,
        mi,
        s,
        ns / 10_000_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_grid() {
        let start = Epoch::from_gregorian_utc_hms(2014, 8, 1, 0, 0, 0);
        let timeline = Timeline::new(start, start + Duration::from_seconds(40.0), 5).unwrap();

        assert_eq!(timeline.len(), 5);
        let offsets: Vec<f64> = timeline
            .epochs()
            .iter()
            .map(|e| e.to_et_seconds() - start.to_et_seconds())
            .collect();
        for (got, want) in offsets.iter().zip([0.0, 10.0, 20.0, 30.0, 40.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }

        let ids: Vec<String> = timeline.samples().map(|s| s.unwrap().id.to_string()).collect();
        assert_eq!(ids, ["000001", "000002", "000003", "000004", "000005"]);
    }

    #[test]
    fn test_single_sample_and_bad_grids() {
        let start = Epoch::from_gregorian_utc_hms(2014, 8, 1, 0, 0, 0);
        let single = Timeline::new(start, start - Duration::from_days(1.0), 1).unwrap();
        assert_eq!(single.len(), 1);
        assert_relative_eq!(single.epochs()[0].to_et_seconds(), start.to_et_seconds(), epsilon = 1e-6);

        assert!(matches!(Timeline::new(start, start, 3), Err(PipelineError::Configuration(_))));
        assert!(matches!(Timeline::new(start, start, 0), Err(PipelineError::Configuration(_))));
        assert!(matches!(
            Timeline::new(start, start + Duration::from_days(1.0), 1_000_000),
            Err(PipelineError::SampleIdOverflow { .. })
        ));
    }

    #[test]
    fn test_sub_resolution_step_is_rejected() {
        let start = Epoch::from_gregorian_utc_hms(2014, 8, 1, 0, 0, 0);
        let err = Timeline::new(start, start + Duration::from_microseconds(1.0), 100).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));

        let timeline = Timeline::new(start, start + Duration::from_seconds(1.0), 100).unwrap();
        assert!(timeline.epochs().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_parse_and_format() {
        let epoch = parse_epoch("2014-08-01T12:30:15").unwrap();
        assert_eq!(format_utc(epoch), "2014-08-01T12:30:15.00");

        let later = epoch + Duration::from_milliseconds(126.0);
        assert_eq!(format_utc(later), "2014-08-01T12:30:15.13");

        let carry = Epoch::from_gregorian_utc(2014, 8, 1, 12, 30, 59, 996_000_000);
        assert_eq!(format_utc(carry), "2014-08-01T12:31:00.00");

        assert!(parse_epoch("not a date").is_err());
    }

    #[test]
    fn test_from_utc_round_trip() {
        let timeline = Timeline::from_utc("2016-01-01T00:00:00", "2016-01-01T00:00:02", 3).unwrap();
        let names: Vec<String> = timeline.epochs().iter().map(|e| format_utc(*e)).collect();
        assert_eq!(
            names,
            ["2016-01-01T00:00:00.00", "2016-01-01T00:00:01.00", "2016-01-01T00:00:02.00"]
        );
    }
}
