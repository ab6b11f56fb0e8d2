//! Reduction of raw forecast samples into one summary per local calendar day.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, NaiveDate, TimeZone, Timelike, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::model::{DaySummary, ForecastSample};

/// How to pick the representative sample when two are equally close to the
/// reference hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// First sample of the run wins
    #[default]
    Earliest,
    /// Last sample of the run wins
    Latest,
}

/// Options controlling day aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Maximum number of summaries returned
    pub max_days: usize,
    /// Local hour used to pick the representative condition (0-23)
    pub reference_hour: u32,
    /// Samples further apart than this never share a run
    pub max_gap: ChronoDuration,
    pub tie_break: TieBreak,
    /// Local date whose samples are ignored (usually "today")
    pub skip_date: Option<NaiveDate>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            max_days: 5,
            reference_hour: 12,
            max_gap: ChronoDuration::hours(6),
            tie_break: TieBreak::Earliest,
            skip_date: None,
        }
    }
}

impl AggregateOptions {
    pub fn with_max_days(max_days: usize) -> Self {
        Self {
            max_days,
            ..Self::default()
        }
    }
}

/// Accumulator for one contiguous run of samples on the same local day.
#[derive(Debug)]
struct DayRun {
    date: NaiveDate,
    min_temp: f64,
    max_temp: f64,
    condition_code: i32,
    condition_hour: u32,
    distance: u32,
}

impl DayRun {
    fn start(sample: &ForecastSample, date: NaiveDate, hour: u32, reference_hour: u32) -> Self {
        Self {
            date,
            min_temp: sample.temp,
            max_temp: sample.temp,
            condition_code: sample.condition_code,
            condition_hour: hour,
            distance: hour.abs_diff(reference_hour),
        }
    }

    fn add(&mut self, sample: &ForecastSample, hour: u32, options: &AggregateOptions) {
        if sample.temp < self.min_temp {
            self.min_temp = sample.temp;
        }
        if sample.temp > self.max_temp {
            self.max_temp = sample.temp;
        }

        let distance = hour.abs_diff(options.reference_hour);
        let closer = distance < self.distance
            || (distance == self.distance && options.tie_break == TieBreak::Latest);
        if closer {
            self.condition_code = sample.condition_code;
            self.condition_hour = hour;
            self.distance = distance;
        }
    }

    fn into_summary(self) -> DaySummary {
        DaySummary {
            date: self.date,
            day_index: self.date.weekday().num_days_from_sunday() as u8,
            min_temp: self.min_temp,
            max_temp: self.max_temp,
            condition_code: self.condition_code,
            condition_hour: self.condition_hour,
        }
    }
}

/// Aggregate samples by local day using the system timezone.
/// This is a convenience wrapper around [`aggregate_in`].
pub fn aggregate(samples: &[ForecastSample], max_days: usize) -> Vec<DaySummary> {
    aggregate_in(samples, &Local, &AggregateOptions::with_max_days(max_days))
}

/// Aggregate samples into per-day summaries in the given timezone.
///
/// The local day of every sample is derived from its absolute time, so runs
/// follow local midnight rather than the provider's UTC ordering. A new run
/// also starts whenever two consecutive samples are more than
/// `options.max_gap` apart. Invalid input never fails: non-finite
/// temperatures are dropped and out-of-order runs are sorted by date.
pub fn aggregate_in<Tz: TimeZone>(
    samples: &[ForecastSample],
    tz: &Tz,
    options: &AggregateOptions,
) -> Vec<DaySummary> {
    if options.max_days == 0 {
        return Vec::new();
    }

    let mut runs: Vec<DayRun> = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for sample in samples {
        if !sample.temp.is_finite() {
            debug!(time = %sample.observation_time, "Ignoring sample without a usable temperature");
            continue;
        }

        let local = sample.observation_time.with_timezone(tz);
        let date = local.date_naive();
        let hour = local.hour();

        if options.skip_date == Some(date) {
            debug!(%date, hour, "Skipping forecast for today");
            continue;
        }

        let gap_exceeded = previous
            .is_some_and(|p| (sample.observation_time - p).abs() > options.max_gap);
        previous = Some(sample.observation_time);

        match runs.last_mut() {
            Some(run) if run.date == date && !gap_exceeded => run.add(sample, hour, options),
            _ => {
                if gap_exceeded {
                    debug!(%date, hour, "Gap in forecast data, starting a new run");
                }
                runs.push(DayRun::start(sample, date, hour, options.reference_hour));
            }
        }

        debug!(
            %date,
            run = runs.len() - 1,
            hour,
            temp = sample.temp,
            "Aggregated forecast sample"
        );
    }

    // Stable, so runs of the same date keep their arrival order.
    runs.sort_by_key(|run| run.date);
    runs.truncate(options.max_days);
    runs.into_iter().map(DayRun::into_summary).collect()
}
