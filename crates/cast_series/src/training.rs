//! Training-set preparation for one provider.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::normalize_calendar;
use crate::error::{SeriesError, SeriesResult};
use crate::model::{group_by_series_key, CostObservation, SeriesKey, TimeSeries};
use crate::padding::{pad_short_series, PadPolicy, DEFAULT_MIN_POINTS};
use crate::provider::CloudProvider;
use crate::window::{effective_min_series_length, training_cutoff, WindowLimits, WindowPlan};

/// Knobs for training-set preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Window maxima
    pub limits: WindowLimits,
    /// Configured minimum number of points per retained series
    pub min_series_points: usize,
    /// How synthetic leading points are costed
    pub pad_policy: PadPolicy,
    /// Length every series is padded up to before refinement
    pub pad_min_points: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            limits: WindowLimits::default(),
            min_series_points: 1,
            pad_policy: PadPolicy::default(),
            pad_min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl TrainingSettings {
    pub fn with_limits(mut self, limits: WindowLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_min_series_points(mut self, points: usize) -> Self {
        self.min_series_points = points;
        self
    }

    pub fn with_pad_policy(mut self, policy: PadPolicy) -> Self {
        self.pad_policy = policy;
        self
    }
}

/// Categorical values seen while training.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub services: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub currencies: BTreeSet<String>,
}

/// A provider's series cut and sized for one training run.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub provider: CloudProvider,
    /// Plan derived from the full span, before per-series refinement
    pub initial_plan: WindowPlan,
    /// Plan that fits the shortest retained series
    pub plan: WindowPlan,
    /// Point count a series needed to be retained
    pub min_series_length: usize,
    /// Last `time_idx` in the training partition
    pub cutoff: i64,
    /// Retained series after calendar repair and padding
    pub series: Vec<TimeSeries>,
    /// Series dropped by the retention threshold
    pub dropped: Vec<SeriesKey>,
}

impl TrainingSet {
    /// Series truncated at the cutoff.
    ///
    /// Falls back to the full series when the cutoff leaves nothing.
    pub fn training_series(&self) -> Vec<TimeSeries> {
        let truncated: Vec<TimeSeries> = self
            .series
            .iter()
            .map(|s| s.truncated_at(self.cutoff))
            .filter(|s| !s.is_empty())
            .collect();

        if truncated.is_empty() {
            self.series.clone()
        } else {
            truncated
        }
    }

    /// Full series, used for validation.
    pub fn validation_series(&self) -> &[TimeSeries] {
        &self.series
    }

    pub fn shortest_series(&self) -> usize {
        self.series.iter().map(|s| s.len()).min().unwrap_or(0)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        let mut vocabulary = Vocabulary::default();
        for series in &self.series {
            vocabulary.services.insert(series.key.service.clone());
            for point in &series.points {
                vocabulary.regions.insert(point.region.clone());
                vocabulary.currencies.insert(point.currency.clone());
            }
        }
        vocabulary
    }
}

/// Prepare `provider`'s rows for training.
///
/// Plans windows from the overall span, drops series below the retention
/// threshold, repairs calendars, pads too-short series, refines the plan to
/// the shortest survivor and places the training cutoff. Rows belonging to
/// other providers are ignored.
pub fn prepare_training_set(
    provider: CloudProvider,
    rows: &[CostObservation],
    settings: &TrainingSettings,
) -> SeriesResult<TrainingSet> {
    let tag = provider.tag();
    let own: Vec<CostObservation> = rows
        .iter()
        .filter(|r| r.provider == provider)
        .cloned()
        .collect();
    if own.len() < rows.len() {
        debug!("[{}] Ignoring {} row(s) from other providers", tag, rows.len() - own.len());
    }

    let series = group_by_series_key(&own);
    let max_time_idx = series
        .iter()
        .filter_map(|s| s.max_time_idx())
        .max()
        .ok_or(SeriesError::NoHistory { provider })?;

    let total_periods = (max_time_idx + 1).max(0) as usize;
    let initial_plan = WindowPlan::plan(total_periods, &settings.limits);
    debug!(
        "[{}] Span of {} day(s) gives initial plan encoder={} horizon={}",
        tag, total_periods, initial_plan.encoder_length, initial_plan.prediction_length
    );

    let max_points = series.iter().map(|s| s.len()).max().unwrap_or(0);
    if max_points == 0 {
        return Err(SeriesError::NoHistory { provider });
    }
    let min_series_length =
        effective_min_series_length(&initial_plan, settings.min_series_points, max_points);

    let (kept, dropped): (Vec<TimeSeries>, Vec<TimeSeries>) = series
        .into_iter()
        .partition(|s| s.len() >= min_series_length);
    let dropped: Vec<SeriesKey> = dropped.into_iter().map(|s| s.key).collect();
    for key in &dropped {
        warn!(
            "[{}] Dropping {}: fewer than {} points",
            tag, key.service, min_series_length
        );
    }

    if kept.is_empty() {
        return Err(SeriesError::DataInsufficient {
            provider,
            required: min_series_length,
        });
    }

    let mut series = normalize_calendar(kept);
    let shortest = series.iter().map(|s| s.len()).min().unwrap_or(0);
    if shortest < settings.pad_min_points {
        series = pad_short_series(series, settings.pad_min_points, settings.pad_policy);
    }
    let shortest = series.iter().map(|s| s.len()).min().unwrap_or(0);

    let plan = initial_plan.refine(shortest)?;

    let min_time = series.iter().filter_map(|s| s.min_time_idx()).min().unwrap_or(0);
    let max_time = series.iter().filter_map(|s| s.max_time_idx()).max().unwrap_or(0);
    let cutoff = training_cutoff(min_time, max_time, plan.prediction_length);

    info!(
        "[{}] Prepared {} series (dropped {}): encoder={} horizon={} cutoff={}",
        tag,
        series.len(),
        dropped.len(),
        plan.encoder_length,
        plan.prediction_length,
        cutoff
    );

    Ok(TrainingSet {
        provider,
        initial_plan,
        plan,
        min_series_length,
        cutoff,
        series,
        dropped,
    })
}
