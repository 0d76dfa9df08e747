//! # cast_series
//!
//! Cost time-series handling for cloudcast.
//!
//! This crate turns irregular daily billing rows into the fixed-shape series
//! the forecasters are trained on.
//!
//! # Architecture
//!
//! - **Model**: `CostObservation` rows, `SeriesKey`/`GroupKey` identities and
//!   dated `TimeSeries` on a shared `time_idx` axis
//! - **Calendar**: gap repair with zero-cost days and categorical fill
//! - **Padding**: leading synthetic points for too-short series
//! - **Window**: encoder/prediction length planning and refinement
//! - **Training**: the end-to-end preparation of one provider's training set
//!
//! # Example
//!
//! ```rust,ignore
//! use cast_series::{prepare_training_set, CloudProvider, TrainingSettings};
//!
//! let set = prepare_training_set(CloudProvider::Gcp, &rows, &TrainingSettings::default())?;
//! println!(
//!     "encoder={} horizon={} cutoff={}",
//!     set.plan.encoder_length, set.plan.prediction_length, set.cutoff
//! );
//! ```

pub mod calendar;
pub mod error;
pub mod model;
pub mod padding;
pub mod provider;
pub mod training;
pub mod window;

pub use calendar::{fill_categorical, normalize_calendar, UNKNOWN};
pub use error::{SeriesError, SeriesResult};
pub use model::{
    group_by_group_key, group_by_series_key, CostObservation, GroupKey, PointOrigin,
    SeriesKey, SeriesPoint, TimeSeries,
};
pub use padding::{pad_short_series, PadPolicy, DEFAULT_MIN_POINTS};
pub use provider::CloudProvider;
pub use training::{prepare_training_set, TrainingSet, TrainingSettings, Vocabulary};
pub use window::{effective_min_series_length, training_cutoff, WindowLimits, WindowPlan};
