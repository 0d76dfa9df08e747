//! # cast_store
//!
//! Daily cost storage for cloudcast.
//!
//! Rows are keyed by `(date, provider, service)`; writing a row with an
//! existing key replaces it. Reads return one provider's rows inside a
//! lookback window, ordered by service then date.
//!
//! Each provider gets its own store through [`ProviderStores`]. A provider
//! without one is reported as [`StoreError::NotConfigured`].

pub mod error;
pub mod file;
pub mod memory;
pub mod providers;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use file::{parse_lines, FileCostStore};
pub use memory::MemoryCostStore;
pub use providers::ProviderStores;
pub use store::{record_key, window_start, CostStore, RecordKey, UpsertReport};
