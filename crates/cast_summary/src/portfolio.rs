//! Summaries across every provider.

use std::collections::BTreeMap;

use cast_series::CloudProvider;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::{ProviderSummary, SpendTotals};
use crate::currency::MIXED_CURRENCY;

/// Why a provider is missing from a portfolio summary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSkip {
    #[error("no cost store configured")]
    NotConfigured,

    #[error("no forecaster registered")]
    UnregisteredProvider,

    #[error("cost store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("no cost history in the last {lookback_days} days")]
    NoHistory { lookback_days: u32 },

    #[error("all {failures} group forecast(s) failed")]
    AllGroupsFailed { failures: usize },

    #[error("summary task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Provider summaries keyed by provider, plus why any provider is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub providers: BTreeMap<CloudProvider, ProviderSummary>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skipped: BTreeMap<CloudProvider, ProviderSkip>,
}

impl PortfolioSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, summary: ProviderSummary) {
        self.skipped.remove(&summary.provider);
        self.providers.insert(summary.provider, summary);
    }

    /// Record why `provider` has no summary.
    pub fn skip(&mut self, provider: CloudProvider, reason: ProviderSkip) {
        self.skipped.insert(provider, reason);
    }

    pub fn get(&self, provider: CloudProvider) -> Option<&ProviderSummary> {
        self.providers.get(&provider)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Shared currency of every provider, or `"mixed"`.
    pub fn currency(&self) -> Option<&str> {
        let mut currencies = self.providers.values().map(|s| s.currency.as_str());
        let first = currencies.next()?;
        if first != MIXED_CURRENCY && currencies.all(|c| c == first) {
            Some(first)
        } else {
            Some(MIXED_CURRENCY)
        }
    }

    /// Totals across providers, only when they share one currency.
    pub fn grand_total(&self) -> Option<SpendTotals> {
        if self.currency()? == MIXED_CURRENCY {
            return None;
        }
        let mut totals = SpendTotals::default();
        for summary in self.providers.values() {
            totals.add(&summary.totals());
        }
        Some(totals)
    }
}
