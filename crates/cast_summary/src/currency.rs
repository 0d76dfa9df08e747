//! Fixed-rate currency conversion between USD and one local currency.

use std::borrow::Cow;

use cast_series::UNKNOWN;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SummaryError, SummaryResult};

/// ISO code of the US dollar.
pub const USD: &str = "USD";

/// Provider currency tag when services end up in different currencies.
pub const MIXED_CURRENCY: &str = "mixed";

/// Converts amounts into the reporting currency.
///
/// Only the `USD` ↔ `local_currency` pair is known. Amounts in any other
/// currency that differs from the reporting one are left as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConverter {
    reporting_currency: String,
    local_currency: String,
    usd_to_local: f64,
}

/// An amount together with the currency it ended up in.
///
/// `currency` is always an upper-case code.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<'a> {
    pub amount: f64,
    pub currency: Cow<'a, str>,
    /// Whether a rate was applied
    pub converted: bool,
}

impl CurrencyConverter {
    pub fn new(
        reporting_currency: impl Into<String>,
        local_currency: impl Into<String>,
        usd_to_local: f64,
    ) -> SummaryResult<Self> {
        let reporting_currency = normalize_code(reporting_currency.into())?;
        let local_currency = normalize_code(local_currency.into())?;
        if !usd_to_local.is_finite() || usd_to_local <= 0.0 {
            return Err(SummaryError::InvalidRate(usd_to_local));
        }
        Ok(Self {
            reporting_currency,
            local_currency,
            usd_to_local,
        })
    }

    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    pub fn local_currency(&self) -> &str {
        &self.local_currency
    }

    pub fn usd_to_local_rate(&self) -> f64 {
        self.usd_to_local
    }

    pub fn usd_to_local(&self, amount: f64) -> f64 {
        amount * self.usd_to_local
    }

    pub fn local_to_usd(&self, amount: f64) -> f64 {
        amount / self.usd_to_local
    }

    /// Convert `amount` held in `currency` into the reporting currency.
    ///
    /// Codes compare case-insensitively; an unconverted code comes back
    /// upper-cased, except the `unknown` sentinel.
    pub fn convert<'a>(&'a self, amount: f64, currency: &str) -> Converted<'a> {
        let from = currency.trim();
        if from.eq_ignore_ascii_case(&self.reporting_currency) {
            return Converted {
                amount,
                currency: Cow::Borrowed(&self.reporting_currency),
                converted: false,
            };
        }

        let to_local = from.eq_ignore_ascii_case(USD)
            && self.reporting_currency == self.local_currency;
        let to_usd = from.eq_ignore_ascii_case(&self.local_currency)
            && self.reporting_currency == USD;

        if to_local {
            Converted {
                amount: self.usd_to_local(amount),
                currency: Cow::Borrowed(&self.reporting_currency),
                converted: true,
            }
        } else if to_usd {
            Converted {
                amount: self.local_to_usd(amount),
                currency: Cow::Borrowed(&self.reporting_currency),
                converted: true,
            }
        } else {
            debug!(
                "No rate from {} to {}; leaving amount unconverted",
                from, self.reporting_currency
            );
            let code = if from.eq_ignore_ascii_case(UNKNOWN) {
                Cow::Borrowed(UNKNOWN)
            } else {
                Cow::Owned(from.to_ascii_uppercase())
            };
            Converted {
                amount,
                currency: code,
                converted: false,
            }
        }
    }
}

fn normalize_code(code: String) -> SummaryResult<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(SummaryError::InvalidCurrency(code));
    }
    Ok(code)
}
