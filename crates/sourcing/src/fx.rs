//! Currency conversion for landed-cost modelling.
//!
//! Lookup resolves direct rates, inverse rates and one-hop cross rates
//! through a shared pivot currency. An unknown pair falls back to 1.0,
//! flagged on the resolution so callers can surface the configuration gap
//! rather than silently mispricing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// ISO-4217 style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a rate was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxPath {
    /// Same currency on both sides.
    Identity,
    Direct,
    Inverse,
    /// One-hop cross rate through the named pivot currency.
    Cross(Currency),
    /// Unknown pair; rate defaulted to 1.0.
    Fallback,
}

/// A resolved conversion rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxResolution {
    pub rate: f64,
    pub path: FxPath,
}

impl FxResolution {
    /// True when the pair was unknown and 1.0 was substituted.
    pub fn is_fallback(&self) -> bool {
        self.path == FxPath::Fallback
    }
}

/// In-memory FX rate table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxTable {
    rates: HashMap<(Currency, Currency), f64>,
}

impl FxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(
        mut self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        rate: f64,
    ) -> Self {
        self.set_rate(from, to, rate);
        self
    }

    pub fn set_rate(&mut self, from: impl Into<Currency>, to: impl Into<Currency>, rate: f64) {
        self.rates.insert((from.into(), to.into()), rate);
    }

    fn direct_or_inverse(&self, from: &Currency, to: &Currency) -> Option<(f64, FxPath)> {
        if let Some(rate) = self.rates.get(&(from.clone(), to.clone())) {
            return Some((*rate, FxPath::Direct));
        }
        self.rates
            .get(&(to.clone(), from.clone()))
            .filter(|r| **r != 0.0)
            .map(|r| (1.0 / *r, FxPath::Inverse))
    }

    /// Resolve the conversion rate from `from` to `to`.
    pub fn resolve(&self, from: &Currency, to: &Currency) -> FxResolution {
        if from == to {
            return FxResolution {
                rate: 1.0,
                path: FxPath::Identity,
            };
        }

        if let Some((rate, path)) = self.direct_or_inverse(from, to) {
            return FxResolution { rate, path };
        }

        // One-hop cross rate: find a pivot reachable from both sides.
        // Iterate in sorted order so resolution is deterministic.
        let mut pivots: Vec<&Currency> = self
            .rates
            .keys()
            .flat_map(|(a, b)| [a, b])
            .filter(|c| *c != from && *c != to)
            .collect();
        pivots.sort();
        pivots.dedup();

        for pivot in pivots {
            if let (Some((leg_a, _)), Some((leg_b, _))) = (
                self.direct_or_inverse(from, pivot),
                self.direct_or_inverse(pivot, to),
            ) {
                return FxResolution {
                    rate: leg_a * leg_b,
                    path: FxPath::Cross(pivot.clone()),
                };
            }
        }

        FxResolution {
            rate: 1.0,
            path: FxPath::Fallback,
        }
    }
}
