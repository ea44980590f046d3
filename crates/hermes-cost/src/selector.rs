//! Memoized estimates.

use parking_lot::Mutex;

use crate::estimate::CostBreakdown;
use crate::inputs::CostInputs;
use crate::rates::CostRates;

#[derive(Debug)]
struct Entry {
    inputs: CostInputs,
    rates: CostRates,
    breakdown: CostBreakdown,
}

/// Caches the last estimate.
///
/// Recomputes only when the inputs or rates differ from the previous call.
/// The cache holds a single entry and nothing else, so the result is always
/// the one [`estimate_monthly_cost`](crate::estimate_monthly_cost) would
/// return for the same arguments.
#[derive(Debug, Default)]
pub struct CostSelector {
    last: Mutex<Option<Entry>>,
}

impl CostSelector {
    /// Creates an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the monthly estimate.
    pub fn estimate(&self, inputs: &CostInputs, rates: &CostRates) -> f64 {
        self.breakdown(inputs, rates).total()
    }

    /// Returns the itemised estimate.
    pub fn breakdown(&self, inputs: &CostInputs, rates: &CostRates) -> CostBreakdown {
        let mut last = self.last.lock();
        if let Some(entry) = last.as_ref() {
            if entry.inputs == *inputs && entry.rates == *rates {
                return entry.breakdown;
            }
        }

        let breakdown = CostBreakdown::compute(inputs, rates);
        tracing::trace!(
            services = inputs.services.len(),
            disks = inputs.disks.len(),
            total = breakdown.total(),
            "cost estimate recomputed"
        );
        *last = Some(Entry {
            inputs: inputs.clone(),
            rates: rates.clone(),
            breakdown,
        });
        breakdown
    }

    /// Returns true if the next call with these arguments is served from
    /// the cache.
    pub fn is_cached(&self, inputs: &CostInputs, rates: &CostRates) -> bool {
        self.last
            .lock()
            .as_ref()
            .is_some_and(|entry| entry.inputs == *inputs && entry.rates == *rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate_monthly_cost;
    use crate::inputs::{DiskInput, ServiceInput};

    #[test]
    fn test_caches_last_inputs() {
        let selector = CostSelector::new();
        let rates = CostRates::default();
        let inputs = CostInputs::new().service(ServiceInput::new(1, 1024, "m5"));

        assert!(!selector.is_cached(&inputs, &rates));
        let first = selector.estimate(&inputs, &rates);
        assert!(selector.is_cached(&inputs, &rates));
        assert_eq!(first.to_bits(), selector.estimate(&inputs, &rates).to_bits());
    }

    #[test]
    fn test_new_inputs_replace_the_entry() {
        let selector = CostSelector::new();
        let rates = CostRates::default();
        let small = CostInputs::new().disk(DiskInput::new(1, 0));
        let large = CostInputs::new().disk(DiskInput::new(100, 0));

        selector.estimate(&small, &rates);
        let cost = selector.estimate(&large, &rates);

        assert!(!selector.is_cached(&small, &rates));
        assert_eq!(cost.to_bits(), estimate_monthly_cost(&large, &rates).to_bits());
    }

    #[test]
    fn test_rate_change_recomputes() {
        let selector = CostSelector::new();
        let inputs = CostInputs::new().endpoints(1);
        let rates = CostRates::default();
        let doubled = CostRates {
            vhost_per_hour: rates.vhost_per_hour * 2.0,
            ..rates.clone()
        };

        let base = selector.estimate(&inputs, &rates);
        let higher = selector.estimate(&inputs, &doubled);
        assert!((higher - 2.0 * base).abs() < 1e-9);
    }
}
