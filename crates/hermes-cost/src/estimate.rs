//! The estimator.

use serde::{Deserialize, Serialize};

use crate::inputs::{CostInputs, DiskInput};
use crate::rates::{ContainerProfile, CostRates};

/// Average hours in a month.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Provisioned IOPS included with every disk.
pub const INCLUDED_IOPS: u64 = 3000;

/// An estimate split by line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Container memory, per hour.
    pub services_hourly: f64,
    /// Endpoints, per hour.
    pub endpoints_hourly: f64,
    /// Disk storage, per month.
    pub disk_storage_monthly: f64,
    /// IOPS above the included baseline, per month.
    pub disk_iops_monthly: f64,
    /// Backups, per month.
    pub backups_monthly: f64,
}

impl CostBreakdown {
    /// Prices every line item of `inputs`.
    #[must_use]
    pub fn compute(inputs: &CostInputs, rates: &CostRates) -> Self {
        let services_hourly = inputs
            .services
            .iter()
            .map(|service| {
                let profile = ContainerProfile::from_class(&service.instance_class);
                service.memory_gb() * rates.container_rate(profile)
            })
            .sum();

        let disk_storage_monthly = inputs
            .disks
            .iter()
            .map(|disk| disk.size as f64 * rates.disk_gb_per_month)
            .sum();
        let disk_iops_monthly = inputs
            .disks
            .iter()
            .map(|disk| excess_iops(disk) as f64 * rates.iops_per_month)
            .sum();

        let backups_monthly = inputs
            .backups
            .iter()
            .map(|backup| backup.size as f64 * rates.backup_gb_per_month)
            .sum();

        Self {
            services_hourly,
            endpoints_hourly: f64::from(inputs.endpoint_count) * rates.vhost_per_hour,
            disk_storage_monthly,
            disk_iops_monthly,
            backups_monthly,
        }
    }

    /// Hourly items (containers and endpoints) over a month.
    #[must_use]
    pub fn compute_monthly(&self) -> f64 {
        (self.services_hourly + self.endpoints_hourly) * HOURS_PER_MONTH
    }

    /// Disk storage plus billed IOPS, per month.
    #[must_use]
    pub fn disks_monthly(&self) -> f64 {
        self.disk_storage_monthly + self.disk_iops_monthly
    }

    /// The monthly total.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.compute_monthly() + self.disks_monthly() + self.backups_monthly
    }
}

fn excess_iops(disk: &DiskInput) -> u64 {
    disk.provisioned_iops.saturating_sub(INCLUDED_IOPS)
}

/// Estimates the monthly cost of `inputs` at `rates`.
///
/// ```
/// use hermes_cost::{estimate_monthly_cost, CostInputs, CostRates, DiskInput};
///
/// let inputs = CostInputs::new().disk(DiskInput::new(10, 3000));
/// let rates = CostRates::default();
/// assert!((estimate_monthly_cost(&inputs, &rates) - 10.0 * rates.disk_gb_per_month).abs() < 1e-9);
/// ```
#[must_use]
pub fn estimate_monthly_cost(inputs: &CostInputs, rates: &CostRates) -> f64 {
    CostBreakdown::compute(inputs, rates).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ServiceInput;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_inputs_cost_nothing() {
        assert_eq!(estimate_monthly_cost(&CostInputs::new(), &CostRates::default()), 0.0);
    }

    #[test]
    fn test_services_priced_by_memory_and_class() {
        let rates = CostRates::default();
        let inputs = CostInputs::new()
            .service(ServiceInput::new(2, 2048, "r5"))
            .service(ServiceInput::new(1, 1024, "r5"));

        let expected = 5.0 * rates.r_class_gb_per_hour * HOURS_PER_MONTH;
        assert!(close(estimate_monthly_cost(&inputs, &rates), expected));
    }

    #[test]
    fn test_mixed_classes() {
        let rates = CostRates::default();
        let inputs = CostInputs::new()
            .service(ServiceInput::new(1, 1024, "c5"))
            .service(ServiceInput::new(1, 512, "m5"));

        let breakdown = CostBreakdown::compute(&inputs, &rates);
        let hourly = rates.c_class_gb_per_hour + 0.5 * rates.m_class_gb_per_hour;
        assert!(close(breakdown.services_hourly, hourly));
    }

    #[test]
    fn test_disks_bill_only_excess_iops() {
        let rates = CostRates::default();
        let inputs = CostInputs::new()
            .disk(DiskInput::new(3, 4000))
            .disk(DiskInput::new(2, 2000));

        let expected = 5.0 * rates.disk_gb_per_month + 1000.0 * rates.iops_per_month;
        assert!(close(estimate_monthly_cost(&inputs, &rates), expected));

        let breakdown = CostBreakdown::compute(&inputs, &rates);
        assert!(close(breakdown.disk_iops_monthly, 1000.0 * rates.iops_per_month));
    }

    #[test]
    fn test_endpoints_and_backups() {
        let rates = CostRates::default();
        let inputs = CostInputs::new().endpoints(2).backup(100).backup(50);

        let breakdown = CostBreakdown::compute(&inputs, &rates);
        assert!(close(breakdown.endpoints_hourly, 2.0 * rates.vhost_per_hour));
        assert!(close(breakdown.backups_monthly, 150.0 * rates.backup_gb_per_month));
        assert!(close(
            breakdown.total(),
            2.0 * rates.vhost_per_hour * HOURS_PER_MONTH + 150.0 * rates.backup_gb_per_month
        ));
    }
}
