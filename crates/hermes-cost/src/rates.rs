//! Rate tables.

use serde::{Deserialize, Serialize};

/// Container profile, chosen by the first letter of the instance class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerProfile {
    /// `m*` and anything unrecognized.
    GeneralPurpose,
    /// `r*`
    RamOptimized,
    /// `c*`
    CpuOptimized,
}

impl ContainerProfile {
    /// Picks the profile for an instance class such as `m5` or `r6g`.
    ///
    /// ```
    /// use hermes_cost::ContainerProfile;
    ///
    /// assert_eq!(ContainerProfile::from_class("r5"), ContainerProfile::RamOptimized);
    /// assert_eq!(ContainerProfile::from_class("c5"), ContainerProfile::CpuOptimized);
    /// assert_eq!(ContainerProfile::from_class(""), ContainerProfile::GeneralPurpose);
    /// ```
    #[must_use]
    pub fn from_class(instance_class: &str) -> Self {
        match instance_class.chars().next() {
            Some('r' | 'R') => Self::RamOptimized,
            Some('c' | 'C') => Self::CpuOptimized,
            _ => Self::GeneralPurpose,
        }
    }
}

/// Prices used by the estimator.
///
/// Container and endpoint rates are hourly; storage rates are monthly.
/// Missing fields fall back to the defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostRates {
    /// General purpose container memory, per GB-hour.
    pub m_class_gb_per_hour: f64,
    /// RAM-optimized container memory, per GB-hour.
    pub r_class_gb_per_hour: f64,
    /// CPU-optimized container memory, per GB-hour.
    pub c_class_gb_per_hour: f64,
    /// One endpoint (vhost), per hour.
    pub vhost_per_hour: f64,
    /// Database disk, per GB-month.
    pub disk_gb_per_month: f64,
    /// Provisioned IOPS above the included baseline, per IOPS-month.
    pub iops_per_month: f64,
    /// Backup storage, per GB-month.
    pub backup_gb_per_month: f64,
}

impl CostRates {
    /// Returns the GB-hour rate of a container profile.
    #[must_use]
    pub const fn container_rate(&self, profile: ContainerProfile) -> f64 {
        match profile {
            ContainerProfile::GeneralPurpose => self.m_class_gb_per_hour,
            ContainerProfile::RamOptimized => self.r_class_gb_per_hour,
            ContainerProfile::CpuOptimized => self.c_class_gb_per_hour,
        }
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            m_class_gb_per_hour: 0.08,
            r_class_gb_per_hour: 0.05,
            c_class_gb_per_hour: 0.10,
            vhost_per_hour: 0.05,
            disk_gb_per_month: 0.20,
            iops_per_month: 0.01,
            backup_gb_per_month: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_prefixes() {
        assert_eq!(ContainerProfile::from_class("m5"), ContainerProfile::GeneralPurpose);
        assert_eq!(ContainerProfile::from_class("r6g"), ContainerProfile::RamOptimized);
        assert_eq!(ContainerProfile::from_class("c5"), ContainerProfile::CpuOptimized);
        assert_eq!(ContainerProfile::from_class("t3"), ContainerProfile::GeneralPurpose);
    }

    #[test]
    fn test_container_rate_by_profile() {
        let rates = CostRates::default();
        assert!((rates.container_rate(ContainerProfile::RamOptimized) - 0.05).abs() < f64::EPSILON);
        assert!((rates.container_rate(ContainerProfile::CpuOptimized) - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_rate_table() {
        let rates: CostRates = serde_json::from_str(r#"{ "vhost_per_hour": 0.1 }"#).unwrap();
        assert!((rates.vhost_per_hour - 0.1).abs() < f64::EPSILON);
        assert_eq!(rates.disk_gb_per_month, CostRates::default().disk_gb_per_month);
    }

    #[test]
    fn test_unknown_rate_rejected() {
        let result = serde_json::from_str::<CostRates>(r#"{ "gpu_per_hour": 1.0 }"#);
        assert!(result.is_err());
    }
}
