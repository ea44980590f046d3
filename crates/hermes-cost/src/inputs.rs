//! Resource descriptors priced by the estimator.

use serde::{Deserialize, Serialize};

/// One app or database service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInput {
    /// Number of containers.
    pub container_count: u32,
    /// Memory limit of each container, in MB.
    pub container_memory_limit_mb: u64,
    /// Instance class, e.g. `m5`.
    #[serde(default)]
    pub instance_class: String,
}

impl ServiceInput {
    /// Creates a service descriptor.
    #[must_use]
    pub fn new(container_count: u32, container_memory_limit_mb: u64, instance_class: &str) -> Self {
        Self {
            container_count,
            container_memory_limit_mb,
            instance_class: instance_class.to_string(),
        }
    }

    /// Total memory across containers, in GB.
    #[must_use]
    pub fn memory_gb(&self) -> f64 {
        f64::from(self.container_count) * self.container_memory_limit_mb as f64 / 1024.0
    }
}

/// One database disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInput {
    /// Size in GB.
    pub size: u64,
    /// Provisioned IOPS.
    #[serde(default)]
    pub provisioned_iops: u64,
}

impl DiskInput {
    /// Creates a disk descriptor.
    #[must_use]
    pub const fn new(size: u64, provisioned_iops: u64) -> Self {
        Self {
            size,
            provisioned_iops,
        }
    }
}

/// One backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInput {
    /// Size in GB.
    pub size: u64,
}

/// Everything priced in one estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostInputs {
    /// App and database services.
    pub services: Vec<ServiceInput>,
    /// Database disks.
    pub disks: Vec<DiskInput>,
    /// Number of endpoints.
    pub endpoint_count: u32,
    /// Backups.
    pub backups: Vec<BackupInput>,
}

impl CostInputs {
    /// Creates an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service.
    pub fn service(mut self, service: ServiceInput) -> Self {
        self.services.push(service);
        self
    }

    /// Adds a disk.
    pub fn disk(mut self, disk: DiskInput) -> Self {
        self.disks.push(disk);
        self
    }

    /// Sets the endpoint count.
    pub fn endpoints(mut self, count: u32) -> Self {
        self.endpoint_count = count;
        self
    }

    /// Adds a backup of `size` GB.
    pub fn backup(mut self, size: u64) -> Self {
        self.backups.push(BackupInput { size });
        self
    }
}
