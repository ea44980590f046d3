//! # Hermes Cost
//!
//! Monthly cost estimates for dashboard resources.
//!
//! Containers and endpoints are priced per hour and scaled to a month of
//! [`HOURS_PER_MONTH`]; disks and backups are priced per month. The first
//! [`INCLUDED_IOPS`] of every disk are free.
//!
//! ## Example
//!
//! ```
//! use hermes_cost::{estimate_monthly_cost, format_currency, CostInputs, CostRates, ServiceInput};
//!
//! let inputs = CostInputs::new()
//!     .service(ServiceInput::new(2, 1024, "m5"))
//!     .endpoints(1);
//! let cost = estimate_monthly_cost(&inputs, &CostRates::default());
//! println!("{}", format_currency(cost));
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-cost/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod estimate;
mod format;
mod inputs;
mod rates;
mod selector;

pub use estimate::{estimate_monthly_cost, CostBreakdown, HOURS_PER_MONTH, INCLUDED_IOPS};
pub use format::format_currency;
pub use inputs::{BackupInput, CostInputs, DiskInput, ServiceInput};
pub use rates::{ContainerProfile, CostRates};
pub use selector::CostSelector;
