//! Property tests for the estimator.

use hermes_cost::{
    estimate_monthly_cost, CostInputs, CostRates, CostSelector, DiskInput, ServiceInput,
    HOURS_PER_MONTH,
};
use proptest::prelude::*;

fn service() -> impl Strategy<Value = ServiceInput> {
    (
        0u32..20,
        prop::sample::select(vec![256u64, 512, 1024, 2048, 4096, 8192]),
        prop::sample::select(vec!["m5", "r5", "c5", "t3", ""]),
    )
        .prop_map(|(count, memory, class)| ServiceInput::new(count, memory, class))
}

fn disk() -> impl Strategy<Value = DiskInput> {
    (1u64..2000, 0u64..16_000).prop_map(|(size, iops)| DiskInput::new(size, iops))
}

fn inputs() -> impl Strategy<Value = CostInputs> {
    (
        prop::collection::vec(service(), 0..6),
        prop::collection::vec(disk(), 0..4),
        0u32..10,
        prop::collection::vec(0u64..5000, 0..4),
    )
        .prop_map(|(services, disks, endpoints, backups)| {
            let mut inputs = CostInputs {
                services,
                disks,
                endpoint_count: endpoints,
                backups: Vec::new(),
            };
            for size in backups {
                inputs = inputs.backup(size);
            }
            inputs
        })
}

fn rates() -> impl Strategy<Value = CostRates> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..0.5).prop_map(|(m, r, c, vhost)| CostRates {
        m_class_gb_per_hour: m,
        r_class_gb_per_hour: r,
        c_class_gb_per_hour: c,
        vhost_per_hour: vhost,
        ..CostRates::default()
    })
}

proptest! {
    #[test]
    fn prop_same_inputs_same_bits(inputs in inputs(), rates in rates()) {
        let first = estimate_monthly_cost(&inputs, &rates);
        let second = estimate_monthly_cost(&inputs.clone(), &rates.clone());
        prop_assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn prop_selector_matches_estimator(inputs in inputs(), other in inputs(), rates in rates()) {
        let selector = CostSelector::new();
        let direct = estimate_monthly_cost(&inputs, &rates);

        prop_assert_eq!(selector.estimate(&inputs, &rates).to_bits(), direct.to_bits());
        selector.estimate(&other, &rates);
        prop_assert_eq!(selector.estimate(&inputs, &rates).to_bits(), direct.to_bits());
    }

    #[test]
    fn prop_never_negative(inputs in inputs(), rates in rates()) {
        prop_assert!(estimate_monthly_cost(&inputs, &rates) >= 0.0);
    }

    #[test]
    fn prop_iops_under_baseline_are_free(size in 1u64..1000, iops in 0u64..=3000) {
        let rates = CostRates::default();
        let with_iops = CostInputs::new().disk(DiskInput::new(size, iops));
        let without = CostInputs::new().disk(DiskInput::new(size, 0));
        prop_assert_eq!(
            estimate_monthly_cost(&with_iops, &rates).to_bits(),
            estimate_monthly_cost(&without, &rates).to_bits()
        );
    }
}

#[test]
fn test_two_ram_services() {
    let r = 0.07;
    let rates = CostRates {
        r_class_gb_per_hour: r,
        ..CostRates::default()
    };
    let inputs = CostInputs::new()
        .service(ServiceInput::new(2, 2048, "r5"))
        .service(ServiceInput::new(1, 1024, "r5"));

    let cost = estimate_monthly_cost(&inputs, &rates);
    assert!((cost - 5.0 * r * HOURS_PER_MONTH).abs() < 1e-9);
}

#[test]
fn test_disks_with_partial_iops() {
    let rates = CostRates::default();
    let inputs = CostInputs::new()
        .disk(DiskInput::new(3, 4000))
        .disk(DiskInput::new(2, 2000));

    let cost = estimate_monthly_cost(&inputs, &rates);
    let expected = 5.0 * rates.disk_gb_per_month + 1000.0 * rates.iops_per_month;
    assert!((cost - expected).abs() < 1e-9);
}
