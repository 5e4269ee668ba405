// src/topology/tests.rs

use super::*;
use serde_json::json;
use test_log::test;

fn entries(value: serde_json::Value) -> Vec<DeviceEntry> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn it_should_expand_repetitions_into_one_group_per_light() -> Result<(), VisualizerError> {
    let topology = resolve(&[DeviceEntry::new(2, 3)])?;
    assert_eq!(topology.led_counts(), &[3, 3]);
    assert_eq!(topology.group_count(), 2);
    assert_eq!(topology.total_led_count(), 6);
    Ok(())
}

#[test]
fn it_should_preserve_declaration_order_across_devices() -> Result<(), VisualizerError> {
    let topology = resolve(&[
        DeviceEntry::new(1, 144),
        DeviceEntry::new(2, 10),
        DeviceEntry::new(1, 7),
    ])?;
    assert_eq!(topology.led_counts(), &[144, 10, 10, 7]);
    Ok(())
}

#[test]
fn it_should_keep_totals_consistent_with_the_device_config() -> Result<(), VisualizerError> {
    let config = [
        DeviceEntry::new(5, 144),
        DeviceEntry::new(0, 50),
        DeviceEntry::new(3, 0),
        DeviceEntry::new(4, 22),
    ];
    let topology = resolve(&config)?;

    let expected_groups: usize = 5 + 3 + 4;
    assert_eq!(topology.group_count(), expected_groups);
    assert_eq!(
        topology.led_counts().iter().sum::<usize>(),
        topology.total_led_count()
    );
    assert_eq!(topology.total_led_count(), 5 * 144 + 4 * 22);
    Ok(())
}

#[test]
fn it_should_resolve_an_empty_config_to_an_empty_topology() -> Result<(), VisualizerError> {
    let topology = resolve(&[])?;
    assert_eq!(topology.group_count(), 0);
    assert_eq!(topology.total_led_count(), 0);
    assert!(topology.is_empty());
    Ok(())
}

#[test]
fn it_should_allow_zero_led_groups() -> Result<(), VisualizerError> {
    let topology = resolve(&[DeviceEntry::new(1, 4), DeviceEntry::new(1, 0)])?;
    assert_eq!(topology.led_counts(), &[4, 0]);
    assert!(!topology.is_empty());
    Ok(())
}

#[test]
fn it_should_reject_negative_counts() {
    let config = entries(json!([{"n_lights": 1, "n_leds": 3}, {"n_lights": 2, "n_leds": -1}]));
    assert_eq!(
        resolve(&config),
        Err(VisualizerError::InvalidTopology {
            entry: 1,
            field: "n_leds",
            value: "-1".to_string(),
            reason: NOT_A_COUNT,
        })
    );
}

#[test]
fn it_should_reject_fractional_counts() {
    let config = entries(json!([{"n_lights": 1.5, "n_leds": 3}]));
    assert!(matches!(
        resolve(&config),
        Err(VisualizerError::InvalidTopology {
            entry: 0,
            field: "n_lights",
            ..
        })
    ));
}

#[test]
fn it_should_reject_non_numeric_counts() {
    let config = entries(json!([{"n_lights": 1, "n_leds": "144"}]));
    assert!(matches!(
        resolve(&config),
        Err(VisualizerError::InvalidTopology { field: "n_leds", .. })
    ));
}

#[test]
fn it_should_reject_counts_that_overflow_the_buffer() {
    let half = u64::MAX / 2 + 1;
    assert_eq!(
        resolve(&[DeviceEntry::new(2, half)]),
        Err(VisualizerError::InvalidTopology {
            entry: 0,
            field: "n_leds",
            value: half.to_string(),
            reason: TOO_LARGE,
        })
    );

    // Fits in usize, but not once multiplied into bytes.
    assert!(matches!(
        resolve(&[DeviceEntry::new(1, u64::MAX / 2)]),
        Err(VisualizerError::InvalidTopology { entry: 0, field: "n_leds", .. })
    ));

    // Overflow across entries names the entry that tipped the sum.
    assert!(matches!(
        resolve(&[DeviceEntry::new(1, 3), DeviceEntry::new(1, u64::MAX)]),
        Err(VisualizerError::InvalidTopology { entry: 1, .. })
    ));
}

#[test]
fn it_should_reject_more_lights_than_can_be_allocated() {
    assert!(matches!(
        resolve(&[DeviceEntry::new(u64::MAX, 0)]),
        Err(VisualizerError::InvalidTopology {
            entry: 0,
            field: "n_lights",
            reason: TOO_LARGE,
            ..
        })
    ));
}

#[test]
fn it_should_accept_integral_floats() -> Result<(), VisualizerError> {
    let config = entries(json!([{"n_lights": 2.0, "n_leds": 3}]));
    assert_eq!(resolve(&config)?.led_counts(), &[3, 3]);
    Ok(())
}

#[test]
fn it_should_ignore_extra_entry_fields() -> Result<(), VisualizerError> {
    let config = entries(json!([{"n_lights": 1, "n_leds": 8, "color_profile": "linear"}]));
    assert_eq!(resolve(&config)?.led_counts(), &[8]);
    Ok(())
}

#[test]
fn it_should_report_contiguous_pixel_ranges() {
    let topology = Topology::from_led_counts(vec![3, 0, 2]);
    let ranges: Vec<_> = topology.pixel_ranges().collect();
    assert_eq!(ranges, vec![0..3, 3..3, 3..5]);
}
