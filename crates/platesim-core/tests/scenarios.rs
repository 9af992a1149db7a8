//! Scenario tests for dispatch order, dwell lookup through the plant, and
//! degraded or stalled operation.

use platesim_core::bath::{BathConfig, BathStatusKind, BathType};
use platesim_core::event::{EventKind, PlantEvent};
use platesim_core::id::BathId;
use platesim_core::log::Severity;
use platesim_core::order::{DwellOverride, OrderStatus, ProcessType};
use platesim_core::plant::Plant;
use platesim_core::config::PlantConfig;
use platesim_core::test_utils::*;

fn dispatched_origins(plant: &Plant) -> Vec<BathId> {
    plant
        .events()
        .iter()
        .filter_map(|e| match e.event {
            PlantEvent::TransportDispatched { origin, .. } => Some(origin),
            _ => None,
        })
        .collect()
}

/// Two parked carriers ask for the crane in the same tick; the earlier
/// request is served first even though the later one is closer.
#[test]
fn fcfs_serves_in_arrival_order() {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "park-a",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[3])],
        ),
        typed_bath(
            "park-b",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[4])],
        ),
        typed_bath("rinse-a", BathType::RinseStand, vec![]),
        typed_bath("rinse-b", BathType::RinseStand, vec![]),
        typed_bath("load", BathType::LoadPoint, vec![]),
    ];
    let mut config = PlantConfig::new("fcfs", baths, BathId(5));
    config.placement = vec![BathType::Parking];
    config.carriers = vec![1, 2];
    let (mut plant, logger) = recording_plant(&config);

    plant.tick(2);
    assert_eq!(dispatched_origins(&plant), vec![BathId(1)]);
    assert_eq!(plant.requests().collect::<Vec<_>>(), vec![BathId(2)]);

    let served = run_until(&mut plant, 2, 500, |p| dispatched_origins(p).len() == 2);
    assert!(served);
    assert_eq!(dispatched_origins(&plant), vec![BathId(1), BathId(2)]);
    assert_eq!(logger.error_count(), 0);
}

/// No free destination: the request waits, nothing is reported as an error.
#[test]
fn stall_leaves_queue_untouched() {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "park-a",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[2])],
        ),
        typed_bath(
            "park-b",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[1])],
        ),
        typed_bath("load", BathType::LoadPoint, vec![]),
    ];
    let mut config = PlantConfig::new("stall", baths, BathId(3));
    config.placement = vec![BathType::Parking];
    config.carriers = vec![1, 2];
    let (mut plant, logger) = recording_plant(&config);

    for _ in 0..50 {
        plant.tick(2);
    }
    assert!(plant.transport().is_idle());
    assert_eq!(
        plant.requests().collect::<Vec<_>>(),
        vec![BathId(1), BathId(2)]
    );
    assert_eq!(logger.error_count(), 0);
    assert_carrier_exclusivity(&plant);
}

fn rinse_line(override_seconds: Option<u64>) -> PlantConfig {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "silver",
            BathType::Silver,
            vec![route(&[ProcessType::Silver], &[2])],
        ),
        typed_bath(
            "rinse",
            BathType::RinseFlow,
            vec![route(&[ProcessType::Silver], &[3])],
        ),
        typed_bath(
            "load",
            BathType::LoadPoint,
            vec![route(&[ProcessType::Silver], &[1])],
        ),
    ];
    let mut config = PlantConfig::new("rinse", baths, BathId(3));
    config.carriers = vec![1];
    let mut order = silver_order("16477107", 0.68, 50_390);
    if let Some(seconds) = override_seconds {
        order.overrides.push(DwellOverride {
            bath_type: BathType::RinseFlow,
            seconds,
        });
    }
    config.orders = vec![order];
    config
}

fn rinse_dwell_on_arrival(config: &PlantConfig) -> Option<u64> {
    let mut plant = Plant::new(config, null_logger()).unwrap();
    let arrived = run_until(&mut plant, 2, 5_000, |p| {
        p.bath(BathId(2)).unwrap().status().kind() == BathStatusKind::Working
    });
    assert!(arrived);
    plant.bath(BathId(2)).unwrap().status().remaining()
}

#[test]
fn order_override_replaces_standard_dwell() {
    assert_eq!(rinse_dwell_on_arrival(&rinse_line(None)), Some(900));
    assert_eq!(rinse_dwell_on_arrival(&rinse_line(Some(300))), Some(300));
}

#[test]
fn silver_dwell_follows_deposition_formula() {
    let config = rinse_line(None);
    let mut plant = Plant::new(&config, null_logger()).unwrap();
    let arrived = run_until(&mut plant, 2, 5_000, |p| {
        p.bath(BathId(1)).unwrap().status().kind() == BathStatusKind::Working
    });
    assert!(arrived);
    // 894.45 * (0.68 * 50.39) / 70 = 437.8
    assert_eq!(plant.bath(BathId(1)).unwrap().status().remaining(), Some(438));
}

/// Copper dwell is unsupported: the plant logs an Error, applies the
/// unlisted-type dwell, and keeps running to completion.
#[test]
fn copper_dwell_degrades_but_completes() {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "copper",
            BathType::Copper,
            vec![route(&[ProcessType::Copper], &[2])],
        ),
        typed_bath(
            "load",
            BathType::LoadPoint,
            vec![route(&[ProcessType::Copper], &[1])],
        ),
    ];
    let mut config = PlantConfig::new("copper", baths, BathId(2));
    config.carriers = vec![1];
    let mut order = silver_order("cu", 1.0, 1000);
    order.process = ProcessType::Copper;
    config.orders = vec![order];
    let (mut plant, logger) = recording_plant(&config);

    let arrived = run_until(&mut plant, 2, 1_000, |p| {
        p.bath(BathId(1)).unwrap().status().kind() == BathStatusKind::Working
    });
    assert!(arrived);
    assert_eq!(plant.bath(BathId(1)).unwrap().status().remaining(), Some(10));

    let errors = logger.with_severity(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("not supported"));

    let done = run_until(&mut plant, 2, 1_000, |p| p.completed().len() == 1);
    assert!(done);
    let (_, order) = plant.orders().next().unwrap();
    assert_eq!(order.status(), OrderStatus::Completed);
    assert!(
        plant
            .events()
            .iter()
            .all(|e| e.event.kind() != EventKind::InvariantViolated)
    );
}

/// A quantity outside the fixed-point range cannot produce a deposition time.
/// The silver bath falls back to the unlisted dwell, logs one Error, and the
/// run carries on.
#[test]
fn oversized_silver_order_degrades_to_unlisted_dwell() {
    let mut config = three_bath_config(0);
    config.orders = vec![silver_order("big", 1.0, 3_000_000_000)];
    assert_eq!(config.validate(), Ok(()));
    let (mut plant, logger) = recording_plant(&config);

    let arrived = run_until(&mut plant, 2, 1_000, |p| {
        p.bath(PROCESS).unwrap().status().kind() == BathStatusKind::Working
    });
    assert!(arrived);
    assert_eq!(plant.bath(PROCESS).unwrap().status().remaining(), Some(10));

    let errors = logger.with_severity(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("overflowed"));

    assert!(run_until(&mut plant, 2, 1_000, |p| p.completed().len() == 1));
}

/// An empty carrier dropped at the load point waits the transport grace
/// delay before the next order is loaded.
#[test]
fn dropped_empty_carrier_waits_grace_before_loading() {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "park",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[2])],
        ),
        typed_bath(
            "load",
            BathType::LoadPoint,
            vec![route(&[ProcessType::Silver], &[1])],
        ),
    ];
    let mut config = PlantConfig::new("grace", baths, BathId(2));
    config.placement = vec![BathType::Parking];
    config.carriers = vec![1];
    config.orders = vec![silver_order("1", 1.0, 1000)];
    let mut plant = Plant::new(&config, null_logger()).unwrap();

    let dropped = run_until(&mut plant, 1, 500, |p| {
        p.bath(BathId(2)).unwrap().status().kind() == BathStatusKind::WaitingEmpty
    });
    assert!(dropped);
    assert_eq!(plant.bath(BathId(2)).unwrap().status().remaining(), Some(5));

    for _ in 0..4 {
        plant.tick(1);
    }
    assert_eq!(plant.backlog().len(), 1);
    plant.tick(1);
    assert_eq!(plant.backlog().len(), 0);
    assert_eq!(
        plant.bath(BathId(2)).unwrap().status().kind(),
        BathStatusKind::Working
    );
}
