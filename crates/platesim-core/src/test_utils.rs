//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`; other crates
//! reach them through the `test-utils` feature.

use std::sync::Arc;

use crate::bath::{BathConfig, BathType, RouteRule};
use crate::config::PlantConfig;
use crate::fixed::{Fixed64, Seconds};
use crate::id::BathId;
use crate::log::{Logger, NullLogger, RecordingLogger};
use crate::order::{OrderSpec, ProcessType};
use crate::plant::{CarrierLocation, Plant};

// ===========================================================================
// Three-bath line
// ===========================================================================

/// Silver bath.
pub const PROCESS: BathId = BathId(1);
/// Parking slot, empty unless a second carrier is configured.
pub const PARKING: BathId = BathId(2);
/// Load point and crane start.
pub const LOAD: BathId = BathId(3);

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn route(processes: &[ProcessType], candidates: &[u32]) -> RouteRule {
    RouteRule {
        processes: processes.to_vec(),
        candidates: candidates.iter().map(|&c| BathId(c)).collect(),
    }
}

pub fn typed_bath(name: &str, bath_type: BathType, routes: Vec<RouteRule>) -> BathConfig {
    BathConfig {
        name: Some(name.to_string()),
        enabled: true,
        bath_type: Some(bath_type),
        routes,
        ..BathConfig::default()
    }
}

pub fn silver_order(number: &str, silver_mass: f64, quantity: u32) -> OrderSpec {
    OrderSpec {
        number: number.to_string(),
        material: "test".to_string(),
        process: ProcessType::Silver,
        silver_mass: fixed(silver_mass),
        copper_mass: None,
        quantity,
        overrides: Vec::new(),
    }
}

/// Load point, one silver bath and a parking slot; one carrier; `orders`
/// silver orders of 1 g per 1000 parts, 1000 parts each.
pub fn three_bath_config(orders: usize) -> PlantConfig {
    let baths = vec![
        BathConfig::disabled(),
        typed_bath(
            "silver",
            BathType::Silver,
            vec![route(&[ProcessType::Silver], &[3])],
        ),
        typed_bath(
            "parking",
            BathType::Parking,
            vec![route(&[ProcessType::PlantFilling], &[3])],
        ),
        typed_bath(
            "load",
            BathType::LoadPoint,
            vec![route(&[ProcessType::Silver], &[1])],
        ),
    ];
    let mut config = PlantConfig::new("three-bath", baths, LOAD);
    config.carriers = vec![1];
    config.orders = (1..=orders)
        .map(|n| silver_order(&n.to_string(), 1.0, 1000))
        .collect();
    config
}

/// A straight line of `kinds` at positions `1..=n` followed by a load point
/// at `n + 1`. Work flows one position forward; empty carriers head for the
/// load point. Placement accepts every bath type so any carrier count up to
/// `n + 1` fits.
pub fn linear_line_config(kinds: &[BathType], carriers: usize, orders: usize) -> PlantConfig {
    let load = kinds.len() as u32 + 1;
    let work = [ProcessType::Silver, ProcessType::Rework];
    let mut baths = vec![BathConfig::disabled()];
    for (i, &kind) in kinds.iter().enumerate() {
        let position = i as u32 + 1;
        let mut routes = vec![route(&work, &[position + 1])];
        if position + 1 != load {
            routes.push(route(&[ProcessType::PlantFilling], &[load]));
        }
        baths.push(typed_bath(&format!("b{position}"), kind, routes));
    }
    baths.push(typed_bath(
        "load",
        BathType::LoadPoint,
        vec![route(&work, &[1])],
    ));

    let mut config = PlantConfig::new("linear", baths, BathId(load));
    config.placement = vec![
        BathType::LoadPoint,
        BathType::RinseFlow,
        BathType::Parking,
        BathType::RinseStand,
        BathType::PreTreatment,
        BathType::Silver,
    ];
    config.carriers = (1..=carriers as u32).collect();
    config.orders = (1..=orders)
        .map(|n| silver_order(&n.to_string(), 1.0, 1000))
        .collect();
    config
}

pub fn null_logger() -> Arc<dyn Logger> {
    Arc::new(NullLogger)
}

pub fn three_bath_plant(orders: usize) -> Plant {
    Plant::new(&three_bath_config(orders), null_logger()).expect("three-bath config is valid")
}

/// Build a plant that records every log message.
pub fn recording_plant(config: &PlantConfig) -> (Plant, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::new());
    let plant = Plant::new(config, logger.clone()).expect("config is valid");
    (plant, logger)
}

// ===========================================================================
// Running and checking
// ===========================================================================

/// Tick until `done` holds or `max_ticks` pass. Returns whether `done` held.
pub fn run_until<F>(plant: &mut Plant, step: Seconds, max_ticks: u64, mut done: F) -> bool
where
    F: FnMut(&Plant) -> bool,
{
    for _ in 0..max_ticks {
        if done(plant) {
            return true;
        }
        plant.tick(step);
    }
    done(plant)
}

/// Panic unless every carrier has exactly one holder and every held
/// carrier is registered.
pub fn assert_carrier_exclusivity(plant: &Plant) {
    for (id, carrier) in plant.carriers() {
        let holders: Vec<CarrierLocation> = plant.locate(id);
        assert_eq!(
            holders.len(),
            1,
            "carrier {} at t={} has holders {holders:?}",
            carrier.number(),
            plant.time()
        );
    }
    for bath in plant.baths() {
        if let Some(held) = bath.held_carrier() {
            assert!(plant.carrier(held).is_some(), "bath {} holds unknown carrier", bath.id());
        }
    }
}

/// Panic unless orders on carriers have left the backlog and every
/// unloaded order is marked completed.
pub fn assert_order_consistency(plant: &Plant) {
    use crate::order::OrderStatus;
    for (_, carrier) in plant.carriers() {
        if let Some(order) = carrier.order() {
            let status = plant.order(order).expect("bound order exists").status();
            assert_ne!(status, OrderStatus::Queued, "queued order on a carrier");
        }
    }
    for &order in plant.completed() {
        let status = plant.order(order).expect("completed order exists").status();
        assert_eq!(status, OrderStatus::Completed);
    }
}
