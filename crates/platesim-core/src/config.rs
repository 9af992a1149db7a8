//! Load-time plant description and its validation.

use std::collections::BTreeSet;

use crate::bath::{BathConfig, BathType};
use crate::dwell::{DwellTable, GraceDelays, PlatingConstants};
use crate::error::ConfigError;
use crate::fixed::Fixed64;
use crate::id::BathId;
use crate::order::{OrderSpec, WorkOrder};
use crate::scheduler::SchedulerKind;
use crate::transport::{MAX_PHASE_SECONDS, TransportTiming};

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

fn default_placement() -> Vec<BathType> {
    vec![BathType::LoadPoint, BathType::RinseFlow, BathType::Parking]
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

/// Everything needed to build a [`Plant`](crate::plant::Plant). Immutable
/// once the plant exists.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlantConfig {
    pub name: String,
    /// Index is the physical position; index 0 is the disabled sentinel.
    pub baths: Vec<BathConfig>,
    /// Carrier numbers, placed in this order.
    pub carriers: Vec<u32>,
    /// Initial backlog, oldest first.
    pub orders: Vec<OrderSpec>,
    pub transport_start: BathId,
    #[serde(default)]
    pub scheduler: SchedulerKind,
    #[serde(default)]
    pub timing: TransportTiming,
    #[serde(default)]
    pub dwell: DwellTable,
    #[serde(default)]
    pub grace: GraceDelays,
    #[serde(default)]
    pub plating: PlatingConstants,
    /// Bath types tried, in order, when placing carriers at start-up.
    #[serde(default = "default_placement")]
    pub placement: Vec<BathType>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl PlantConfig {
    /// A config with defaults for every constant; callers fill in the line.
    pub fn new(name: impl Into<String>, baths: Vec<BathConfig>, transport_start: BathId) -> Self {
        Self {
            name: name.into(),
            baths,
            carriers: Vec::new(),
            orders: Vec::new(),
            transport_start,
            scheduler: SchedulerKind::default(),
            timing: TransportTiming::default(),
            dwell: DwellTable::default(),
            grace: GraceDelays::default(),
            plating: PlatingConstants::default(),
            placement: default_placement(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Check every structural rule that does not need a running plant.
    /// Carrier placement is checked by `Plant::new`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.ensure_implemented()?;
        self.timing.validate()?;

        if self.baths.len() < 2 {
            return Err(ConfigError::NoBaths);
        }
        if self.baths[0].enabled {
            return Err(ConfigError::SentinelEnabled);
        }
        let start = self.transport_start.index();
        if start == 0 || start >= self.baths.len() {
            return Err(ConfigError::TransportStartOutOfRange {
                position: self.transport_start,
            });
        }

        for (index, bath) in self.baths.iter().enumerate().skip(1) {
            if bath.enabled {
                self.validate_bath(BathId(index as u32), bath)?;
            }
        }

        if self.plating.silver_current <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveCurrent {
                bath_type: BathType::Silver,
            });
        }
        if self.plating.copper_current <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveCurrent {
                bath_type: BathType::Copper,
            });
        }

        let mut seen = BTreeSet::new();
        for &number in &self.carriers {
            if !seen.insert(number) {
                return Err(ConfigError::DuplicateCarrier { number });
            }
        }

        let available: BTreeSet<BathType> = self
            .baths
            .iter()
            .filter(|b| b.enabled)
            .filter_map(|b| b.bath_type)
            .collect();
        for spec in &self.orders {
            WorkOrder::from_spec(spec)?;
            if let Some(o) = spec
                .overrides
                .iter()
                .find(|o| !available.contains(&o.bath_type))
            {
                return Err(ConfigError::UnroutableOverride {
                    number: spec.number.clone(),
                    bath_type: o.bath_type,
                });
            }
        }
        Ok(())
    }

    fn validate_bath(&self, id: BathId, bath: &BathConfig) -> Result<(), ConfigError> {
        if bath.bath_type.is_none() {
            return Err(ConfigError::UntypedBath { bath: id });
        }
        if let Some(value) = bath.drain.filter(|&d| d > MAX_PHASE_SECONDS) {
            return Err(ConfigError::DrainOutOfRange { bath: id, value });
        }
        for rule in &bath.routes {
            let Some(&process) = rule.processes.first() else {
                return Err(ConfigError::EmptyRoute { bath: id });
            };
            if rule.candidates.is_empty() {
                return Err(ConfigError::EmptyRoute { bath: id });
            }
            for &target in &rule.candidates {
                if target == BathId::SENTINEL {
                    return Err(ConfigError::RouteToSentinel { bath: id, process });
                }
                if target == id {
                    return Err(ConfigError::RouteToSelf { bath: id, process });
                }
                match self.baths.get(target.index()) {
                    None => {
                        return Err(ConfigError::UnknownRouteTarget {
                            bath: id,
                            process,
                            target,
                        });
                    }
                    Some(t) if !t.enabled => {
                        return Err(ConfigError::RouteToDisabled {
                            bath: id,
                            process,
                            target,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}
