//! The plant aggregate: baths, carriers, orders and the crane, advanced by
//! a fixed step.
//!
//! # Tick order
//!
//! 1. [`Plant::advance_baths`]: the clock moves forward, then every enabled
//!    bath runs its dwell timer and reacts to expiry.
//! 2. [`Plant::advance_transport`]: the crane runs its current phase, hands
//!    carriers over at drain and drop boundaries, and when idle the
//!    scheduler dispatches the next request in the same tick.
//!
//! Rejected mutations are logged at Error, recorded as
//! [`PlantEvent::InvariantViolated`], and leave state untouched. Nothing in
//! a tick returns an error.

use std::collections::VecDeque;
use std::hash::Hasher;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::bath::{Bath, BathStatusKind, DwellContext};
use crate::carrier::Carrier;
use crate::config::PlantConfig;
use crate::dwell::{DwellTable, GraceDelays, PlatingConstants};
use crate::error::{ConfigError, PlantError};
use crate::event::{EventBuffer, PlantEvent};
use crate::fixed::Seconds;
use crate::id::{BathId, CarrierId, OrderId};
use crate::log::{Logger, Severity};
use crate::order::{OrderStatus, WorkOrder};
use crate::scheduler::SchedulerKind;
use crate::sim::StateHasher;
use crate::transport::{Transport, TransportTiming};

/// Where a carrier is at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierLocation {
    Bath(BathId),
    Transport,
}

#[derive(Debug)]
pub struct Plant {
    name: String,
    /// Index is the physical position; index 0 is the sentinel.
    baths: Vec<Bath>,
    carriers: SlotMap<CarrierId, Carrier>,
    orders: SlotMap<OrderId, WorkOrder>,
    backlog: VecDeque<OrderId>,
    completed: Vec<OrderId>,
    transport: Transport,
    /// Baths waiting for the crane, in arrival order.
    requests: VecDeque<BathId>,
    scheduler: SchedulerKind,
    timing: TransportTiming,
    dwell: DwellTable,
    grace: GraceDelays,
    plating: PlatingConstants,
    time: Seconds,
    events: EventBuffer,
    logger: Arc<dyn Logger>,
}

impl Plant {
    /// Build a plant in its start-up state: orders queued, carriers placed
    /// and waiting, crane idle at its start position.
    pub fn new(config: &PlantConfig, logger: Arc<dyn Logger>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut baths: Vec<Bath> = config
            .baths
            .iter()
            .enumerate()
            .map(|(index, bath)| Bath::new(BathId(index as u32), bath))
            .collect();

        let mut orders = SlotMap::with_key();
        let mut backlog = VecDeque::with_capacity(config.orders.len());
        for spec in &config.orders {
            backlog.push_back(orders.insert(WorkOrder::from_spec(spec)?));
        }

        let mut carriers = SlotMap::with_key();
        for &number in &config.carriers {
            let slot = config.placement.iter().find_map(|&bath_type| {
                baths.iter().position(|b| {
                    b.is_enabled() && b.bath_type() == Some(bath_type) && b.is_free()
                })
            });
            let Some(slot) = slot else {
                return Err(ConfigError::NoSlotForCarrier { number });
            };
            let id = carriers.insert(Carrier::new(number));
            baths[slot].place_initial(id);
            logger.log(
                "Plant:new",
                &format!("carrier {number} placed in bath {slot}"),
                Severity::Info,
            );
        }

        Ok(Self {
            name: config.name.clone(),
            baths,
            carriers,
            orders,
            backlog,
            completed: Vec::new(),
            transport: Transport::new(config.transport_start),
            requests: VecDeque::new(),
            scheduler: config.scheduler,
            timing: config.timing,
            dwell: config.dwell.clone(),
            grace: config.grace,
            plating: config.plating,
            time: 0,
            events: EventBuffer::new(config.event_capacity),
            logger,
        })
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// One full step: baths, then transport and dispatch.
    pub fn tick(&mut self, step: Seconds) {
        self.advance_baths(step);
        self.advance_transport(step);
    }

    /// Move the clock forward and run every enabled bath's dwell timer.
    pub fn advance_baths(&mut self, step: Seconds) {
        self.time += step;
        for index in 0..self.baths.len() {
            let bath = &mut self.baths[index];
            if !bath.is_enabled() {
                continue;
            }
            let id = bath.id();
            match bath.advance(step) {
                Some(BathStatusKind::Working) => {
                    if self.transition(id, BathStatusKind::WaitingFull, None) {
                        self.request_transport(id);
                    }
                }
                Some(BathStatusKind::WaitingEmpty) => self.empty_wait_expired(id),
                Some(BathStatusKind::WaitingToUnload) => self.unload_expired(id),
                _ => {}
            }
        }
    }

    /// Run the crane's current phase and dispatch when it is idle.
    pub fn advance_transport(&mut self, step: Seconds) {
        if let Some(phase) = self.transport.advance(step) {
            if phase.transfers_carrier {
                self.hand_off(phase.origin);
            }
            let position = self.transport.position();
            match self.transport.current_phase().map(|next| next.kind) {
                Some(next) => self.logger.log(
                    "Transport:advance",
                    &format!("{:?} finished at {position}, {next:?} begins", phase.kind),
                    Severity::Info,
                ),
                None => {
                    self.record(PlantEvent::TransportIdle { position });
                    self.logger.log(
                        "Transport:advance",
                        &format!("{:?} finished at {position}, operation finished", phase.kind),
                        Severity::Info,
                    );
                }
            }
        }
        if self.transport.is_idle() && !self.requests.is_empty() {
            self.dispatch();
        }
    }

    /// Serve the first request whose carrier has a free destination. Returns
    /// whether an operation was started. A stall is not an error.
    pub fn dispatch(&mut self) -> bool {
        if !self.transport.is_idle() || self.requests.is_empty() {
            return false;
        }
        let selection =
            self.scheduler
                .select(&self.requests, &self.baths, &self.carriers, &self.orders);

        let dispatched = match selection.dispatch {
            Some(dispatch) => {
                self.requests.remove(dispatch.request);
                let origin = &self.baths[dispatch.origin.index()];
                let drain = origin.drain().unwrap_or(self.timing.drain);
                let carrier = origin.held_carrier();
                self.transport
                    .dispatch(dispatch.origin, dispatch.destination, drain, &self.timing);
                if let Some(carrier) = carrier {
                    self.record(PlantEvent::TransportDispatched {
                        origin: dispatch.origin,
                        destination: dispatch.destination,
                        carrier,
                    });
                }
                self.logger.log(
                    "Plant:dispatch",
                    &format!(
                        "crane {} -> {} ({:?})",
                        dispatch.origin, dispatch.destination, dispatch.process
                    ),
                    Severity::Info,
                );
                true
            }
            None => false,
        };

        for bath in selection.stale {
            self.requests.retain(|&b| b != bath);
            self.logger.log(
                "Plant:dispatch",
                &PlantError::StaleRequest { bath }.to_string(),
                Severity::Warn,
            );
        }
        dispatched
    }

    // -----------------------------------------------------------------------
    // Bath expiry handlers
    // -----------------------------------------------------------------------

    fn empty_wait_expired(&mut self, id: BathId) {
        let bath = &self.baths[id.index()];
        if bath.is_load_point() && !self.backlog.is_empty() {
            if let Some(carrier) = bath.held_carrier() {
                self.load_next_order(id, carrier);
                return;
            }
        }
        if self.transition(id, BathStatusKind::WaitingForTransport, None) {
            self.request_transport(id);
        }
    }

    fn load_next_order(&mut self, id: BathId, carrier: CarrierId) {
        let Some(order) = self.backlog.pop_front() else {
            return;
        };
        let Some(slot) = self.carriers.get_mut(carrier) else {
            self.backlog.push_front(order);
            self.report("Plant:load", PlantError::DanglingCarrier);
            return;
        };
        slot.load(order);
        let previous = self.set_order_status(order, OrderStatus::Loading);

        if self.transition(id, BathStatusKind::Working, None) {
            self.record(PlantEvent::OrderLoaded {
                order,
                carrier,
                bath: id,
            });
            self.logger.log(
                "Plant:load",
                &format!("order loaded into carrier at bath {id}"),
                Severity::Info,
            );
        } else {
            // Roll back so the bath stays consistent with its empty carrier.
            if let Some(slot) = self.carriers.get_mut(carrier) {
                slot.unload();
            }
            if let Some(previous) = previous {
                self.set_order_status(order, previous);
            }
            self.backlog.push_front(order);
        }
    }

    fn unload_expired(&mut self, id: BathId) {
        let Some(carrier) = self.baths[id.index()].held_carrier() else {
            return;
        };
        let Some(order) = self.carriers.get_mut(carrier).and_then(Carrier::unload) else {
            self.transition(id, BathStatusKind::WaitingEmpty, None);
            return;
        };
        self.completed.push(order);
        self.record(PlantEvent::OrderUnloaded {
            order,
            carrier,
            bath: id,
        });
        self.transition(id, BathStatusKind::WaitingEmpty, None);
    }

    fn request_transport(&mut self, id: BathId) {
        self.requests.push_back(id);
        self.record(PlantEvent::TransportRequested { bath: id });
        self.logger.log(
            "Plant:request",
            &format!("bath {id} called the crane"),
            Severity::Info,
        );
    }

    // -----------------------------------------------------------------------
    // Carrier hand-off
    // -----------------------------------------------------------------------

    /// Move the carrier between the crane and the bath at `position`.
    fn hand_off(&mut self, position: BathId) {
        let Some(bath) = self.baths.get(position.index()) else {
            self.report("Plant:hand_off", PlantError::UnknownBath(position));
            return;
        };
        let is_load_point = bath.is_load_point();

        match (bath.held_carrier(), self.transport.carrier()) {
            (Some(carrier), None) => {
                if !self.transition(position, BathStatusKind::Free, None) {
                    return;
                }
                self.transport.pick_up(carrier);
                if let Some(order) = self.carriers.get(carrier).and_then(Carrier::order) {
                    self.set_order_status(order, OrderStatus::Moving);
                }
                self.record(PlantEvent::CarrierPicked {
                    carrier,
                    bath: position,
                });
            }
            (None, Some(carrier)) => {
                let order = self.carriers.get(carrier).and_then(Carrier::order);
                let target = match (order, is_load_point) {
                    (Some(_), true) => BathStatusKind::WaitingToUnload,
                    (Some(_), false) => BathStatusKind::Working,
                    (None, _) => BathStatusKind::WaitingEmpty,
                };
                if !self.transition(position, target, Some(carrier)) {
                    return;
                }
                self.transport.release();
                self.record(PlantEvent::CarrierDropped {
                    carrier,
                    bath: position,
                });
                if let Some(order) = order {
                    if is_load_point {
                        self.set_order_status(order, OrderStatus::Completed);
                        self.record(PlantEvent::OrderCompleted {
                            order,
                            carrier,
                            bath: position,
                        });
                    } else {
                        self.set_order_status(order, OrderStatus::Working);
                    }
                }
            }
            (None, None) => {
                self.report("Plant:hand_off", PlantError::NothingToTransfer { position });
            }
            (Some(held), Some(lifted)) => {
                let error = PlantError::BothSidesOccupied {
                    position,
                    bath_carrier: self.carrier_number(held),
                    transport_carrier: self.carrier_number(lifted),
                };
                self.report("Plant:hand_off", error);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutation helpers
    // -----------------------------------------------------------------------

    /// Apply a bath transition, reporting rejections and degraded results.
    fn transition(
        &mut self,
        id: BathId,
        target: BathStatusKind,
        incoming: Option<CarrierId>,
    ) -> bool {
        let ctx = DwellContext {
            carriers: &self.carriers,
            orders: &self.orders,
            table: &self.dwell,
            plating: &self.plating,
            grace: &self.grace,
        };
        let result = match self.baths.get_mut(id.index()) {
            Some(bath) => bath.set_status(target, incoming, &ctx),
            None => Err(PlantError::UnknownBath(id)),
        };
        match result {
            Ok(transition) => {
                if let Some(issue) = transition.degraded {
                    self.logger
                        .log("Bath:set_status", &issue.to_string(), Severity::Error);
                }
                self.logger.log(
                    "Bath:set_status",
                    &format!("bath {id}: {:?} -> {:?}", transition.from, transition.to),
                    Severity::Info,
                );
                true
            }
            Err(error) => {
                self.report("Bath:set_status", error);
                false
            }
        }
    }

    fn set_order_status(&mut self, order: OrderId, status: OrderStatus) -> Option<OrderStatus> {
        let entry = self.orders.get_mut(order)?;
        let previous = entry.set_status(status);
        let message = format!("order {}: {previous:?} -> {status:?}", entry.number());
        self.logger.log("Order:set_status", &message, Severity::Info);
        Some(previous)
    }

    fn report(&mut self, source: &str, error: PlantError) {
        self.logger.log(source, &error.to_string(), Severity::Error);
        self.record(PlantEvent::InvariantViolated { error });
    }

    fn record(&mut self, event: PlantEvent) {
        self.events.push(self.time, event);
    }

    fn carrier_number(&self, id: CarrierId) -> u32 {
        self.carriers.get(id).map_or(0, Carrier::number)
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> Seconds {
        self.time
    }

    /// All positions, sentinel included.
    pub fn baths(&self) -> &[Bath] {
        &self.baths
    }

    pub fn bath(&self, id: BathId) -> Option<&Bath> {
        self.baths.get(id.index())
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn carrier(&self, id: CarrierId) -> Option<&Carrier> {
        self.carriers.get(id)
    }

    pub fn carriers(&self) -> impl Iterator<Item = (CarrierId, &Carrier)> {
        self.carriers.iter()
    }

    pub fn order(&self, id: OrderId) -> Option<&WorkOrder> {
        self.orders.get(id)
    }

    pub fn orders(&self) -> impl Iterator<Item = (OrderId, &WorkOrder)> {
        self.orders.iter()
    }

    /// Orders not yet loaded, oldest first.
    pub fn backlog(&self) -> impl ExactSizeIterator<Item = OrderId> + '_ {
        self.backlog.iter().copied()
    }

    /// Unloaded orders in completion order.
    pub fn completed(&self) -> &[OrderId] {
        &self.completed
    }

    /// Pending transport requests in arrival order.
    pub fn requests(&self) -> impl ExactSizeIterator<Item = BathId> + '_ {
        self.requests.iter().copied()
    }

    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Every holder of `carrier`. Exactly one entry while the plant is
    /// consistent.
    pub fn locate(&self, carrier: CarrierId) -> Vec<CarrierLocation> {
        let mut found: Vec<CarrierLocation> = self
            .baths
            .iter()
            .filter(|b| b.held_carrier() == Some(carrier))
            .map(|b| CarrierLocation::Bath(b.id()))
            .collect();
        if self.transport.carrier() == Some(carrier) {
            found.push(CarrierLocation::Transport);
        }
        found
    }

    /// Deterministic hash of the full dynamic state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHasher::default();
        h.write_u64(self.time);
        for bath in &self.baths {
            h.write_u32(bath.status().kind() as u32);
            h.write_u32(bath.held_carrier().map_or(0, |c| self.carrier_number(c)));
            h.write_u64(bath.status().remaining().unwrap_or(0));
        }
        h.write_u32(self.transport.position().0);
        h.write_u32(
            self.transport
                .carrier()
                .map_or(0, |c| self.carrier_number(c)),
        );
        for phase in self.transport.phases() {
            h.write_u32(phase.kind as u32);
            h.write_u64(phase.remaining);
        }
        h.write_u64(self.transport.cumulative_distance());
        for (_, order) in &self.orders {
            h.write_u32(order.status() as u32);
        }
        h.write_u64(self.backlog.len() as u64);
        h.write_u64(self.completed.len() as u64);
        for bath in &self.requests {
            h.write_u32(bath.0);
        }
        h.finish()
    }
}
