//! Platesim Core -- discrete-event simulation of an electroplating line.
//!
//! A fixed row of chemical baths is served by a single crane that moves
//! carrier drums between them. Each drum may hold one work order; each
//! order follows the routing of its process type through the line until it
//! returns to the load point.
//!
//! # Tick Pipeline
//!
//! Each call to [`plant::Plant::tick`] advances simulated time by one step:
//!
//! 1. **Baths** -- The clock moves forward and every enabled bath runs its
//!    dwell timer. Expired timers load orders, request the crane, or unload
//!    finished work.
//! 2. **Transport** -- The crane runs its current phase and hands carriers
//!    over at drain and drop boundaries.
//! 3. **Dispatch** -- An idle crane serves the oldest request whose carrier
//!    has a free destination.
//!
//! # Key Types
//!
//! - [`plant::Plant`] -- Owns baths, carriers, orders and the crane.
//! - [`bath::Bath`] -- Station with a tagged [`bath::BathStatus`] state machine.
//! - [`transport::Transport`] -- The crane and its timed phase queue.
//! - [`scheduler::SchedulerKind`] -- Dispatch policy (first come, first served).
//! - [`dwell`] -- Dwell-time lookup and silver deposition time.
//! - [`sim::Simulation`] -- Driver with start/pause/resume/reset and a
//!   wall-clock pump.
//! - [`event::EventBuffer`] -- Ring buffer of timed plant events.
//! - [`log::Logger`] -- Severity logging contract, with a `tracing` backend.

pub mod bath;
pub mod carrier;
pub mod config;
pub mod dwell;
pub mod error;
pub mod event;
pub mod fixed;
pub mod id;
pub mod log;
pub mod order;
pub mod plant;
pub mod query;
pub mod scheduler;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
