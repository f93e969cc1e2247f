//! # Overview
//!
//! theatre-flow is a discrete-event simulation of patients moving through a surgical unit: a pool of preparation
//! rooms, one or more operating theatres, and a pool of recovery beds. A patient who finishes surgery while every
//! recovery bed is occupied stays in the theatre, blocking it, until a bed frees up. The crate measures how often that
//! happens, and what it costs, under different capacities and workloads.
//!
//! The crate is layered:
//!
//! * The [`engine`] module is a small, generic event-driven scheduler. A [`Simulation`] owns the model state and a
//!   time-ordered queue of [`Event`]s, each of which receives exclusive access to the state while it executes. Events
//!   scheduled for the same instant run in the order they were scheduled.
//! * The [`hospital`] module is the model itself. Each patient is a [`PatientProcess`] that moves between the event
//!   queue and the waiting lines of the [`ResourcePool`]s it requests, carrying its own continuation along.
//! * A [`Replication`] wires the model to a [`Config`], runs it through a warm-up period and an observation window,
//!   and produces a [`Summary`]. The [`run()`] function does all of that in one call and is a pure function of its
//!   configuration, seed included.
//! * The [`stats`], [`experiment`] and [`factorial`] modules sit on top of [`run()`]: confidence intervals over
//!   replications, paired comparisons under common random numbers, and effect estimates from two-level factorial
//!   designs.
//!
//! Every replication owns its random number generators, one per source of variability, so two configurations run on
//! the same seed see the same arrivals and the same service-time draws wherever their behaviour allows it.
//!
//! # Logging
//!
//! theatre-flow reports through [`tracing`]: replication lifecycle at `debug`, individual patient movements at
//! `trace`. Installing a subscriber is left to the application.
//!
//! [`Event`]: engine::Event
//! [`Simulation`]: engine::Simulation
//! [`PatientProcess`]: hospital::PatientProcess
//! [`ResourcePool`]: resource::ResourcePool
//! [`tracing`]: https://docs.rs/tracing/0.1

pub mod config;
pub mod engine;
mod error;
pub mod experiment;
pub mod factorial;
mod generic_parameters;
pub mod hospital;
pub mod metrics;
pub mod replication;
pub mod resource;
pub mod stats;
pub mod streams;

pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use generic_parameters::{SimState, SimTime, Time};
pub use metrics::{Metric, Summary};
pub use replication::{run, Replication};
