//! # Consumer Configuration
//!
//! Configuration loading and defaults for the queue consumer.
//!
//! ## Features
//!
//! - **Consumer Environment**: adapter identity, environment type, polling
//!   cadence, local queue sizing and queue subscriptions
//! - **Layered Loading**: TOML file, then `SIF3_`-prefixed environment
//!   variables on top
//! - **Service Defaults**: shared constants used when a value is not configured
//!
//! ## Usage
//!
//! ```rust,no_run
//! use consumer_config::ConsumerEnvironment;
//!
//! let env = ConsumerEnvironment::load("config/consumer.toml").unwrap();
//! println!("polling every {:?}", env.poll_frequency());
//! ```

pub mod environment;
pub mod service;

pub use environment::{
    ConsumerEnvironment, EnvironmentType, LocalQueueBinding, QueueSubscription, RightGrant,
    ServiceEntry,
};
