//! # SIF3 Queue Consumer
//!
//! ## Purpose
//!
//! Consumer side of SIF3 REST messaging. Readers poll remote queues, decode
//! each message's headers into an event, resolve its zone and context against
//! the session, and hand it to a bounded local queue that application code
//! drains.
//!
//! ## Data Flow
//!
//! ```text
//! QueueReader ──get_message()──▶ MessageClient (external)
//!      │
//!      ├─▶ MessageClassifier ──▶ (action, update type, zone, context)
//!      │
//!      └─▶ QueueListenerInfo::local_queue() ──▶ LocalConsumerQueue::push()
//!                                                      │
//!                                   ConsumerWorkers ◀──┘ pop() ──▶ EventHandler
//! ```
//!
//! ## Concurrency
//!
//! - One tokio task per reader; `readers_per_queue` readers per remote queue
//! - Each reader is sequential: fetch, classify, dispatch, maybe wait
//! - A full local queue suspends only the reader feeding it
//! - Every suspension point listens to a `CancellationToken`
//!
//! ## Acknowledgement
//!
//! A message is acknowledged by passing its id to the *next* fetch. A crash
//! between receiving a message and the next fetch means the message is
//! delivered again after restart; [`EventHandler`]s must tolerate duplicates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use consumer_config::ConsumerEnvironment;
//! use consumer_service::{ConsumerContext, MessageClientFactory};
//! use std::sync::Arc;
//!
//! # async fn run(clients: Arc<dyn MessageClientFactory>) -> consumer_service::Result<()> {
//! let environment = ConsumerEnvironment::load("config/consumer.toml")
//!     .map_err(|e| consumer_service::ConsumerError::Configuration(e.to_string()))?;
//! consumer_service::logging::init_tracing(&environment.log_level);
//!
//! let mut consumer = ConsumerContext::new(environment, clients, None)?;
//! consumer.start().await?;
//! // ... spawn workers on the local queues ...
//! consumer.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod environment;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;

pub use context::ConsumerContext;
pub use environment::{
    BrokeredEnvironmentManager, DirectEnvironmentManager, EnvironmentManager,
    EnvironmentManagerKind, ProvisionRequest, SessionProvisioner,
};
pub use error::{ConsumerError, DecodeError, Result, TransportError};
pub use input::{
    Classification, ClassifiedEvent, ErrorDetails, MessageClassifier, MessageClient,
    MessageClientFactory, PollOutcome, QueueReader, ReaderStats, ReaderSupervisor, Response,
};
pub use output::{
    ConsumerWorkers, EventHandler, LocalConsumerQueue, LocalQueueKey, PushOutcome,
    QueueListenerInfo,
};
