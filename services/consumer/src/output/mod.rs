//! Output side of the consumer: local dispatch of accepted events
//!
//! Events leave a reader through a [`LocalConsumerQueue`] selected by the
//! subscription's [`QueueListenerInfo`], and reach application code through
//! [`ConsumerWorkers`] calling an [`EventHandler`].

pub mod listener;
pub mod local_queue;
pub mod worker;

pub use listener::{LocalQueueKey, QueueListenerInfo};
pub use local_queue::{LocalConsumerQueue, PushOutcome};
pub use worker::{ConsumerWorkers, EventHandler};
