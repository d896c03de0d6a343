//! Input side of the consumer: fetching and decoding remote queue messages

pub mod classifier;
pub mod client;
pub mod reader;
pub mod supervisor;

pub use classifier::{Classification, ClassifiedEvent, MessageClassifier};
pub use client::{ErrorDetails, MessageClient, MessageClientFactory, Response};
pub use reader::{PollOutcome, QueueReader, ReaderStats};
pub use supervisor::ReaderSupervisor;
