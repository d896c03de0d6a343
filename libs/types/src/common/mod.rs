//! Identities and error types shared across the consumer crates

pub mod errors;
pub mod identifiers;
