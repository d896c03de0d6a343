//! Header vocabulary of the REST messaging protocol
//!
//! Only the fields the queue consumer reads are modelled here; the wire
//! encoding itself belongs to the message client.

#[macro_use]
mod macros;

pub mod header;
pub mod values;
