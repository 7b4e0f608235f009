//! Data passed between the completion source, the aggregator and the shells.
//!
//! Messages and reasoning records are the durable conversation history. Stream
//! and display events are transient: each one is consumed as soon as it is
//! produced.
pub mod display;
pub mod message;
pub mod role;
pub mod stream;
