//! Turning a two-channel delta stream into display events.
pub mod aggregator;
pub mod buffer;

pub use aggregator::{ChunkAggregator, TurnOutcome};
pub use buffer::{BufferState, ChannelBuffer, Push};
