pub mod base;
pub mod configs;
pub mod deepseek;
pub mod mock;

pub use base::{CompletionSource, EventStream};
pub use configs::{DeepSeekProviderConfig, ProviderConfig};
pub use deepseek::DeepSeekProvider;
pub use mock::MockProvider;
