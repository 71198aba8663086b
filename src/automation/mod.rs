//! Quiz automation: configuration, cancellation, input, the answering
//! state machine and the worker that runs it.

pub mod config;
pub mod events;
pub mod input;
pub mod runner;
pub mod state;
pub mod stop;

pub use config::{get_config, init_config, AssistantConfig};
