pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod policy;
pub mod recommendation;
pub mod store;
pub mod types;

pub use config::AdaptiveConfig;
pub use engine::AdaptiveEngine;
pub use error::{AdaptiveError, AdaptiveResult};
pub use types::*;
