pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::HttpTransport;
pub use crate::adapters::memory::{MemoryContainer, MemorySurface};
pub use crate::config::ContentConfig;
pub use crate::core::binder::ActionBinder;
pub use crate::core::content::{Content, ContentEnv, ContentOptions, DeleteFailure, SuccessHandler};
pub use crate::core::modal::{ModalManager, ModalSession};
pub use crate::utils::error::{ContentError, Result};
