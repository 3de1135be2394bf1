pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryService, WebApiService};
pub use app::controllers::{AccountController, ContactController, IncidentController};
pub use app::{DemoRunner, Scenario, ScenarioReport};
pub use config::ConnectionConfig;
pub use core::gateway::RecordGateway;
pub use utils::error::{CrmError, Result};
