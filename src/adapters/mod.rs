// Adapters layer: concrete organization service implementations.

pub mod memory;
pub mod web_api;

pub use memory::InMemoryService;
pub use web_api::WebApiService;
