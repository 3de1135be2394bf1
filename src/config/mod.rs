#[cfg(feature = "cli")]
pub mod cli;
pub mod connection;
pub mod env_file;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use connection::ConnectionConfig;
pub use env_file::load_env_file;
