pub mod account;
pub mod contact;
pub mod incident;

pub use account::{AccountChanges, AccountController};
pub use contact::{ContactChanges, ContactController};
pub use incident::{IncidentChanges, IncidentController};
