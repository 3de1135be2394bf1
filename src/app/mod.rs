pub mod controllers;
pub mod runner;

pub use runner::{DemoRunner, Scenario, ScenarioReport};
