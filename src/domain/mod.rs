// Domain layer: record model and the organization service port.

pub mod model;
pub mod ports;
