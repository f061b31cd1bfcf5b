// Domain layer: data models and ports, plus validation of the generation settings.

pub mod model;
pub mod ports;
