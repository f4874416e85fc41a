// Domain layer: request-scoped values and the ports to external systems.

pub mod model;
pub mod ports;
