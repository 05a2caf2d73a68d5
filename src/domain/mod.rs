// Domain layer: rows, query parameters and the ports the core talks to.

pub mod model;
pub mod ports;
