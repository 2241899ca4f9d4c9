// Domain layer: record shapes and the ports the core talks through.

pub mod model;
pub mod ports;
