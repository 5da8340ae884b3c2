// Domain layer: fixture records and the ports the agent talks through.

pub mod model;
pub mod ports;
