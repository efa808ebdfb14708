// Domain layer: resource shapes, output rows and the ports the pipeline is wired through.

pub mod model;
pub mod ports;
