// Domain layer: tweet models, search options and the ports the pipeline is written against.

pub mod model;
pub mod options;
pub mod ports;
