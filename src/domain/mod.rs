// Domain layer: vendor payload models, ports (interfaces) and the pure
// reshaping helpers shared by both tools.

pub mod model;
pub mod ports;
pub mod services;
