// Domain layer: module graph model, run report and ports. No I/O here.

pub mod graph;
pub mod model;
pub mod ports;
pub mod report;
