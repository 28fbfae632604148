pub mod container;
pub mod curve;
pub mod distribute;
pub mod graph;
pub mod shapes;
