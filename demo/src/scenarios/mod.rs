pub mod execution;
pub mod federation;
pub mod graph;
