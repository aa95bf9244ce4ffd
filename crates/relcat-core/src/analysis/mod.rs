//! Dependency analysis over the foreign-key graph.

mod cycles;
mod graph;

pub use graph::{DependencyGraph, TopologicalOrder};
