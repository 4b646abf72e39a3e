//! Internal implementation details.

pub(crate) mod circular;

pub(crate) use circular::{current_graph, with_graph, DependencyGraph};
