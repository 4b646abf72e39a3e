//! Circular dependency detection infrastructure.

use std::future::Future;

use crate::error::{DiError, DiResult};
use crate::Token;

tokio::task_local! {
    // Graph of the binding whose factory or hook is currently running.
    static ACTIVE_GRAPH: DependencyGraph;
}

/// Tokens currently under construction along one resolution path.
///
/// Each frame extends its parent's graph instead of mutating shared state, so
/// concurrent resolutions on different tasks never see each other's entries.
///
/// Example chain on failure: `["ServiceA", "ServiceB", "ServiceA"]`
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencyGraph {
    chain: Vec<Token>,
}

impl DependencyGraph {
    /// Fails with the full path when `token` is already pending.
    pub(crate) fn check(&self, token: Token) -> DiResult<()> {
        if self.chain.contains(&token) {
            let mut path: Vec<&'static str> =
                self.chain.iter().map(|t| t.display_name()).collect();
            path.push(token.display_name());
            return Err(DiError::Circular(path));
        }
        Ok(())
    }

    /// Graph for the dependencies of `token`.
    pub(crate) fn push(&self, token: Token, max_depth: usize) -> DiResult<Self> {
        self.check(token)?;
        if self.chain.len() >= max_depth {
            return Err(DiError::DepthExceeded(max_depth));
        }
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend_from_slice(&self.chain);
        chain.push(token);
        Ok(Self { chain })
    }

    pub(crate) fn depth(&self) -> usize {
        self.chain.len()
    }

    #[cfg(test)]
    pub(crate) fn chain(&self) -> &[Token] {
        &self.chain
    }
}

/// Graph installed by the innermost running factory, if any.
pub(crate) fn current_graph() -> Option<DependencyGraph> {
    ACTIVE_GRAPH.try_with(|graph| graph.clone()).ok()
}

/// Runs `fut` with `graph` visible to nested top-level and lazy resolutions.
pub(crate) async fn with_graph<F: Future>(graph: DependencyGraph, fut: F) -> F::Output {
    ACTIVE_GRAPH.scope(graph, fut).await
}
