#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller contract was broken, e.g. a bundled port that no hypernode owns.
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("compaction constraints contain a cycle ({unresolved} of {node_count} nodes unresolved)")]
    CyclicConstraints { node_count: usize, unresolved: usize },
    #[error(transparent)]
    Graph(#[from] lamantin_lgraph::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
