#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layer index out of range: {index}")]
    UnknownLayer { index: usize },
    #[error("node handle out of range: {index}")]
    UnknownNode { index: usize },
    #[error("port handle out of range: {index}")]
    UnknownPort { index: usize },
    #[error("edge `{edge_id}` references an unknown port: {port_id}")]
    MissingEndpoint { edge_id: String, port_id: String },
    #[error("node `{node_id}` names an unknown origin edge: {edge_id}")]
    MissingOrigin { node_id: String, edge_id: String },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
