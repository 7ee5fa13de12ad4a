use super::{EdgeId, VertexId};

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("edge attribute not found for edge {0}")]
    EdgeNotFound(EdgeId),
    #[error("vertex attribute not found for vertex {0}")]
    VertexNotFound(VertexId),
    #[error("error with provided dataset: {0}")]
    DatasetError(String),
    #[error("{0}")]
    InternalError(String),
}
