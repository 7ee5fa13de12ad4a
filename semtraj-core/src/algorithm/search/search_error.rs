use crate::model::network::NetworkError;

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    NetworkError(#[from] NetworkError),
    #[error("{0}")]
    InternalError(String),
}
