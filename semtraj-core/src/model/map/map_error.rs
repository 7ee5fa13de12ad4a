use crate::model::network::NetworkError;

#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("failure building spatial index: {0}")]
    BuildError(String),
    #[error("failure matching to map: {0}")]
    MapMatchError(String),
    #[error(transparent)]
    NetworkError(#[from] NetworkError),
}
