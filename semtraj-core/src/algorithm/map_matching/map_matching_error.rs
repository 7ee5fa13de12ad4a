use crate::model::map::MapError;

#[derive(thiserror::Error, Debug)]
pub enum MapMatchingError {
    #[error("invalid map matcher configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    MapError(#[from] MapError),
}
