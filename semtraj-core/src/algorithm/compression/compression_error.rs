#[derive(thiserror::Error, Debug)]
pub enum CompressionError {
    #[error("buffer capacity must be at least 3 to retain start, end, and one interior point, got {0}")]
    InvalidCapacity(usize),
    #[error("cannot compress an empty sequence of fixes")]
    EmptyInput,
}
