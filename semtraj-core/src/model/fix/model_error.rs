#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("cannot construct {0} segment from an empty point sequence")]
    EmptySegment(&'static str),
}
