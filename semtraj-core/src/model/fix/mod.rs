mod compressed_stop;
mod fix;
mod model_error;
mod segment;

pub use compressed_stop::CompressedStop;
pub use fix::Fix;
pub use model_error::ModelError;
pub use segment::{Move, Segment, Stop};
