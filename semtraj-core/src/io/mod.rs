mod fix_reader;
mod io_error;

pub use fix_reader::{ColumnMapping, CsvFixSource};
pub use io_error::IoError;
