#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("failure reading fix data from CSV: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },
    #[error("fix data is missing required column '{0}'")]
    MissingColumn(String),
    #[error("unable to parse {field} '{value}': {message}")]
    ParseError {
        field: &'static str,
        value: String,
        message: String,
    },
}
