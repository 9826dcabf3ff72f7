use thiserror::Error;

pub type Result<T> = std::result::Result<T, RbacError>;

#[derive(Error, Debug)]
pub enum RbacError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
