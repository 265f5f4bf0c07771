use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptLockError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Statement error: {0}")]
    Statement(String),
}

pub type Result<T> = std::result::Result<T, OptLockError>;
