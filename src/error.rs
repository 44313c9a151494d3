use thiserror::Error;

#[derive(Error, Debug)]
pub enum Text2SqlError {
    #[error("SQL generation failed: {0}")]
    Generation(String),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Text2SqlError {
    /// Stable machine-readable name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Text2SqlError::Generation(_) => "generation",
            Text2SqlError::Execution(_) => "execution",
            Text2SqlError::Rejected(_) => "rejected",
            Text2SqlError::EmptyQuestion => "empty_question",
            Text2SqlError::Config(_) => "config",
            Text2SqlError::Io(_) => "io",
            Text2SqlError::Json(_) => "json",
        }
    }
}

impl From<rusqlite::Error> for Text2SqlError {
    fn from(e: rusqlite::Error) -> Self {
        Text2SqlError::Execution(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Text2SqlError>;
