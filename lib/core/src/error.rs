use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while compiling a model spec or scoring a document.
///
/// The first three variants are terminal for the call that raised them:
/// the same spec or input will fail the same way on every retry.
#[derive(Error, Debug)]
pub enum Error {
    /// A construct in the model description is not implemented.
    #[error("Unsupported model spec: {0}")]
    UnsupportedSpec(String),

    /// An expected structural element is missing or inconsistent.
    #[error("Malformed model spec: {0}")]
    MalformedSpec(String),

    /// A runtime input does not fit the compiled model.
    #[error("Evaluation mismatch: {0}")]
    EvaluationMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedSpec(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedSpec(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Error::EvaluationMismatch(msg.into())
    }

    /// True for errors raised at compile time.
    pub fn is_compile_error(&self) -> bool {
        matches!(self, Error::UnsupportedSpec(_) | Error::MalformedSpec(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
