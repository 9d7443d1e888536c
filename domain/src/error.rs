use thiserror::Error;

/// Failure kinds of the lab core.
///
/// External-service failures travel unchanged from the Ollama client through
/// the retriever and services to the presentation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabError {
    /// Bad chunking or retrieval parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Empty text submitted for embedding or generation, or a request the
    /// current session state cannot serve.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector does not match the dimensionality of the index.
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding or generation backend could not be reached.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The runtime does not know the requested model.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The backend answered with something we could not interpret.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A document could not be read or extracted.
    #[error("io error: {0}")]
    Io(String),
}

impl LabError {
    /// Short kind name shown to the user next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            LabError::InvalidConfiguration(_) => "InvalidConfiguration",
            LabError::InvalidInput(_) => "InvalidInput",
            LabError::DimensionMismatch { .. } => "DimensionMismatch",
            LabError::ServiceUnavailable(_) => "ServiceUnavailable",
            LabError::ModelNotFound(_) => "ModelNotFound",
            LabError::UnexpectedResponse(_) => "UnexpectedResponse",
            LabError::Io(_) => "Io",
        }
    }

    /// Remediation hint for the user.
    pub fn hint(&self) -> &'static str {
        match self {
            LabError::InvalidConfiguration(_) => {
                "check CHUNK_SIZE, CHUNK_OVERLAP and TOP_K (overlap must be smaller than size)"
            }
            LabError::InvalidInput(_) => "provide non-empty text, and ingest documents before asking",
            LabError::DimensionMismatch { .. } => {
                "re-ingest the documents with the same embedding model used for questions"
            }
            LabError::ServiceUnavailable(_) => "start the model runtime: `ollama serve`",
            LabError::ModelNotFound(_) => "pull the model first: `ollama pull <model>`",
            LabError::UnexpectedResponse(_) => "check that OLLAMA_BASE_URL points at an Ollama server",
            LabError::Io(_) => "check that the file exists and is a readable txt, md, pdf or docx",
        }
    }
}

pub type LabResult<T> = std::result::Result<T, LabError>;
