//! Error types for Pokedex

/// Result type alias using Pokedex's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Pokedex operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Model artifact could not be fetched
    #[error("download error: {0}")]
    Download(String),

    /// The artifact cannot run in this host environment
    #[error("{remediation}\n\nunderlying error: {details}")]
    IncompatibleArtifact { details: String, remediation: String },

    /// Model loading or shape errors
    #[error("model error: {0}")]
    Model(String),

    /// Upload rejected by the validation stage
    #[error("invalid upload: {0}")]
    Upload(#[from] UploadRejection),

    /// Upload passed validation but could not be decoded
    #[error("image decode error: {0}")]
    Decode(String),

    /// Inference failed inside the model
    #[error("inference error: {0}")]
    Inference(String),

    /// Worker pool is shut down
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable kind, used for error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Download(_) => "download_error",
            Self::IncompatibleArtifact { .. } => "incompatible_artifact",
            Self::Model(_) => "model_error",
            Self::Upload(rejection) => rejection.kind(),
            Self::Decode(_) => "decode_error",
            Self::Inference(_) => "inference_error",
            Self::Unavailable(_) => "unavailable",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Why an upload was refused before any decode or inference was attempted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    /// The multipart form had no `file` field
    #[error("missing form field `{0}`")]
    MissingField(String),

    /// The multipart body itself could not be parsed
    #[error("malformed multipart body: {0}")]
    Malformed(String),

    /// The file field was present but empty
    #[error("uploaded file is empty")]
    Empty,

    /// Payload exceeds the configured limit
    #[error("upload of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Declared content type is not an image
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),

    /// Magic bytes do not match any known raster format
    #[error("payload is not a recognized image format")]
    UnrecognizedFormat,
}

impl UploadRejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::Malformed(_) => "malformed_request",
            Self::Empty => "empty_upload",
            Self::TooLarge { .. } => "payload_too_large",
            Self::UnsupportedContentType(_) => "unsupported_media_type",
            Self::UnrecognizedFormat => "unrecognized_format",
        }
    }
}
