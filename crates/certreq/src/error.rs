use thiserror::Error;

/// Error type for key and certificate request operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key pair generation failed
    #[error("Key generation error: {0}")]
    GenerationError(String),

    /// Key import or usage failed
    #[error("Key error: {0}")]
    KeyError(String),

    /// DER/PEM encoding failed
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// DER/PEM decoding failed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Signing failed
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Signature did not verify
    #[error("Invalid signature")]
    InvalidSignature,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
