use thiserror::Error;

/// Errors raised while building connectivity, traversing it, or running a
/// prediction pass. All of them are fatal for the pass that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed connectivity: {0}")]
    MalformedConnectivity(String),
    #[error("Corrupt encoding data: {0}")]
    CorruptEncodingData(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Buffer decode error: {0}")]
    BufferError(String),
}

pub type Status = Result<(), CodecError>;

pub type CodecResult<T> = Result<T, CodecError>;

pub fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::MalformedConnectivity(msg.into())
}

pub fn corrupt(msg: impl Into<String>) -> CodecError {
    CodecError::CorruptEncodingData(msg.into())
}

pub fn unsupported(msg: impl Into<String>) -> CodecError {
    CodecError::UnsupportedConfiguration(msg.into())
}
