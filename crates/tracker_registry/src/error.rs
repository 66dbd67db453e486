//! Registry error types

use contracts::{ContractError, ResultCode};
use thiserror::Error;

/// Registry rejection, mapped onto a protocol result code by [`RegistryError::code`]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Malformed or out-of-range request
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// Add with an empty serial
    #[error("tracker serial must not be empty")]
    BadSerial,

    /// Add with a serial that is already registered
    #[error("tracker '{serial}' is already present")]
    AlreadyPresent { serial: String },

    /// Host refused the device on every attempt
    #[error("failed to spawn tracker '{serial}' after {attempts} attempts")]
    SpawnFailed { serial: String, attempts: u32 },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RegistryError {
    /// Create bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create out-of-range id error
    pub fn unknown_id(id: i32, len: usize) -> Self {
        Self::BadRequest {
            message: format!("tracker id {id} out of range (registered: {len})"),
        }
    }

    /// Result code reported to the client
    pub fn code(&self) -> ResultCode {
        match self {
            Self::BadRequest { .. } => ResultCode::BadRequest,
            Self::BadSerial => ResultCode::BadSerial,
            Self::AlreadyPresent { .. } => ResultCode::AlreadyPresent,
            Self::SpawnFailed { .. } => ResultCode::SpawnFailed,
            Self::Contract(_) => ResultCode::Exception,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(RegistryError::BadSerial.code(), ResultCode::BadSerial);
        assert_eq!(
            RegistryError::unknown_id(4, 1).code(),
            ResultCode::BadRequest
        );
        let err = RegistryError::SpawnFailed {
            serial: "S1".into(),
            attempts: 3,
        };
        assert_eq!(err.code(), ResultCode::SpawnFailed);
        assert!(err.to_string().contains("3 attempts"), "got: {err}");
    }
}
