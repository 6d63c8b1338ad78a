use std::io;
use std::result;
use thiserror::Error as ThisError;

use crate::frame::frame_error::ErrorBody;

pub type Result<T> = result::Result<T, Error>;

/// Server error code signalling bad credentials.
pub const AUTHENTICATION_ERROR_CODE: i32 = 0x100;

/// Client error type. Errors either come from the server via error responses, or are raised by
/// the client itself (including errors reported by the transport and reactor collaborators).
#[derive(Debug, ThisError)]
pub enum Error {
    /// Internal IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// General error
    #[error("General error: {0}")]
    General(String),
    /// Error response returned by the server.
    #[error("Server error {}: {}", .0.code, .0.message)]
    Server(ErrorBody),
    /// Timed out waiting for an operation to complete.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// An operation needed a live connection, but none was available.
    #[error("Not connected")]
    NotConnected,
    /// The server rejected or demanded credentials.
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Keyspace name outside of the permitted identifier grammar.
    #[error("Invalid keyspace name: {0}")]
    InvalidKeyspaceName(String),
    /// The server answered with a response kind which makes no sense for the request.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Maps server errors with the authentication code to [`Error::Authentication`], leaving any
    /// other error untouched.
    pub fn reclassify_authentication(self) -> Self {
        match self {
            Error::Server(body) if body.code == AUTHENTICATION_ERROR_CODE => {
                Error::Authentication(body.message)
            }
            error => error,
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::General(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Error {
        Error::General(err.to_string())
    }
}

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::Io(error) => Error::Io(io::Error::new(
                error.kind(),
                error
                    .get_ref()
                    .map(|error| error.to_string())
                    .unwrap_or_default(),
            )),
            Error::General(error) => Error::General(error.clone()),
            Error::Server(body) => Error::Server(body.clone()),
            Error::Timeout(error) => Error::Timeout(error.clone()),
            Error::NotConnected => Error::NotConnected,
            Error::Authentication(error) => Error::Authentication(error.clone()),
            Error::InvalidKeyspaceName(name) => Error::InvalidKeyspaceName(name.clone()),
            Error::UnexpectedResponse(error) => Error::UnexpectedResponse(error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reclassify_authentication_code() {
        let error = Error::Server(ErrorBody::new(
            AUTHENTICATION_ERROR_CODE,
            "Bad credentials".into(),
        ));

        assert!(matches!(
            error.reclassify_authentication(),
            Error::Authentication(message) if message == "Bad credentials"
        ));
    }

    #[test]
    fn should_keep_other_errors() {
        let error = Error::Server(ErrorBody::new(0x2200, "Invalid query".into()));
        assert!(matches!(
            error.reclassify_authentication(),
            Error::Server(body) if body.code == 0x2200
        ));

        assert!(matches!(
            Error::NotConnected.reclassify_authentication(),
            Error::NotConnected
        ));
    }

    #[test]
    fn should_clone_io_error_kind() {
        let error = Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        match error.clone() {
            Error::Io(cloned) => assert_eq!(cloned.kind(), io::ErrorKind::ConnectionRefused),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
