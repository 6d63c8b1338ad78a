use derive_more::Constructor;

/// Error returned by the server as a response. As in the protocol specification, it contains an
/// error code and an error message.
#[derive(Debug, PartialEq, Eq, Clone, Constructor)]
pub struct ErrorBody {
    /// Protocol error code, e.g. `0x100` for bad credentials.
    pub code: i32,
    /// Error message string.
    pub message: String,
}
