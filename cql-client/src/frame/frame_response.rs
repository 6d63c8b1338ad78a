use crate::frame::frame_error::ErrorBody;
use crate::frame::rows::Row;

/// Response received from a node, already decoded by the transport.
#[derive(Debug, PartialEq, Clone)]
pub enum Response {
    Ready,
    Authenticate { authenticator: String },
    Result(ResultBody),
    Error(ErrorBody),
}

/// Body of a `RESULT` response.
#[derive(Debug, PartialEq, Clone)]
pub enum ResultBody {
    /// Void result.
    Void,
    /// Rows result.
    Rows(Vec<Row>),
    /// Set keyspace result, containing the new keyspace name.
    SetKeyspace(String),
    /// Prepared result.
    Prepared(PreparedBody),
    /// Schema change result.
    SchemaChange(SchemaChange),
}

/// Identifies a statement prepared on a particular node.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PreparedBody {
    pub id: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SchemaChange {
    pub change: String,
    pub keyspace: String,
    pub table: Option<String>,
}

impl Response {
    #[inline]
    pub fn rows(rows: Vec<Row>) -> Self {
        Response::Result(ResultBody::Rows(rows))
    }

    #[inline]
    pub fn void() -> Self {
        Response::Result(ResultBody::Void)
    }

    #[inline]
    pub fn set_keyspace<K: Into<String>>(keyspace: K) -> Self {
        Response::Result(ResultBody::SetKeyspace(keyspace.into()))
    }
}
