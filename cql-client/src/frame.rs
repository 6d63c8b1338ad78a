//! Typed request and response values exchanged with Cassandra nodes. Encoding them into protocol
//! frames (and decoding responses back) is the responsibility of the
//! [`Transport`](crate::transport::Transport) implementation.

pub mod events;
pub mod frame_error;
pub mod frame_request;
pub mod frame_response;
pub mod rows;

pub use self::events::{
    ServerEvent, SimpleServerEvent, StatusChange, StatusChangeType, TopologyChange,
    TopologyChangeType,
};
pub use self::frame_error::ErrorBody;
pub use self::frame_request::{Request, Value};
pub use self::frame_response::{PreparedBody, Response, ResultBody, SchemaChange};
pub use self::rows::{ColumnValue, FromColumnValue, Row};

/// CQL version sent in the startup request.
pub const CQL_VERSION: &str = "3.0.0";
