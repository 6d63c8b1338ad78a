use std::collections::HashMap;

use crate::consistency::Consistency;
use crate::frame::events::SimpleServerEvent;
use crate::frame::CQL_VERSION;

/// Bound value for prepared statement execution, already serialized to its CQL representation.
#[derive(Debug, Clone, PartialEq, Ord, PartialOrd, Eq, Hash)]
pub enum Value {
    Some(Vec<u8>),
    Null,
}

impl Value {
    pub fn new<B>(v: B) -> Value
    where
        B: Into<Vec<u8>>,
    {
        Value::Some(v.into())
    }
}

impl<T: Into<Vec<u8>>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Value::new).unwrap_or(Value::Null)
    }
}

/// Request sent to a node.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Request {
    Startup {
        cql_version: String,
    },
    Credentials(HashMap<String, String>),
    Query {
        query: String,
        consistency: Consistency,
    },
    Prepare {
        query: String,
    },
    Execute {
        id: Vec<u8>,
        values: Vec<Value>,
        consistency: Consistency,
    },
    Register {
        events: Vec<SimpleServerEvent>,
    },
}

impl Request {
    pub fn new_req_startup() -> Request {
        Request::Startup {
            cql_version: CQL_VERSION.into(),
        }
    }

    pub fn new_req_credentials(credentials: HashMap<String, String>) -> Request {
        Request::Credentials(credentials)
    }

    pub fn new_req_query<Q: Into<String>>(query: Q, consistency: Consistency) -> Request {
        Request::Query {
            query: query.into(),
            consistency,
        }
    }

    /// Creates a `USE` query for given, already validated, keyspace name.
    pub fn new_req_use(keyspace: &str) -> Request {
        Self::new_req_query(format!("USE {keyspace}"), Consistency::One)
    }

    pub fn new_req_prepare<Q: Into<String>>(query: Q) -> Request {
        Request::Prepare {
            query: query.into(),
        }
    }

    pub fn new_req_execute(id: Vec<u8>, values: Vec<Value>, consistency: Consistency) -> Request {
        Request::Execute {
            id,
            values,
            consistency,
        }
    }

    pub fn new_req_register(events: Vec<SimpleServerEvent>) -> Request {
        Request::Register { events }
    }
}
