use tracing::*;

use crate::cluster::Connection;
use crate::error::{Error, Result};
use crate::frame::{PreparedBody, Request, Response, ResultBody, Row, SchemaChange};

/// Interpreted result of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Void,
    Rows(Vec<Row>),
    /// A `USE` statement succeeded and the connection's session now uses given keyspace.
    KeyspaceChanged(String),
    Prepared(PreparedBody),
    SchemaChanged(SchemaChange),
}

impl QueryResult {
    #[inline]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Executes single requests against chosen connections.
#[derive(Default, Debug, Clone, Copy)]
pub struct RequestRunner;

impl RequestRunner {
    /// Sends given request and interprets the response. Keyspace changes are recorded on the
    /// connection before returning.
    pub async fn execute(&self, connection: &Connection, request: Request) -> Result<QueryResult> {
        let response = connection.write_request(request).await?;
        match response {
            Response::Ready | Response::Result(ResultBody::Void) => Ok(QueryResult::Void),
            Response::Result(ResultBody::Rows(rows)) => Ok(QueryResult::Rows(rows)),
            Response::Result(ResultBody::SetKeyspace(keyspace)) => {
                debug!(host = connection.host(), %keyspace, "Connection keyspace changed.");
                connection.set_keyspace(keyspace.clone());
                Ok(QueryResult::KeyspaceChanged(keyspace))
            }
            Response::Result(ResultBody::Prepared(prepared)) => Ok(QueryResult::Prepared(prepared)),
            Response::Result(ResultBody::SchemaChange(change)) => {
                Ok(QueryResult::SchemaChanged(change))
            }
            Response::Error(body) => Err(Error::Server(body)),
            response => Err(Error::UnexpectedResponse(format!("{response:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use mockall::predicate::eq;
    use std::sync::Arc;

    use super::*;
    use crate::consistency::Consistency;
    use crate::frame::{ErrorBody, SimpleServerEvent};
    use crate::transport::MockTransport;

    fn connection_responding(request: Request, response: Result<Response>) -> Connection {
        let mut transport = MockTransport::new();
        transport
            .expect_write_request()
            .with(eq(request))
            .return_once(move |_| futures::future::ready(response).boxed());

        Connection::new("127.0.0.1".into(), 9042, Arc::new(transport))
    }

    #[tokio::test]
    async fn should_return_rows() {
        let request = Request::new_req_query("SELECT * FROM t", Consistency::One);
        let row: Row = [("id", 1)].into_iter().collect();
        let connection = connection_responding(request.clone(), Ok(Response::rows(vec![row.clone()])));

        let result = RequestRunner.execute(&connection, request).await.unwrap();

        assert_eq!(result, QueryResult::Rows(vec![row]));
    }

    #[tokio::test]
    async fn should_treat_ready_as_void() {
        let request = Request::new_req_register(vec![SimpleServerEvent::StatusChange]);
        let connection = connection_responding(request.clone(), Ok(Response::Ready));

        let result = RequestRunner.execute(&connection, request).await.unwrap();

        assert_eq!(result, QueryResult::Void);
    }

    #[tokio::test]
    async fn should_record_keyspace_change() {
        let request = Request::new_req_use("test_ks");
        let connection = connection_responding(request.clone(), Ok(Response::set_keyspace("test_ks")));

        let result = RequestRunner.execute(&connection, request).await.unwrap();

        assert_eq!(result, QueryResult::KeyspaceChanged("test_ks".into()));
        assert_eq!(connection.keyspace().as_deref(), Some(&"test_ks".to_string()));
    }

    #[tokio::test]
    async fn should_convert_error_responses() {
        let request = Request::new_req_query("SELEKT", Consistency::One);
        let connection = connection_responding(
            request.clone(),
            Ok(Response::Error(ErrorBody::new(0x2000, "Syntax error".into()))),
        );

        let result = RequestRunner.execute(&connection, request).await;

        assert!(matches!(result, Err(Error::Server(body)) if body.code == 0x2000));
    }

    #[tokio::test]
    async fn should_reject_unexpected_responses() {
        let request = Request::new_req_query("SELECT * FROM t", Consistency::One);
        let connection = connection_responding(
            request.clone(),
            Ok(Response::Authenticate {
                authenticator: "org.apache.cassandra.auth.PasswordAuthenticator".into(),
            }),
        );

        let result = RequestRunner.execute(&connection, request).await;

        assert!(matches!(result, Err(Error::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn should_propagate_transport_errors() {
        let request = Request::new_req_query("SELECT * FROM t", Consistency::One);
        let connection = connection_responding(
            request.clone(),
            Err(Error::General("Connection closed while waiting for response!".into())),
        );

        let result = RequestRunner.execute(&connection, request).await;

        assert!(matches!(result, Err(Error::General(_))));
    }
}
