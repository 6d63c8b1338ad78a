use arc_swap::ArcSwap;
use derivative::Derivative;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::*;

use crate::cluster::{Connection, ConnectionManager, QueryResult, RequestRunner};
use crate::consistency::Consistency;
use crate::error::{Error, Result};
use crate::frame::{PreparedBody, Request, Value};

/// Server error code for executing a statement the node does not know.
pub const UNPREPARED_ERROR_CODE: i32 = 0x2500;

type NodeKey = (String, u16);

/// Statement prepared on cluster nodes. Nodes which have not seen the statement yet get it
/// prepared lazily, on first execution.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PreparedStatement {
    query: String,
    #[derivative(Debug = "ignore")]
    connection_manager: Arc<ConnectionManager>,
    request_runner: RequestRunner,
    ids: ArcSwap<HashMap<NodeKey, Vec<u8>>>,
}

impl PreparedStatement {
    pub(crate) async fn prepare(
        query: String,
        connection_manager: Arc<ConnectionManager>,
        request_runner: RequestRunner,
    ) -> Result<Self> {
        let connection = connection_manager.random_connection()?;

        let statement = PreparedStatement {
            query,
            connection_manager,
            request_runner,
            ids: Default::default(),
        };

        statement.prepare_on(&connection).await?;
        Ok(statement)
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Executes the statement with given bound values on an arbitrary connection, with `QUORUM`
    /// consistency unless specified otherwise.
    pub async fn execute(
        &self,
        values: Vec<Value>,
        consistency: Option<Consistency>,
    ) -> Result<QueryResult> {
        let connection = self.connection_manager.random_connection()?;
        let consistency = consistency.unwrap_or_default();

        let id = match self.id_for(&connection) {
            Some(id) => id,
            None => self.prepare_on(&connection).await?,
        };

        match self
            .request_runner
            .execute(
                &connection,
                Request::new_req_execute(id, values.clone(), consistency),
            )
            .await
        {
            Err(Error::Server(body)) if body.code == UNPREPARED_ERROR_CODE => {
                debug!(
                    host = connection.host(),
                    query = %self.query,
                    "Statement unknown to node. Re-preparing."
                );

                let id = self.prepare_on(&connection).await?;
                self.request_runner
                    .execute(
                        &connection,
                        Request::new_req_execute(id, values, consistency),
                    )
                    .await
            }
            result => result,
        }
    }

    fn id_for(&self, connection: &Connection) -> Option<Vec<u8>> {
        self.ids.load().get(&node_key(connection)).cloned()
    }

    async fn prepare_on(&self, connection: &Connection) -> Result<Vec<u8>> {
        let result = self
            .request_runner
            .execute(connection, Request::new_req_prepare(self.query.clone()))
            .await?;

        let PreparedBody { id } = match result {
            QueryResult::Prepared(prepared) => prepared,
            result => {
                return Err(Error::UnexpectedResponse(format!(
                    "Unexpected prepare result: {result:?}"
                )))
            }
        };

        let key = node_key(connection);
        self.ids.rcu(|ids| {
            let mut ids = HashMap::clone(ids);
            ids.insert(key.clone(), id.clone());
            ids
        });

        Ok(id)
    }
}

fn node_key(connection: &Connection) -> NodeKey {
    (connection.host().to_string(), connection.port())
}
