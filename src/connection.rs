//! High-level Connection API for the NoWDB client.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::connect::ConnectParams;
use crate::protocol::transport::{SessionHandle, Transport};
use crate::result::QueryResult;
use crate::runtime::{Runtime, Shared};

/// A session with a NoWDB server.
///
/// Results and cursors borrow the connection, so it can only be closed
/// once all of them are gone. Dropping a connection closes it. A connection
/// keeps its runtime's library alive until the session is released.
pub struct Connection {
    runtime: Arc<Shared>,
    /// Session handle; `None` once closed.
    session: Option<SessionHandle>,
    params: ConnectParams,
}

impl Connection {
    /// Connect to a NoWDB server.
    ///
    /// # Arguments
    ///
    /// * `rt` - Initialised client runtime
    /// * `server` - Server host name or address
    /// * `port` - Server port
    /// * `user` - User name (empty for none)
    /// * `password` - Password (empty for none)
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use nowdb_client::{Connection, Runtime};
    /// use nowdb_client::protocol::memory::MemoryTransport;
    ///
    /// let rt = Runtime::new(Arc::new(MemoryTransport::new()));
    /// let mut conn = Connection::connect(&rt, "db.example.com", "4321", "u", "p")?;
    /// conn.close()?;
    /// # Ok::<(), nowdb_client::Error>(())
    /// ```
    pub fn connect(
        rt: &Runtime,
        server: &str,
        port: &str,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        if !rt.is_initialised() {
            return Err(Error::client("Client is not initialised"));
        }
        let params = ConnectParams::from_parts(server, port, user, password)?;
        Self::connect_with_params(rt, &params)
    }

    /// Connect with explicit connection parameters.
    pub fn connect_with_params(rt: &Runtime, params: &ConnectParams) -> Result<Self> {
        if !rt.is_initialised() {
            return Err(Error::client("Client is not initialised"));
        }
        let runtime = rt.shared();
        let session = runtime.transport().connect(params).map_err(|status| {
            tracing::warn!(address = %params.address(), code = status.code(), "cannot connect");
            Error::server(status.code(), None)
        })?;
        tracing::debug!(address = %params.address(), session = session.0, "connected");

        Ok(Self {
            runtime,
            session: Some(session),
            params: params.clone(),
        })
    }

    /// Parameters this connection was opened with.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Check if the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    fn transport(&self) -> &dyn Transport {
        self.runtime.transport()
    }

    fn session(&self) -> Result<SessionHandle> {
        self.session
            .ok_or_else(|| Error::client("connection is closed"))
    }

    /// Execute a statement and wait for the result.
    ///
    /// A statement the server rejects yields a server error and no result;
    /// the server-side result is released before returning.
    pub fn execute(&self, stmt: &str) -> Result<QueryResult<'_>> {
        let session = self.session()?;
        let handle = self
            .transport()
            .execute_statement(session, stmt)
            .map_err(|status| Error::server(status.code(), None))?;

        let result = QueryResult::new(self.transport(), handle);
        if !self.transport().result_status(handle).is_ok() {
            let err = result.to_server_error();
            tracing::debug!(stmt, error = %err, "statement failed");
            // dropping `result` destroys it
            return Err(err);
        }
        tracing::debug!(stmt, kind = ?result.kind(), "statement executed");
        Ok(result)
    }

    /// Select the database for all subsequent statements.
    ///
    /// Statements that need a database context must come after `use_database`.
    pub fn use_database(&self, db: &str) -> Result<()> {
        let mut result = self.execute(&format!("use {}", db))?;
        result.destroy();
        Ok(())
    }

    /// Close the connection. Closing again is a no-op.
    ///
    /// If the server refuses to close the session, the local session
    /// resource is released anyway and the server error is returned.
    pub fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let status = self.transport().close_connection(session);
        if !status.is_ok() {
            tracing::warn!(
                session = session.0,
                code = status.code(),
                "server refused to close session, releasing locally"
            );
            self.transport().destroy_connection(session);
            return Err(Error::server(status.code(), None));
        }
        tracing::debug!(session = session.0, "connection closed");
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "error closing connection on drop");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.params.address())
            .field("session", &self.session)
            .finish()
    }
}
