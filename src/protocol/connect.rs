//! Connection parameters.

use crate::error::{Error, Result};

/// Parameters for opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name, if the server requires one.
    pub user: Option<String>,
    /// Password, if the server requires one.
    pub password: Option<String>,
}

impl ConnectParams {
    /// Create new connection parameters without credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            user: None,
            password: None,
        }
    }

    /// Set user name and password.
    ///
    /// # Example
    ///
    /// ```
    /// use nowdb_client::ConnectParams;
    ///
    /// let params = ConnectParams::new("db.example.com", 4321)
    ///     .with_credentials("u", "p");
    /// assert_eq!(params.user.as_deref(), Some("u"));
    /// ```
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Build parameters from the textual form used by `Connection::connect`.
    ///
    /// Empty user or password strings mean "no credentials".
    pub fn from_parts(server: &str, port: &str, user: &str, password: &str) -> Result<Self> {
        let port = parse_port(port)?;
        if server.is_empty() {
            return Err(Error::client("Invalid connect string: empty host"));
        }
        Ok(Self {
            host: server.to_string(),
            port,
            user: non_empty(user),
            password: non_empty(password),
        })
    }

    /// Parse a connection string like "user:password@host:port".
    ///
    /// Credentials are optional; the port is not.
    pub fn parse(conn_str: &str) -> Result<Self> {
        let (creds, addr) = match conn_str.rsplit_once('@') {
            Some((c, a)) => (Some(c), a),
            None => (None, conn_str),
        };

        let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
            Error::client("Invalid connect string: expected [user[:password]@]host:port")
        })?;
        if host.is_empty() {
            return Err(Error::client("Invalid connect string: empty host"));
        }

        let mut params = Self::new(host, parse_port(port)?);
        if let Some(creds) = creds {
            match creds.split_once(':') {
                Some((u, p)) => {
                    params.user = non_empty(u);
                    params.password = non_empty(p);
                }
                None => params.user = non_empty(creds),
            }
        }
        Ok(params)
    }

    /// Address in "host:port" form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .map_err(|_| Error::client(format!("Invalid port: {}", port)))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
