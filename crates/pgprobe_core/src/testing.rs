//! In-memory connector and session for exercising the runner without a server,
//! plus a minimal wire-protocol server for exercising the live connector.

use std::cell::{Cell, RefCell};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::rc::Rc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::ProbeError;
use crate::models::{
    ConnectionConfig, ConnectionIdentity, ExtensionStatus, Password, ServerVersion,
};
use crate::services::connection::{Connector, DiagnosticSession};

#[derive(Clone, Copy)]
enum Failure {
    /// Server rejects the query
    Query,
    /// Server goes away mid-query
    Dropped,
}

/// Scripted [`DiagnosticSession`] that records the queries it receives.
pub struct FakeSession {
    version: String,
    extension_version: Option<String>,
    identity: ConnectionIdentity,
    fail_on: Option<(&'static str, Failure)>,
    calls: Rc<RefCell<Vec<String>>>,
    closed: Rc<Cell<bool>>,
}

impl FakeSession {
    /// A server with pgvector installed, bound on a pod address.
    pub fn healthy() -> Self {
        Self {
            version: "PostgreSQL 16.4 (Debian 16.4-1.pgdg120+2) on x86_64-pc-linux-gnu".into(),
            extension_version: Some("0.8.0".into()),
            identity: ConnectionIdentity {
                server_addr: Some(IpAddr::V4(Ipv4Addr::new(10, 42, 1, 23))),
                server_port: Some(5432),
                database: "carimbo".into(),
                user: "postgres".into(),
            },
            fail_on: None,
            calls: Rc::default(),
            closed: Rc::default(),
        }
    }

    pub fn without_extension(mut self) -> Self {
        self.extension_version = None;
        self
    }

    pub fn with_identity(mut self, identity: ConnectionIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Make `query` ("version", "extension" or "identity") fail with a server error.
    pub fn failing_on(mut self, query: &'static str) -> Self {
        self.fail_on = Some((query, Failure::Query));
        self
    }

    /// Make `query` fail as if the server closed the connection.
    pub fn dropping_on(mut self, query: &'static str) -> Self {
        self.fail_on = Some((query, Failure::Dropped));
        self
    }

    /// Queries received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, query: &'static str, call: String) -> Result<(), ProbeError> {
        self.calls.borrow_mut().push(call);
        match self.fail_on {
            Some((q, Failure::Query)) if q == query => Err(ProbeError::query(
                format!("function {query}() does not exist"),
                None,
                None,
                Some("42883".into()),
            )),
            Some((q, Failure::Dropped)) if q == query => {
                Err(ProbeError::connection("server closed the connection unexpectedly"))
            }
            _ => Ok(()),
        }
    }
}

impl DiagnosticSession for FakeSession {
    async fn server_version(&self) -> Result<ServerVersion, ProbeError> {
        self.record("version", "version".into())?;
        Ok(ServerVersion(self.version.clone()))
    }

    async fn extension(&self, name: &str) -> Result<ExtensionStatus, ProbeError> {
        self.record("extension", format!("extension:{name}"))?;
        Ok(match &self.extension_version {
            Some(version) => {
                ExtensionStatus::Installed { name: name.to_string(), version: version.clone() }
            }
            None => ExtensionStatus::Missing { name: name.to_string() },
        })
    }

    async fn connection_identity(&self) -> Result<ConnectionIdentity, ProbeError> {
        self.record("identity", "identity".into())?;
        Ok(self.identity.clone())
    }

    async fn close(self) {
        self.closed.set(true);
    }
}

/// Scripted [`Connector`] handing out one [`FakeSession`] or one error.
pub struct FakeConnector {
    result: RefCell<Option<Result<FakeSession, ProbeError>>>,
    connects: Cell<usize>,
    last_config: RefCell<Option<ConnectionConfig>>,
    closed: Rc<Cell<bool>>,
}

impl FakeConnector {
    pub fn with_session(session: FakeSession) -> Self {
        let closed = session.closed.clone();
        Self {
            result: RefCell::new(Some(Ok(session))),
            connects: Cell::new(0),
            last_config: RefCell::new(None),
            closed,
        }
    }

    pub fn refusing(err: ProbeError) -> Self {
        Self {
            result: RefCell::new(Some(Err(err))),
            connects: Cell::new(0),
            last_config: RefCell::new(None),
            closed: Rc::default(),
        }
    }

    /// Number of connection attempts.
    pub fn connects(&self) -> usize {
        self.connects.get()
    }

    /// Config passed to the last connection attempt.
    pub fn last_config(&self) -> Option<ConnectionConfig> {
        self.last_config.borrow().clone()
    }

    /// Whether the handed-out session was closed.
    pub fn session_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(
        &self,
        config: &ConnectionConfig,
        _password: &Password,
    ) -> Result<FakeSession, ProbeError> {
        self.connects.set(self.connects.get() + 1);
        *self.last_config.borrow_mut() = Some(config.clone());
        self.result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(ProbeError::internal("FakeConnector already used")))
    }
}

// ============================================================================
// FakeServer
// ============================================================================

/// SSLRequest and GSSENCRequest codes; both get an 'N'.
const SSL_REQUEST_CODE: i32 = 80877103;
const GSSENC_REQUEST_CODE: i32 = 80877104;

/// What the fake server does with its single client.
pub enum ServerScript {
    /// Answer the startup packet with a FATAL `ErrorResponse`.
    RejectStartup { code: &'static str, message: &'static str },
    /// Accept the login, then answer the first query with an ERROR `ErrorResponse`.
    FailFirstQuery { code: &'static str, message: &'static str },
}

/// A loopback TCP listener speaking just enough of the PostgreSQL protocol
/// to make tokio-postgres surface a given SQLSTATE.
pub struct FakeServer {
    port: u16,
    task: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start(script: ServerScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = serve(stream, script).await;
            }
        });
        Self { port, task }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: TcpStream, script: ServerScript) -> io::Result<()> {
    read_startup(&mut stream).await?;

    match script {
        ServerScript::RejectStartup { code, message } => {
            stream.write_all(&error_response("FATAL", code, message)).await?;
        }
        ServerScript::FailFirstQuery { code, message } => {
            // AuthenticationOk, ReadyForQuery(idle)
            stream.write_all(&frame(b'R', &0i32.to_be_bytes())).await?;
            stream.write_all(&frame(b'Z', b"I")).await?;

            read_until_sync(&mut stream).await?;
            stream.write_all(&error_response("ERROR", code, message)).await?;
            stream.write_all(&frame(b'Z', b"I")).await?;
        }
    }
    stream.flush().await?;

    // Keep reading until the client hangs up so nothing we sent is reset.
    let mut buf = [0u8; 512];
    while stream.read(&mut buf).await? > 0 {}
    Ok(())
}

/// Read the untagged startup packet, declining any encryption request first.
async fn read_startup(stream: &mut TcpStream) -> io::Result<()> {
    loop {
        let len = stream.read_i32().await? as usize;
        let mut body = vec![0u8; len.saturating_sub(4)];
        stream.read_exact(&mut body).await?;

        let code = body.get(..4).map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]));
        if matches!(code, Some(SSL_REQUEST_CODE) | Some(GSSENC_REQUEST_CODE)) {
            stream.write_all(b"N").await?;
            continue;
        }
        return Ok(());
    }
}

/// Consume tagged frontend messages through the next Sync.
async fn read_until_sync(stream: &mut TcpStream) -> io::Result<()> {
    loop {
        let tag = stream.read_u8().await?;
        let len = stream.read_i32().await? as usize;
        let mut body = vec![0u8; len.saturating_sub(4)];
        stream.read_exact(&mut body).await?;
        if tag == b'S' {
            return Ok(());
        }
    }
}

fn frame(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    out.push(tag);
    out.extend_from_slice(&((body.len() + 4) as i32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn error_response(severity: &str, code: &str, message: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, value) in [(b'S', severity), (b'V', severity), (b'C', code), (b'M', message)] {
        body.push(field);
        body.extend_from_slice(value.as_bytes());
        body.push(0);
    }
    body.push(0);
    frame(b'E', &body)
}
