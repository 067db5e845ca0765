//! TCP session to an OLT's TL1 agent.
//!
//! Handles exactly one request/response exchange at a time: write the
//! command, then hand back whatever the first inbound data event carries.
//! No application logic — command assembly and response parsing live in
//! [`crate::encode`] and [`crate::grammar`].

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::ParseError;
use crate::response::OperationResult;

/// TCP port FiberHome EMS units listen on for TL1.
pub const DEFAULT_PORT: u16 = 3337;

/// Default window for a response to arrive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors from session and client operations.
#[derive(Debug)]
pub enum SessionError {
    /// TCP I/O error.
    Io(io::Error),
    /// No response within the configured window.
    Timeout { timeout: Duration },
    /// TCP stream closed by peer.
    Disconnected,
    /// `execute` called after `end()`.
    Closed,
    /// Response grammar error.
    Parse(ParseError),
    /// The remote answered a query with an operation-shaped rejection.
    Denied(OperationResult),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "I/O error: {e}"),
            SessionError::Timeout { timeout } => {
                write!(f, "no response after {timeout:?}")
            }
            SessionError::Disconnected => write!(f, "connection closed by remote"),
            SessionError::Closed => write!(f, "session already ended"),
            SessionError::Parse(e) => write!(f, "parse error: {e}"),
            SessionError::Denied(op) => {
                write!(
                    f,
                    "request denied: {} EN={} ENDESC={}",
                    op.header.completion_code, op.error_code, op.error_description,
                )
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::Parse(e) => Some(e),
            SessionError::Timeout { .. }
            | SessionError::Disconnected
            | SessionError::Closed
            | SessionError::Denied(_) => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl From<ParseError> for SessionError {
    fn from(e: ParseError) -> Self {
        SessionError::Parse(e)
    }
}

/// Session lifecycle. `Awaiting` spans the body of a single
/// [`execute`](Session::execute) call and is restored to `Idle` on every
/// exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Awaiting,
    Closed,
}

/// TCP session to an OLT's TL1 agent.
///
/// Synchronous, single-threaded, one outstanding request: `execute` takes
/// `&mut self`, so callers are serialized by ownership, and responses are
/// assumed to arrive in request order because nothing is pipelined.
///
/// # Example
///
/// ```no_run
/// use lightpath::session::{Session, DEFAULT_PORT};
///
/// let mut session = Session::connect(("10.0.0.1", DEFAULT_PORT))?;
/// let raw = session.execute("SHAKEHAND:::HNDSHK::;")?;
/// println!("{}", String::from_utf8_lossy(&raw));
/// session.end();
/// # Ok::<(), lightpath::SessionError>(())
/// ```
pub struct Session {
    stream: TcpStream,
    state: State,
    timeout: Duration,
    /// Called at the top of `execute()` with the outgoing command.
    on_send: Option<Box<dyn FnMut(&str)>>,
    /// Called with the raw bytes of every received response.
    on_recv: Option<Box<dyn FnMut(&[u8])>>,
}

impl Session {
    /// Connect with the system default TCP timeout.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self::from_stream(stream))
    }

    /// Connect with an explicit TCP connect timeout.
    pub fn connect_timeout(addr: &SocketAddr, timeout: Duration) -> Result<Self, SessionError> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        Ok(Self::from_stream(stream))
    }

    fn from_stream(stream: TcpStream) -> Self {
        // Commands are tiny — disable Nagle to avoid latency.
        let _ = stream.set_nodelay(true);
        Self {
            stream,
            state: State::Idle,
            timeout: DEFAULT_TIMEOUT,
            on_send: None,
            on_recv: None,
        }
    }

    /// Replace the response window (default 5000 ms).
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Register a callback invoked with every outgoing command string.
    pub fn set_on_send(&mut self, f: impl FnMut(&str) + 'static) {
        self.on_send = Some(Box::new(f));
    }

    /// Register a callback invoked with every raw inbound response.
    pub fn set_on_recv(&mut self, f: impl FnMut(&[u8]) + 'static) {
        self.on_recv = Some(Box::new(f));
    }

    /// Write `cmd` and block for the first inbound event: data, a socket
    /// error, or the timeout elapsing — whichever comes first.
    ///
    /// Returns the raw response bytes of a single read. A response split
    /// across TCP segments is returned truncated at the first segment; the
    /// protocol's small fixed-grammar responses make this a tolerated
    /// limitation rather than a handled case.
    ///
    /// The session is idle again on every exit path, so a timed-out call
    /// may be followed immediately by another `execute`.
    pub fn execute(&mut self, cmd: &str) -> Result<Vec<u8>, SessionError> {
        if self.state == State::Closed {
            return Err(SessionError::Closed);
        }
        self.state = State::Awaiting;
        let result = self.exchange(cmd);
        self.state = State::Idle;
        result
    }

    /// Shut the connection down. Every later `execute` fails with
    /// [`SessionError::Closed`].
    pub fn end(&mut self) {
        self.state = State::Closed;
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// The peer address of the underlying TCP connection.
    pub fn peer_addr(&self) -> Result<SocketAddr, SessionError> {
        Ok(self.stream.peer_addr()?)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn exchange(&mut self, cmd: &str) -> Result<Vec<u8>, SessionError> {
        if let Some(cb) = self.on_send.as_mut() {
            cb(cmd);
        }
        self.stream.write_all(cmd.as_bytes())?;

        self.stream.set_read_timeout(Some(self.timeout))?;
        let mut buf = [0u8; 4096];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(SessionError::Disconnected),
            Ok(n) => {
                let raw = buf[..n].to_vec();
                if let Some(cb) = self.on_recv.as_mut() {
                    cb(&raw);
                }
                Ok(raw)
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                Err(SessionError::Timeout {
                    timeout: self.timeout,
                })
            }
            Err(e) => Err(SessionError::Io(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
