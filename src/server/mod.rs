//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler function.
//! Supports HTTP/1.1 persistent connections (keep-alive) out of the box. Each
//! connection runs in its own task, so a handler that panics takes down only
//! its own connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The zapi HTTP server.
///
/// Binds to a TCP address and dispatches incoming HTTP/1.1 requests to a
/// handler function. Most applications go through [`App::run`](crate::App::run)
/// instead of driving a `Server` directly.
///
/// # Examples
///
/// ```rust,no_run
/// use zapi::server::Server;
/// use zapi::http::{Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(|_req: Request| async {
///         Response::new(StatusCode::Ok).body("Hello!")
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests to `handler`.
    ///
    /// The handler receives a [`Request`] and must return a [`Future`] that
    /// resolves to a [`Response`]. The handler is wrapped in an [`Arc`] and
    /// shared across all spawned Tokio tasks, so it must be `Send + Sync + 'static`.
    ///
    /// This method runs until the process is terminated or an unrecoverable
    /// listener error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "zapi listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Serves requests on one connection until the peer closes it, asks for
/// `Connection: close`, or sends something unparseable.
async fn handle_connection<H, F>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut conn = Connection::new(stream, peer_addr);

    while let Some(request) = conn.next_request().await? {
        let keep_alive = request.is_keep_alive();
        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await.keep_alive(keep_alive);
        conn.send(response).await?;

        if !keep_alive {
            debug!(peer = %peer_addr, "client asked to close");
            break;
        }
    }

    Ok(())
}

/// A client socket plus the bytes read from it that no request has claimed yet.
///
/// Several requests may arrive in one read (pipelining); each call to
/// [`next_request`](Self::next_request) takes exactly one off the front.
struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    buf: BytesMut,
}

/// Outcome of trying to cut one request off the front of the buffer.
enum Framed {
    Ready(Request),
    NeedMore,
    Rejected(Response),
}

impl Connection {
    fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            buf: BytesMut::with_capacity(INITIAL_BUF_SIZE),
        }
    }

    /// The next complete request, or `None` once the connection is done.
    ///
    /// Already-buffered bytes are always tried first; the socket is only read
    /// when they do not yet hold a whole request. Malformed and oversized input
    /// is answered here and ends the connection.
    async fn next_request(&mut self) -> Result<Option<Request>, std::io::Error> {
        loop {
            match self.frame() {
                Framed::Ready(request) => return Ok(Some(request)),
                Framed::Rejected(response) => {
                    self.send(response).await?;
                    return Ok(None);
                }
                Framed::NeedMore => {}
            }

            if self.buf.len() > MAX_REQUEST_SIZE {
                warn!(peer = %self.peer_addr, size = self.buf.len(), "request too large, sending 413");
                let response = Response::new(StatusCode::PayloadTooLarge)
                    .body("Request entity too large")
                    .keep_alive(false);
                self.send(response).await?;
                return Ok(None);
            }

            if self.stream.read_buf(&mut self.buf).await? == 0 {
                if self.buf.is_empty() {
                    debug!(peer = %self.peer_addr, "connection closed by peer");
                } else {
                    debug!(peer = %self.peer_addr, pending = self.buf.len(), "peer closed mid-request");
                }
                return Ok(None);
            }
        }
    }

    fn frame(&mut self) -> Framed {
        if self.buf.is_empty() {
            return Framed::NeedMore;
        }

        let (mut request, body_offset) = match Request::parse(&self.buf) {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => return Framed::NeedMore,
            Err(e) => {
                warn!(peer = %self.peer_addr, error = %e, "bad request, sending 400");
                return Framed::Rejected(
                    Response::new(StatusCode::BadRequest)
                        .body(format!("Bad Request: {e}"))
                        .keep_alive(false),
                );
            }
        };

        let content_length = request.content_length().unwrap_or(0);
        let frame_len = body_offset + content_length;
        if self.buf.len() < frame_len {
            return Framed::NeedMore;
        }

        request.truncate_body(content_length);
        let _ = self.buf.split_to(frame_len);
        Framed::Ready(request)
    }

    async fn send(&mut self, response: Response) -> Result<(), std::io::Error> {
        self.stream.write_all(&response.into_bytes()).await?;
        self.stream.flush().await
    }
}
