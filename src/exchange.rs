//! The per-request exchange surface consumed by handlers and filters.
//!
//! The transport engine owns sockets, wire parsing, and worker dispatch; this
//! crate never sees any of that. What it sees is an [`Exchange`]: the parsed
//! request side as data (a [`Request`] snapshot plus a body byte stream) and
//! the response side as a [`ResponseSink`] the engine implements. An engine
//! builds one `Exchange` per accepted request via [`Exchange::new`] and hands
//! it to the configured [`FilterChain`](crate::FilterChain).

use std::io;
use std::net::SocketAddr;

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::handler::BoxFuture;
use crate::headers::{Headers, HeadersBuilder};
use crate::method::Method;
use crate::request::Request;

/// Declared length of a response body, passed along with the status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyLength {
    /// No body follows.
    None,
    /// A body of exactly this many bytes follows.
    Known(u64),
    /// A body of unknown length follows; the engine picks the framing.
    Unknown,
}

/// The response half of an exchange, implemented by the transport engine.
///
/// The engine owns wire framing; the core only tells it *what* to send.
/// Methods return [`BoxFuture`]s for the same reason [`Handler`](crate::Handler)
/// does: trait objects cannot carry `async fn` directly.
pub trait ResponseSink: Send {
    /// Transmits the status line and the finalized response headers.
    /// Called at most once per exchange.
    fn send_headers<'a>(
        &'a mut self,
        status: StatusCode,
        headers: &'a Headers,
        length: BodyLength,
    ) -> BoxFuture<'a, io::Result<()>>;

    /// The response body byte sink. Only written after `send_headers`.
    fn body(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin);

    /// Flushes and releases the underlying connection resources.
    fn close<'a>(&'a mut self) -> BoxFuture<'a, io::Result<()>>;
}

/// One in-flight request/response pair.
///
/// Exclusive to a single worker for its whole lifetime; nothing here is
/// shared across exchanges, so none of it needs locking.
pub struct Exchange {
    request: Request,
    context_path: String,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    body: Box<dyn AsyncRead + Send + Unpin>,
    sink: Box<dyn ResponseSink>,
    response_headers: HeadersBuilder,
    sent: Option<(StatusCode, Headers)>,
    closed: bool,
}

impl Exchange {
    /// Assembles an exchange from engine-provided parts.
    ///
    /// `context_path` is the mount-point prefix under which the terminal
    /// handler was registered; handlers resolve the request target relative
    /// to it.
    pub fn new(
        request: Request,
        context_path: impl Into<String>,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        body: Box<dyn AsyncRead + Send + Unpin>,
        sink: Box<dyn ResponseSink>,
    ) -> Self {
        Self {
            request,
            context_path: context_path.into(),
            local_addr,
            remote_addr,
            body,
            sink,
            response_headers: HeadersBuilder::new(),
            sent: None,
            closed: false,
        }
    }

    // ── Request side ─────────────────────────────────────────────────────────

    /// The effective request snapshot.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Substitutes the request-facing view of this exchange.
    ///
    /// Only the snapshot changes; body stream and response capability are
    /// untouched. Combinators that substitute a view for their target are
    /// expected to restore the previous snapshot afterwards so outer links
    /// observe the request they were given.
    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    pub fn method(&self) -> Method {
        self.request.method()
    }

    pub fn request_headers(&self) -> &Headers {
        self.request.headers()
    }

    /// The mount-point prefix for the current routing context.
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The request body byte stream.
    pub fn request_body(&mut self) -> &mut (dyn AsyncRead + Send + Unpin) {
        &mut *self.body
    }

    /// Fully drains and discards any remaining request body, so the
    /// connection is left with no unread data when a response is written
    /// without the body having been consumed.
    pub async fn discard_request_body(&mut self) -> io::Result<()> {
        tokio::io::copy(&mut self.body, &mut tokio::io::sink()).await?;
        Ok(())
    }

    // ── Response side ────────────────────────────────────────────────────────

    /// The response header builder. Mutable only until the headers are sent.
    pub fn response_headers_mut(&mut self) -> &mut HeadersBuilder {
        &mut self.response_headers
    }

    /// Finalizes the accumulated response headers and transmits them with
    /// `status` and the declared body length.
    ///
    /// Fails if headers were already sent for this exchange.
    pub async fn send_response_headers(
        &mut self,
        status: StatusCode,
        length: BodyLength,
    ) -> Result<()> {
        if self.sent.is_some() {
            return Err(io::Error::other("response headers already sent").into());
        }
        let headers = std::mem::take(&mut self.response_headers).freeze();
        self.sink.send_headers(status, &headers, length).await?;
        self.sent = Some((status, headers));
        Ok(())
    }

    /// The response body byte sink. Meaningful only after
    /// [`send_response_headers`](Self::send_response_headers).
    pub fn response_body(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin) {
        self.sink.body()
    }

    /// The status code sent on this exchange, if headers have gone out.
    pub fn response_status(&self) -> Option<StatusCode> {
        self.sent.as_ref().map(|(status, _)| *status)
    }

    /// The headers as actually transmitted, if headers have gone out.
    pub fn sent_response_headers(&self) -> Option<&Headers> {
        self.sent.as_ref().map(|(_, headers)| headers)
    }

    /// Finalizes the exchange, releasing the sink's resources. Idempotent;
    /// every handler path must end here, including failure paths, so that a
    /// broken stream still frees the connection.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
