//! A minimal in-memory engine for driving exchanges in tests: the request
//! side is a byte cursor, the response side records everything the core
//! sends so assertions can inspect it after the exchange is dropped.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use tokio::io::AsyncWrite;

use kiosk::{BodyLength, BoxFuture, Exchange, Headers, Method, Request, ResponseSink};

/// Everything the engine side observed about one exchange.
#[derive(Debug, Default)]
pub struct Recorded {
    pub status: Option<StatusCode>,
    pub headers: Headers,
    pub length: Option<BodyLength>,
    pub body: Vec<u8>,
    pub closed: bool,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct RecordingSink {
    state: Arc<Mutex<Recorded>>,
    body: Vec<u8>,
}

impl ResponseSink for RecordingSink {
    fn send_headers<'a>(
        &'a mut self,
        status: StatusCode,
        headers: &'a Headers,
        length: BodyLength,
    ) -> BoxFuture<'a, std::io::Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.status = Some(status);
            state.headers = headers.clone();
            state.length = Some(length);
            Ok(())
        })
    }

    fn body(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin) {
        &mut self.body
    }

    fn close<'a>(&'a mut self) -> BoxFuture<'a, std::io::Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            let streamed = std::mem::take(&mut self.body);
            state.body.extend(streamed);
            state.closed = true;
            Ok(())
        })
    }
}

/// A request with the `Host` header tests expect in redirect locations.
pub fn request(method: Method, target: &str) -> Request {
    let mut headers = Headers::builder();
    headers.add("Host", "localhost:8000");
    Request::new(method, target, headers.freeze())
}

/// An exchange mounted at `/` with the given request body.
pub fn exchange(request: Request, body: &[u8]) -> (Exchange, Arc<Mutex<Recorded>>) {
    exchange_at(request, "/", body)
}

pub fn exchange_at(
    request: Request,
    context_path: &str,
    body: &[u8],
) -> (Exchange, Arc<Mutex<Recorded>>) {
    let state = Arc::new(Mutex::new(Recorded::default()));
    let sink = RecordingSink { state: Arc::clone(&state), body: Vec::new() };
    let local: SocketAddr = "127.0.0.1:8000".parse().unwrap();
    let remote: SocketAddr = "192.0.2.7:49152".parse().unwrap();
    let exchange = Exchange::new(
        request,
        context_path,
        local,
        remote,
        Box::new(Cursor::new(body.to_vec())),
        Box::new(sink),
    );
    (exchange, state)
}
