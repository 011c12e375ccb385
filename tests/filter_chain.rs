mod common;

use std::io;
use std::sync::{Arc, Mutex};

use http::StatusCode;

use common::{exchange, request};
use kiosk::{
    BodyLength, BoxFuture, Chain, Exchange, Filter, FilterChain, Handler, Method, OutputFilter,
    OutputLevel,
};

/// Filter that records when it runs, relative to the rest of the chain.
struct Tracer {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Filter for Tracer {
    fn apply<'a>(&'a self, exchange: &'a mut Exchange, chain: Chain<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("{}:pre", self.name));
            chain.proceed(&mut *exchange).await?;
            self.log.lock().unwrap().push(format!("{}:post", self.name));
            Ok(())
        })
    }

    fn description(&self) -> &str {
        self.name
    }
}

/// Filter that never continues the chain; it completes the exchange itself.
struct Reject;

impl Filter for Reject {
    fn apply<'a>(&'a self, exchange: &'a mut Exchange, _chain: Chain<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            exchange
                .send_response_headers(StatusCode::FORBIDDEN, BodyLength::None)
                .await?;
            exchange.close().await
        })
    }

    fn description(&self) -> &str {
        "reject"
    }
}

/// Terminal handler that records its invocation and answers `204`.
struct Terminal {
    log: Arc<Mutex<Vec<String>>>,
}

impl Handler for Terminal {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push("terminal".to_owned());
            exchange
                .send_response_headers(StatusCode::NO_CONTENT, BodyLength::None)
                .await?;
            exchange.close().await
        })
    }
}

/// `io::Write` sink shareable with the test so output can be read back.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn filters_wrap_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = FilterChain::new(Terminal { log: Arc::clone(&log) })
        .with(Tracer { name: "outer", log: Arc::clone(&log) })
        .with(Tracer { name: "inner", log: Arc::clone(&log) });

    let (mut ex, state) = exchange(request(Method::Get, "/"), b"");
    chain.run(&mut ex).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        ["outer:pre", "inner:pre", "terminal", "inner:post", "outer:post"]
    );
    assert_eq!(state.lock().unwrap().status, Some(StatusCode::NO_CONTENT));
}

#[tokio::test]
async fn declining_to_proceed_short_circuits_the_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = FilterChain::new(Terminal { log: Arc::clone(&log) })
        .with(Reject)
        .with(Tracer { name: "inner", log: Arc::clone(&log) });

    let (mut ex, state) = exchange(request(Method::Get, "/"), b"");
    chain.run(&mut ex).await.unwrap();

    // Neither the inner filter nor the terminal handler ran.
    assert!(log.lock().unwrap().is_empty());
    let state = state.lock().unwrap();
    assert_eq!(state.status, Some(StatusCode::FORBIDDEN));
    assert!(state.closed);
}

#[tokio::test]
async fn descriptions_list_filters_in_invocation_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = FilterChain::new(Terminal { log: Arc::clone(&log) })
        .with(Tracer { name: "first", log: Arc::clone(&log) })
        .with(Reject);
    assert_eq!(chain.descriptions(), ["first", "reject"]);
}

#[tokio::test]
async fn output_filter_logs_one_summary_line_after_completion() {
    let sink = SharedSink::default();
    let chain = FilterChain::new(kiosk::combinators::not_found())
        .with(OutputFilter::new(sink.clone(), OutputLevel::Default).unwrap());

    let (mut ex, _state) = exchange(request(Method::Get, "/hello.txt"), b"");
    chain.run(&mut ex).await.unwrap();

    let output = sink.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1);
    // 192.0.2.7 - - [22/Jun/2026:13:55:36 +0000] "GET /hello.txt" 404 -
    assert!(lines[0].starts_with("192.0.2.7 - - ["));
    assert!(lines[0].ends_with("\"GET /hello.txt\" 404 -"));
}

#[tokio::test]
async fn verbose_output_appends_header_dumps() {
    let sink = SharedSink::default();
    let chain = FilterChain::new(kiosk::combinators::not_found())
        .with(OutputFilter::new(sink.clone(), OutputLevel::Verbose).unwrap());

    let (mut ex, _state) = exchange(request(Method::Get, "/x"), b"");
    chain.run(&mut ex).await.unwrap();

    let output = sink.contents();
    assert!(output.contains("> Host: localhost:8000\n"));
    // each block is closed by its prefix alone on a line
    assert!(output.contains("\n>\n"));
    assert!(output.ends_with("<\n"));
}
