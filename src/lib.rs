//! # kiosk
//!
//! A minimal, composable request-processing layer for an HTTP server: a
//! small algebra of handler and filter combinators, plus a static file
//! server built entirely from that algebra. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The transport engine owns sockets, wire parsing, worker dispatch, and
//! timeouts. kiosk does not, by design. Per accepted request the engine
//! builds one [`Exchange`] (request snapshot, body stream, response sink)
//! and drives the configured [`FilterChain`] with it; kiosk's job is
//! everything between those two calls:
//!
//! - **Combinators** ([`combinators`]) layer cross-cutting behavior without
//!   subclassing: method gating, body discarding, header tagging, request
//!   rewriting. Every combinator returns a new [`Handler`]; nothing is
//!   mutated in place.
//! - **Filters** ([`Filter`] / [`FilterChain`]) wrap a terminal handler with
//!   pre/post processing through an explicitly single-use continuation.
//! - **File serving** ([`FileHandler`]) resolves request paths against one
//!   root directory and serves files, index pages, and escaped directory
//!   listings; [`OutputFilter`] logs each completed exchange in (an
//!   approximation of) the Common Log Format.
//!
//! What the engine already owns, kiosk intentionally ignores: TLS,
//! compression, caching headers, byte ranges, authentication.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kiosk::{FileHandler, FilterChain, OutputFilter, OutputLevel};
//!
//! // The out-of-the-box shape: serve a directory, log every exchange.
//! let chain = FilterChain::new(FileHandler::serving("/srv/site")?)
//!     .with(OutputFilter::new(std::io::stdout(), OutputLevel::Default)?);
//!
//! // ...or equivalently:
//! let chain = kiosk::file_server("/srv/site", OutputLevel::Default, std::io::stdout())?;
//! # Ok::<(), kiosk::Error>(())
//! ```
//!
//! The composed chain is immutable and is shared across arbitrarily many
//! concurrent exchanges; per-exchange state lives only in the exchange
//! itself.

mod error;
mod exchange;
mod files;
mod filter;
mod handler;
mod headers;
mod log;
mod method;
mod request;

pub mod combinators;
pub mod mime;

pub use error::{Error, Result};
pub use exchange::{BodyLength, Exchange, ResponseSink};
pub use files::{FileHandler, MediaTypeResolver, escape_html, file_server};
pub use filter::{Chain, Filter, FilterChain};
pub use handler::{BoxFuture, BoxedHandler, Handler};
pub use headers::{Headers, HeadersBuilder};
pub use log::{OutputFilter, OutputLevel};
pub use method::Method;
pub use request::Request;
