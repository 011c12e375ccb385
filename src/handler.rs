//! Handler trait and type erasure.
//!
//! # How handlers are stored and dispatched
//!
//! Combinators need to hold handlers of *different* concrete types behind one
//! field, so the composed value is a tree of trait objects:
//!
//! ```text
//! struct MyHandler;  impl Handler for MyHandler { … }   ← you write this
//!        ↓ combinators::discarding_body(MyHandler)
//! Arc::new(MyHandler)                                   ← heap-allocated once
//!        ↓  stored as BoxedHandler = Arc<dyn Handler>
//! handler.handle(exchange)  at request time             ← one vtable dispatch
//!        ↓
//! Box::pin(async move { … })                            ← BoxFuture
//! ```
//!
//! The whole composition is built once at configuration time and shared
//! across exchanges; the per-request cost is an `Arc` clone at construction
//! (not per request) plus one virtual call per layer.
//!
//! The future borrows the exchange, so [`BoxFuture`] carries the borrow's
//! lifetime rather than being `'static`. Each exchange is driven to
//! completion before the worker touches the next one; nothing here spawns.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::exchange::Exchange;

/// A heap-allocated, type-erased future tied to the exchange it borrows.
pub type BoxFuture<'a, T = Result<()>> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The unit of request-processing behavior.
///
/// A handler receives the exchange, produces its effects on it (sends
/// response headers, writes a body, closes), and reports transport failures
/// through the returned future. Handlers hold no per-exchange state; one
/// instance serves arbitrarily many concurrent exchanges.
///
/// Composition happens through [`crate::combinators`]: every combinator
/// returns a *new* handler value wrapping its target, never mutating it.
pub trait Handler: Send + Sync + 'static {
    /// Processes one exchange to completion.
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a>;
}

/// A heap-allocated, type-erased handler shared across concurrent exchanges.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        (**self).handle(exchange)
    }
}
