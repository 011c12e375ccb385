//! Handler combinators.
//!
//! Each function here returns a *new* handler wrapping its target; the target
//! is never mutated. A composition is a small closed set of tagged variants
//! rather than a class hierarchy, so the behavior of any composed handler can
//! be read off its construction:
//!
//! ```rust
//! use kiosk::combinators::{self, HandlerExt};
//! use kiosk::Method;
//!
//! // 404 unless HEAD or GET; for those, drain the body, tag the request,
//! // then let `file_handler` do the work.
//! # let file_handler = combinators::not_found();
//! let handler = combinators::if_method(
//!     |m| matches!(m, Method::Head | Method::Get),
//!     combinators::discarding_body(file_handler.adding_request_header("X-Origin", "kiosk")),
//!     combinators::not_found(),
//! );
//! ```
//!
//! Argument presence is enforced by the type system: there is no way to
//! construct a combinator with a missing handler, predicate, or operator, so
//! the construction-time validation the contract asks for costs nothing.
//! Predicates and operators run exactly once per exchange, synchronously,
//! before control reaches either branch.

use std::sync::Arc;

use http::StatusCode;

use crate::exchange::{BodyLength, Exchange};
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;

type MethodPredicate = Box<dyn Fn(Method) -> bool + Send + Sync>;
type RequestOperator = Box<dyn Fn(&Request) -> Request + Send + Sync>;
type TargetOperator = Box<dyn Fn(&str) -> String + Send + Sync>;

// ── Constructors ──────────────────────────────────────────────────────────────

/// A handler that unconditionally completes the exchange with `404 Not Found`
/// and no body. The conventional innermost fallback.
pub fn not_found() -> NotFound {
    NotFound
}

/// Delegates to `target` if `test` accepts the request method, otherwise to
/// `fallback`. Exactly one of the two processes the exchange, selected by a
/// single evaluation of `test`.
pub fn if_method(
    test: impl Fn(Method) -> bool + Send + Sync + 'static,
    target: impl Handler,
    fallback: impl Handler,
) -> MethodGate {
    MethodGate {
        test: Box::new(test),
        target: Arc::new(target),
        fallback: Arc::new(fallback),
    }
}

/// Fully drains and discards any request body, then forwards to `target`.
pub fn discarding_body(target: impl Handler) -> DiscardBody {
    DiscardBody { target: Arc::new(target) }
}

/// Appends one header to the request side before forwarding to `target`.
/// Existing values for `name` are preserved.
pub fn adding_request_header(
    name: impl Into<String>,
    value: impl Into<String>,
    target: impl Handler,
) -> AddRequestHeader {
    AddRequestHeader {
        name: name.into(),
        value: value.into(),
        target: Arc::new(target),
    }
}

/// Applies `operator` to the request snapshot and makes the result the
/// effective request seen by `target`. URI, method, and headers may all
/// change; the exchange's response capability is unaffected, and outer links
/// observe the original snapshot once `target` returns.
pub fn adapting_request(
    operator: impl Fn(&Request) -> Request + Send + Sync + 'static,
    target: impl Handler,
) -> AdaptRequest {
    AdaptRequest { operator: Box::new(operator), target: Arc::new(target) }
}

/// A restriction of [`adapting_request`] that only rewrites the request
/// target.
pub fn inspecting_target(
    operator: impl Fn(&str) -> String + Send + Sync + 'static,
    target: impl Handler,
) -> InspectTarget {
    InspectTarget { operator: Box::new(operator), target: Arc::new(target) }
}

// ── Chaining form ─────────────────────────────────────────────────────────────

/// Combinators phrased relative to `self`, for chained composition.
///
/// Semantically identical to the free functions; only the role of `self`
/// differs. `h.delegating_if_method(test, other)` sends matching exchanges to
/// `other` and everything else to `h`, exactly as
/// `if_method(test, other, h)` would.
pub trait HandlerExt: Handler + Sized {
    fn delegating_if_method(
        self,
        test: impl Fn(Method) -> bool + Send + Sync + 'static,
        other: impl Handler,
    ) -> MethodGate {
        if_method(test, other, self)
    }

    fn discarding_request_body(self) -> DiscardBody {
        discarding_body(self)
    }

    fn adding_request_header(
        self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> AddRequestHeader {
        adding_request_header(name, value, self)
    }

    fn adapting_request(
        self,
        operator: impl Fn(&Request) -> Request + Send + Sync + 'static,
    ) -> AdaptRequest {
        adapting_request(operator, self)
    }

    fn inspecting_target(
        self,
        operator: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> InspectTarget {
        inspecting_target(operator, self)
    }
}

impl<H: Handler + Sized> HandlerExt for H {}

// ── Variants ──────────────────────────────────────────────────────────────────

/// See [`not_found`].
pub struct NotFound;

impl Handler for NotFound {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            exchange
                .send_response_headers(StatusCode::NOT_FOUND, BodyLength::None)
                .await?;
            exchange.close().await
        })
    }
}

/// See [`if_method`].
pub struct MethodGate {
    test: MethodPredicate,
    target: BoxedHandler,
    fallback: BoxedHandler,
}

impl Handler for MethodGate {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        // Predicate first, exactly once; then exactly one branch runs.
        if (self.test)(exchange.method()) {
            self.target.handle(exchange)
        } else {
            self.fallback.handle(exchange)
        }
    }
}

/// See [`discarding_body`].
pub struct DiscardBody {
    target: BoxedHandler,
}

impl Handler for DiscardBody {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            exchange.discard_request_body().await?;
            self.target.handle(exchange).await
        })
    }
}

/// See [`adding_request_header`].
pub struct AddRequestHeader {
    name: String,
    value: String,
    target: BoxedHandler,
}

impl Handler for AddRequestHeader {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            let tagged = exchange.request().with_header(&self.name, &self.value);
            exchange.set_request(tagged);
            self.target.handle(exchange).await
        })
    }
}

/// See [`adapting_request`].
pub struct AdaptRequest {
    operator: RequestOperator,
    target: BoxedHandler,
}

impl Handler for AdaptRequest {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            let original = exchange.request().clone();
            let adapted = (self.operator)(&original);
            exchange.set_request(adapted);
            let outcome = self.target.handle(exchange).await;
            // Outer links get back the snapshot they handed in.
            exchange.set_request(original);
            outcome
        })
    }
}

/// See [`inspecting_target`].
pub struct InspectTarget {
    operator: TargetOperator,
    target: BoxedHandler,
}

impl Handler for InspectTarget {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            let original = exchange.request().clone();
            let rewritten = original.with_target((self.operator)(original.target()));
            exchange.set_request(rewritten);
            let outcome = self.target.handle(exchange).await;
            exchange.set_request(original);
            outcome
        })
    }
}
