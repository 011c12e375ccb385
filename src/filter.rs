//! Filters and the filter chain.
//!
//! A [`FilterChain`] is an ordered sequence of [`Filter`]s terminated by a
//! [`Handler`]. Invoking the chain invokes the first filter with a [`Chain`]
//! continuation representing the rest of the sequence. A filter that wants
//! plain passthrough behavior calls [`Chain::proceed`] exactly once;
//! declining to call it short-circuits the chain, in which case the filter
//! itself must complete the exchange. Calling it twice is impossible:
//! `proceed` consumes the continuation, so the single-invocation discipline
//! is enforced at compile time instead of by convention.
//!
//! Post-processing in a filter (code after the `proceed(..).await`) observes
//! only state set by links invoked after it, which is what makes a trailing
//! logging filter able to report the final response status.

use std::sync::Arc;

use crate::exchange::Exchange;
use crate::handler::{BoxFuture, BoxedHandler, Handler};

/// A named pre/post wrapper around the rest of a [`FilterChain`].
pub trait Filter: Send + Sync + 'static {
    /// Processes the exchange, deciding whether and when to continue the
    /// chain via `chain.proceed(exchange)`.
    fn apply<'a>(&'a self, exchange: &'a mut Exchange, chain: Chain<'a>) -> BoxFuture<'a>;

    /// A fixed textual label for diagnostics.
    fn description(&self) -> &str {
        "filter"
    }
}

/// The continuation handed to a [`Filter`]: the remaining links of the chain
/// plus the terminal handler. Single-use by construction.
pub struct Chain<'a> {
    links: &'a [Arc<dyn Filter>],
    terminal: &'a dyn Handler,
}

impl<'a> Chain<'a> {
    /// Invokes the rest of the chain: the next filter if one remains,
    /// otherwise the terminal handler.
    pub fn proceed(self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        match self.links.split_first() {
            Some((next, rest)) => {
                next.apply(exchange, Chain { links: rest, terminal: self.terminal })
            }
            None => self.terminal.handle(exchange),
        }
    }
}

/// An ordered filter list around a terminal handler.
///
/// Built once at configuration time and shared across all exchanges; filters
/// are pushed outermost-first, so the first `with` wraps everything after it.
pub struct FilterChain {
    links: Vec<Arc<dyn Filter>>,
    terminal: BoxedHandler,
}

impl FilterChain {
    pub fn new(terminal: impl Handler) -> Self {
        Self { links: Vec::new(), terminal: Arc::new(terminal) }
    }

    /// Appends a filter. Earlier filters run (and post-process) outside
    /// later ones.
    pub fn with(mut self, filter: impl Filter) -> Self {
        self.links.push(Arc::new(filter));
        self
    }

    /// The diagnostic labels of the configured filters, in invocation order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.links.iter().map(|f| f.description()).collect()
    }

    /// Drives one exchange through every filter and the terminal handler.
    pub fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Chain { links: &self.links, terminal: &*self.terminal }.proceed(exchange)
    }
}

impl Handler for FilterChain {
    /// A whole chain can stand wherever a handler is expected, e.g. as the
    /// target of a combinator.
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        self.run(exchange)
    }
}
