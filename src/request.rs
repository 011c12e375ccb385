//! Immutable request snapshot.

use crate::headers::Headers;
use crate::method::Method;

/// The immutable request state of an [`Exchange`](crate::Exchange).
///
/// A snapshot bundles the request target (path plus optional query), the
/// method token, and the finalized header map. It is a value: every `with_*`
/// derivation produces a new snapshot and leaves the original untouched,
/// which is what lets combinators substitute the request-facing view of an
/// exchange without affecting anything the outer links observe.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    target: String,
    headers: Headers,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>, headers: Headers) -> Self {
        Self { method, target: target.into(), headers }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The full request target as received, e.g. `/docs/page?lang=en`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path portion of the target, with any query stripped.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Derives a snapshot with a replaced target. All other state is shared.
    pub fn with_target(&self, target: impl Into<String>) -> Self {
        Self { method: self.method, target: target.into(), headers: self.headers.clone() }
    }

    /// Derives a snapshot with a replaced method.
    pub fn with_method(&self, method: Method) -> Self {
        Self { method, target: self.target.clone(), headers: self.headers.clone() }
    }

    /// Derives a snapshot with one header appended. Existing values for that
    /// name are preserved; the new value goes last.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut builder = self.headers.to_builder();
        builder.add(name, value);
        Self {
            method: self.method,
            target: self.target.clone(),
            headers: builder.freeze(),
        }
    }

    /// Derives a snapshot with the whole header map replaced.
    pub fn with_headers(&self, headers: Headers) -> Self {
        Self { method: self.method, target: self.target.clone(), headers }
    }
}
