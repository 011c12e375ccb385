//! Ordered, case-insensitive, multi-valued header map.
//!
//! Two distinct types share one representation:
//!
//! - [`HeadersBuilder`] is mutable and owned during construction, by the
//!   engine while parsing a request or by a handler while preparing a
//!   response.
//! - [`Headers`] is the finalized read-only view. It has no mutation path at
//!   all, not even a privileged one; the only way to change a finalized map
//!   is [`Headers::to_builder`], which copies it back into builder form.
//!
//! Names are compared ignoring ASCII case but stored as first inserted, so
//! diagnostics print what the client actually sent. Insertion order of names
//! and value order within a name are both preserved.

/// A finalized, read-only header map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh [`HeadersBuilder`].
    pub fn builder() -> HeadersBuilder {
        HeadersBuilder::default()
    }

    /// Copies this map back into mutable builder form.
    pub fn to_builder(&self) -> HeadersBuilder {
        HeadersBuilder { entries: self.entries.clone() }
    }

    /// Returns the first value for `name`, compared case-insensitively.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// Returns every value for `name`, in insertion order. Empty if absent.
    pub fn all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

/// The mutable construction view of a header map.
///
/// `add`/`set`/`remove` return `&mut Self` so calls chain; [`freeze`](Self::freeze)
/// terminates construction and hands back the read-only [`Headers`].
#[derive(Clone, Debug, Default)]
pub struct HeadersBuilder {
    entries: Vec<(String, Vec<String>)>,
}

impl HeadersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `name`. Existing values for a case-insensitive
    /// match of `name` are preserved; the new value goes last.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
        self
    }

    /// Replaces every value under `name` with the single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = vec![value.into()],
            None => self.entries.push((name, vec![value.into()])),
        }
        self
    }

    /// Removes `name` and all its values, if present.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// Iterates `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Finalizes construction into a read-only [`Headers`].
    pub fn freeze(self) -> Headers {
        Headers { entries: self.entries }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl From<HeadersBuilder> for Headers {
    fn from(builder: HeadersBuilder) -> Self {
        builder.freeze()
    }
}
