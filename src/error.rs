//! Unified error type.

use std::fmt;
use std::io;

/// The error type returned by kiosk's fallible operations.
///
/// Application-level outcomes (404, 405, 301) are not errors; they are
/// ordinary response branches a handler takes. This type surfaces the two
/// things that genuinely go wrong:
///
/// - [`Error::Config`]: a component was constructed with bad arguments
///   (non-directory root, relative root, `OutputLevel::None` passed to the
///   output filter, unrecognized output-level string). Raised once, at
///   construction, never per request.
/// - [`Error::Io`]: a transport or filesystem failure while processing an
///   exchange. Propagated to the engine after the exchange's resources have
///   been released.
#[derive(Debug)]
pub enum Error {
    Config(String),
    Io(io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shorthand for `std::result::Result<T, kiosk::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
